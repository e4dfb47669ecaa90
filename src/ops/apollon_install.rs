//! `apollon --install`: wire Apollon into a freshly generated Pods project.
//!
//! Runs from the Podfile's `post_integrate` hook, after CocoaPods has written
//! `Pods/Pods.xcodeproj`. Every compile phase is complete at that point, so
//! this is where source mappings are snapshotted.

use std::path::Path;

use anyhow::Result;

use crate::core::{ApollonConfig, ProjectStore, SourceMappings, APOLLON, APOLLONFILE};
use crate::util::fs::remove_file_if_exists;
use crate::util::{GlobalContext, Shell, Status};
use crate::xcode::PbxProject;

pub const CHECK_MANIFEST_PHASE: &str = "[Apollon] Check Pods Manifest.lock";
pub const SYNC_PHASE: &str = "[Apollon] Sync";
pub const COLLECT_PHASE: &str = "[Apollon] Collecting Libraries";

const CHECK_MANIFEST_SCRIPT: &str = r#"diff "${SRCROOT}/../Podfile.lock" "${SRCROOT}/Manifest.lock" > /dev/null
if [ $? != 0 ] ; then
  echo "error: The sandbox is not in sync with the Podfile.lock. Run 'pod install' or update your CocoaPods installation." >&2
  exit 1
fi
"#;

const SYNC_SCRIPT: &str = "export PATH=\"$HOME/.cargo/bin:$PATH\"\napollon --cache\n";

const COLLECT_SCRIPT: &str = "export PATH=\"$HOME/.cargo/bin:$PATH\"\napollon --sync_back\n";

/// The aggregate targets CocoaPods generates for the user's app targets.
fn is_pods_aggregate(target: &str) -> bool {
    target.starts_with("Pods-")
}

/// Pod targets Apollon can cache.
fn is_pod_target(target: &str) -> bool {
    target != APOLLON && !is_pods_aggregate(target)
}

/// What `--install` changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Targets whose source mapping was (re)written
    pub mapped: Vec<String>,
    /// Targets newly added to the Apollonfile
    pub added: Vec<String>,
    /// Apollonfile entries dropped because their target is gone
    pub dropped: Vec<String>,
}

/// What `--remove` changed in the project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub removed_target: bool,
    /// Targets whose compile phase was restored from its mapping
    pub restored: Vec<String>,
}

/// Install into `Pods/Pods.xcodeproj` below the working directory.
pub fn install(gctx: &GlobalContext, shell: &Shell) -> Result<InstallReport> {
    let mut project = PbxProject::open(&gctx.pods_project_path())?;
    let report = install_into(&mut project, shell)?;
    project.save()?;
    shell.status(Status::Finished, "installing Apollon");
    Ok(report)
}

/// Add the Apollon target, script phases, dependencies, source mappings and
/// Apollonfile to an opened project. The caller saves the project.
pub fn install_into(project: &mut PbxProject, shell: &Shell) -> Result<InstallReport> {
    shell.status(
        Status::Installing,
        format!("Apollon into {}", project.path().display()),
    );

    let apollon = project.add_aggregate_target(APOLLON)?;
    project.add_shell_script_phase(&apollon, CHECK_MANIFEST_PHASE, CHECK_MANIFEST_SCRIPT)?;
    project.add_shell_script_phase(&apollon, SYNC_PHASE, SYNC_SCRIPT)?;
    shell.status(Status::Added, format!("`{}` target", APOLLON));

    let targets = project.targets();
    match targets.iter().find(|t| is_pods_aggregate(t)) {
        Some(aggregate) => {
            if let Some(id) = project.target_id(aggregate) {
                project.add_shell_script_phase(&id, COLLECT_PHASE, COLLECT_SCRIPT)?;
                shell.status(Status::Added, format!("library collection to `{}`", aggregate));
            }
        }
        None => shell.warn("no `Pods-` target found, libraries will not be collected"),
    }

    for target_id in project.target_ids() {
        if target_id != apollon {
            project.add_dependency(&target_id, &apollon)?;
        }
    }

    let mut report = InstallReport::default();
    let mappings = SourceMappings::in_project_dir(project.project_dir());
    let mut pod_targets = Vec::new();
    for target in targets.iter().filter(|t| is_pod_target(t)) {
        let Some(files) = project.compile_sources(target) else {
            continue;
        };
        pod_targets.push(target.clone());
        if files.is_empty() && mappings.path_for(target).exists() {
            tracing::debug!("{}: compile phase is empty, keeping its mapping", target);
            continue;
        }
        mappings.save(target, &files)?;
        report.mapped.push(target.clone());
    }
    shell.status(
        Status::Updated,
        format!("{} source mappings", report.mapped.len()),
    );

    update_apollonfile(project.project_dir(), &pod_targets, &mut report)?;
    project.add_file_to_main_group(APOLLONFILE, "text.plist.xml")?;
    Ok(report)
}

/// Create the Apollonfile, or bring an existing one in line with the pod
/// targets: new targets start disabled, stale entries are dropped.
fn update_apollonfile(
    project_dir: &Path,
    pod_targets: &[String],
    report: &mut InstallReport,
) -> Result<()> {
    let path = project_dir.join(APOLLONFILE);
    let exists = path.exists();
    let mut config = if exists {
        ApollonConfig::load(&path)?
    } else {
        ApollonConfig::new()
    };

    for target in pod_targets {
        if !config.contains(target) {
            config.set(target.as_str(), false);
            report.added.push(target.clone());
        }
    }
    let stale: Vec<String> = config
        .entries()
        .map(|entry| entry.target)
        .filter(|target| !pod_targets.contains(target))
        .collect();
    for target in stale {
        config.remove(&target);
        report.dropped.push(target);
    }

    if !exists || !report.added.is_empty() || !report.dropped.is_empty() {
        config.save(&path)?;
        tracing::info!(
            "wrote {} ({} added, {} dropped)",
            path.display(),
            report.added.len(),
            report.dropped.len()
        );
    }
    Ok(())
}

/// Undo [`install_into`]: drop the Apollon target and its dependencies, the
/// collection phase and the Apollonfile, and refill every emptied compile
/// phase. The caller saves the project.
pub fn uninstall_from(project: &mut PbxProject, shell: &Shell) -> Result<UninstallReport> {
    let mut report = UninstallReport::default();

    if let Some(apollon) = project.target_id(APOLLON) {
        let removed = project.remove_dependencies_on(&apollon)?;
        tracing::debug!("removed {} dependencies on {}", removed, APOLLON);
        project.remove_target(&apollon)?;
        report.removed_target = true;
        shell.status(Status::Removed, format!("`{}` target", APOLLON));
    }

    for target_id in project.target_ids() {
        let is_aggregate = project
            .target_name(&target_id)
            .map_or(false, is_pods_aggregate);
        if is_aggregate && project.remove_shell_script_phase(&target_id, COLLECT_PHASE)? {
            shell.status(Status::Removed, "library collection phase");
        }
    }

    if project.remove_file_from_main_group(APOLLONFILE)? {
        tracing::debug!("removed {} reference", APOLLONFILE);
    }
    let apollonfile = project.project_dir().join(APOLLONFILE);
    if apollonfile.exists() {
        remove_file_if_exists(&apollonfile)?;
        shell.status(Status::Removed, apollonfile.display());
    }

    let mappings = SourceMappings::in_project_dir(project.project_dir());
    for target in project.targets() {
        if !is_pod_target(&target) {
            continue;
        }
        if !project.compile_sources(&target).is_some_and(|files| files.is_empty()) {
            continue;
        }
        match mappings.load(&target)? {
            Some(files) if !files.is_empty() => {
                project.set_compile_sources(&target, &files)?;
                report.restored.push(target);
            }
            _ => shell.warn(format!("no source mapping for `{}`", target)),
        }
    }
    if !report.restored.is_empty() {
        shell.status(
            Status::Updated,
            format!("restored compile sources of {}", report.restored.join(", ")),
        );
    }

    Ok(report)
}
