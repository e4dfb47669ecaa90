//! `apollon --setup` and `apollon --remove`: the Podfile hook.
//!
//! Setup adds a `post_integrate` hook that runs `apollon --install` after
//! every `pod install`, then runs `pod install` once. Remove takes the hook
//! out again and strips Apollon from the generated project.

use anyhow::{bail, Result};
use regex::Regex;

use crate::core::ProjectStore;
use crate::ops::apollon_install::{uninstall_from, UninstallReport};
use crate::util::fs::{read_to_string, write_string};
use crate::util::process::{find_pod, ProcessBuilder};
use crate::util::{GlobalContext, Shell, Status};
use crate::xcode::PbxProject;

/// The line installed into the Podfile.
pub const HOOK_LINE: &str = "system('apollon', '--install') or raise 'apollon --install failed'";

const HOOK_PATTERN: &str =
    r#"(?m)^[ \t]*system\(\s*['"]apollon['"]\s*,\s*['"]--install['"]\s*\)[^\n]*(\n|$)"#;

const BLOCK_PATTERN: &str = r"(?m)^([ \t]*)post_integrate\s+do\s*\|\s*\w+\s*\|[ \t]*$";

const EMPTY_BLOCK_PATTERN: &str =
    r"(?m)^[ \t]*post_integrate\s+do\s*\|\s*\w+\s*\|[ \t]*\n[ \t]*end[ \t]*(\n|$)";

/// Whether the Podfile already runs `apollon --install`.
pub fn has_hook(podfile: &str) -> Result<bool> {
    Ok(Regex::new(HOOK_PATTERN)?.is_match(podfile))
}

/// Add the hook to an existing `post_integrate` block, or append a new
/// block.
pub fn insert_hook(podfile: &str) -> Result<String> {
    let block = Regex::new(BLOCK_PATTERN)?;
    if let Some(caps) = block.captures(podfile) {
        let (Some(line), Some(indent)) = (caps.get(0), caps.get(1)) else {
            bail!("unexpected `post_integrate` block");
        };
        let mut out = String::with_capacity(podfile.len() + HOOK_LINE.len() + 8);
        out.push_str(&podfile[..line.end()]);
        out.push('\n');
        out.push_str(indent.as_str());
        out.push_str("  ");
        out.push_str(HOOK_LINE);
        out.push_str(&podfile[line.end()..]);
        return Ok(out);
    }

    let mut out = podfile.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\npost_integrate do |installer|\n  ");
    out.push_str(HOOK_LINE);
    out.push_str("\nend\n");
    Ok(out)
}

/// Remove the hook, and its block when nothing else is left in it.
pub fn remove_hook(podfile: &str) -> Result<String> {
    let without_hook = Regex::new(HOOK_PATTERN)?.replace_all(podfile, "");
    let mut out = Regex::new(EMPTY_BLOCK_PATTERN)?
        .replace_all(&without_hook, "")
        .into_owned();
    while out.ends_with("\n\n") {
        out.pop();
    }
    Ok(out)
}

/// Run `--setup` in the working directory.
pub fn setup(gctx: &GlobalContext, shell: &Shell) -> Result<bool> {
    let podfile = gctx.podfile_path();
    if !podfile.exists() {
        bail!("No `Podfile` found in {}", gctx.cwd().display());
    }

    let contents = read_to_string(&podfile)?;
    if has_hook(&contents)? {
        shell.note("Apollon is already set up");
        return Ok(false);
    }

    write_string(&podfile, &insert_hook(&contents)?)?;
    shell.status(Status::Added, "`post_integrate` hook to the Podfile");

    let pod = find_pod()?;
    shell.status(Status::Installing, "pods");
    ProcessBuilder::new(pod)
        .arg("install")
        .cwd(gctx.cwd())
        .exec_and_check()?;
    shell.status(Status::Finished, "setting up Apollon");
    Ok(true)
}

/// Run `--remove` in the working directory.
pub fn remove(gctx: &GlobalContext, shell: &Shell) -> Result<UninstallReport> {
    let podfile = gctx.podfile_path();
    if !podfile.exists() {
        bail!("No `Podfile` found in {}", gctx.cwd().display());
    }
    let contents = read_to_string(&podfile)?;
    if !has_hook(&contents)? {
        bail!("Apollon is not installed!");
    }

    write_string(&podfile, &remove_hook(&contents)?)?;
    shell.status(Status::Removed, "`post_integrate` hook from the Podfile");

    let project_path = gctx.pods_project_path();
    if !project_path.exists() {
        shell.warn(format!("{} not found, skipping", project_path.display()));
        return Ok(UninstallReport::default());
    }
    let mut project = PbxProject::open(&project_path)?;
    let report = uninstall_from(&mut project, shell)?;
    project.save()?;
    shell.status(Status::Finished, "removing Apollon");
    Ok(report)
}
