//! `apollon --cache`: reconcile the Pods project with the Apollonfile.
//!
//! A target's mode is never stored. It is observed from two facts: whether
//! `<BUILT_PRODUCTS_DIR>/<target>/lib<target>.a` is a symlink into the cache,
//! and whether the target's compile-sources phase is empty. Each run moves
//! every target toward its configured mode:
//!
//! - configured `true` with a cache hit: link the cached library and empty
//!   the compile phase;
//! - configured `true` with a cache miss, configured `false`, or not
//!   configured: compile from source, restoring the phase from its source
//!   mapping when it was emptied.
//!
//! Xcode snapshots the build graph before running script phases, so a run
//! that changes any compile phase saves the project and fails with
//! [`ApollonError::RerunRequired`]; the next build sees the new graph.

use anyhow::{Context, Result};

use crate::core::{
    ApollonError, BuildFile, ProjectStore, TargetMode, Transition, TransitionKind,
};
use crate::ops::RunContext;
use crate::sources::{GitRevisions, IdentityResolver, RevisionProvider};
use crate::util::fs::{
    ensure_dir, is_live_symlink, is_symlink, remove_file_if_exists, set_sources_writable, symlink,
    touch,
};
use crate::xcode::PbxProject;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Compile-phase changes made this run, in project order
    pub transitions: Vec<Transition>,

    /// Mode of every target with a compile phase after the run
    pub modes: Vec<(String, TargetMode)>,
}

impl SyncReport {
    /// Whether the project was changed and the build must run again.
    pub fn is_dirty(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub fn mode_of(&self, target: &str) -> Option<TargetMode> {
        self.modes
            .iter()
            .find(|(name, _)| name == target)
            .map(|(_, mode)| *mode)
    }
}

/// Run `--cache` against the Pods project of the current build.
pub fn sync(ctx: &RunContext) -> Result<SyncReport> {
    let mut project = PbxProject::open(&ctx.env().project_file_path)?;
    tracing::debug!("syncing {}", project.path().display());
    synchronize(ctx, &mut project, &GitRevisions::new())
}

/// Reconcile, then save and request a re-run if anything changed.
pub fn synchronize(
    ctx: &RunContext,
    project: &mut dyn ProjectStore,
    revisions: &dyn RevisionProvider,
) -> Result<SyncReport> {
    let report = reconcile(ctx, project, revisions)?;
    if report.is_dirty() {
        project.save()?;
        return Err(ApollonError::RerunRequired {
            transitions: report.transitions,
        }
        .into());
    }
    Ok(report)
}

/// Move every target toward its configured mode without saving the project.
///
/// Fails before touching anything if the Apollonfile names unknown targets or
/// a dev pod configured for caching has uncommitted changes.
pub fn reconcile(
    ctx: &RunContext,
    project: &mut dyn ProjectStore,
    revisions: &dyn RevisionProvider,
) -> Result<SyncReport> {
    let targets = project.targets();
    ctx.config()
        .validate_targets(&targets)
        .map_err(ApollonError::from)?;

    let identities = ctx.identities(revisions);
    for target in targets.iter().filter(|t| ctx.config().is_static(t)) {
        identities.ensure_clean(target)?;
    }

    let mut report = SyncReport::default();
    for target in &targets {
        let Some(sources) = project.compile_sources(target) else {
            tracing::debug!("{}: no compile sources phase, skipping", target);
            continue;
        };

        let linked = if ctx.config().is_static(target) {
            link_from_cache(ctx, &identities, target)?
        } else {
            unlink(ctx, target)?;
            false
        };

        let transition = if linked && !sources.is_empty() {
            project.set_compile_sources(target, &[])?;
            Some(TransitionKind::TurnOn)
        } else if !linked && sources.is_empty() && restore_sources(ctx, project, target)? {
            Some(TransitionKind::TurnOff)
        } else {
            None
        };
        if let Some(kind) = transition {
            report.transitions.push(Transition::new(target.as_str(), kind));
        }

        let sources_empty = project
            .compile_sources(target)
            .map_or(true, |files| files.is_empty());
        let mode = TargetMode::observe(linked, sources_empty);
        tracing::debug!("{}: {}", target, mode);
        report.modes.push((target.clone(), mode));
    }

    update_permissions(ctx, &identities, &targets)?;
    Ok(report)
}

/// Point the build-products library at the cache entry for the target's
/// current identity. Returns whether the target ends up linked.
fn link_from_cache(
    ctx: &RunContext,
    identities: &IdentityResolver<'_>,
    target: &str,
) -> Result<bool> {
    let identity = identities.identity_of(target)?;
    let cached = ctx.locations().cache_path_for(target, &identity)?;
    let product = ctx.locations().build_products_path_for(target);

    if cached.is_file() {
        remove_file_if_exists(&product)?;
        touch(&cached)?;
        if let Some(parent) = product.parent() {
            ensure_dir(parent)?;
        }
        symlink(&cached, &product).with_context(|| {
            format!(
                "failed to link {} to {}",
                product.display(),
                cached.display()
            )
        })?;
        tracing::debug!("{}: linked {}", target, cached.display());
    } else if is_symlink(&product) {
        tracing::info!("{}: no cached library for {}, unlinking", target, identity);
        remove_file_if_exists(&product)?;
    } else {
        tracing::debug!("{}: no cached library for {}", target, identity);
    }

    Ok(is_live_symlink(&product))
}

/// Drop a cache link left behind by an earlier static run, so a source
/// build cannot write through it into the cache.
fn unlink(ctx: &RunContext, target: &str) -> Result<()> {
    let product = ctx.locations().build_products_path_for(target);
    if is_symlink(&product) {
        tracing::debug!("{}: removing cache link {}", target, product.display());
        remove_file_if_exists(&product)?;
    }
    Ok(())
}

/// Refill an emptied compile phase from its source mapping. Returns false
/// when there is nothing to restore.
fn restore_sources(
    ctx: &RunContext,
    project: &mut dyn ProjectStore,
    target: &str,
) -> Result<bool> {
    let files: Vec<BuildFile> = match ctx.mappings().load(target)? {
        Some(files) if !files.is_empty() => files,
        _ => {
            tracing::debug!("{}: no source mapping to restore", target);
            return Ok(false);
        }
    };
    project.set_compile_sources(target, &files)?;
    Ok(true)
}

/// Make dev pod sources read-only while they are configured to link from
/// the cache and a library is in place, and writable otherwise.
fn update_permissions(
    ctx: &RunContext,
    identities: &IdentityResolver<'_>,
    targets: &[String],
) -> Result<()> {
    for target in targets {
        let Some(dir) = identities.dev_source_dir(target) else {
            continue;
        };
        let is_static = ctx.config().is_static(target);
        if is_static && !ctx.locations().build_products_path_for(target).exists() {
            continue;
        }
        if !dir.is_dir() {
            tracing::warn!("{}: source directory {} not found", target, dir.display());
            continue;
        }
        let writable = !is_static;
        let count = set_sources_writable(&dir, writable)?;
        tracing::debug!(
            "{}: {} {} source files",
            target,
            if writable { "unlocked" } else { "locked" },
            count
        );
    }
    Ok(())
}
