//! `apollon --sync_back`: copy freshly built libraries into the cache.
//!
//! Runs as the last script phase of the aggregate `Pods-` target, after every
//! pod library has been built.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::ProjectStore;
use crate::ops::RunContext;
use crate::sources::{GitRevisions, RevisionProvider};
use crate::util::fs::{copy_atomic, is_symlink};
use crate::xcode::PbxProject;

/// A library copied into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub target: String,
    pub path: PathBuf,
}

/// Run `--sync_back` against the Pods project of the current build.
pub fn sync_back(ctx: &RunContext) -> Result<Vec<Collected>> {
    let project = PbxProject::open(&ctx.env().project_file_path)?;
    collect(ctx, &project, &GitRevisions::new())
}

/// Copy the build-products library of every target configured for caching
/// into the cache, unless the cache already holds its current identity.
///
/// Links into the cache are never copied back, and dev pods with
/// uncommitted changes are skipped: their library does not match their
/// revision.
pub fn collect(
    ctx: &RunContext,
    project: &dyn ProjectStore,
    revisions: &dyn RevisionProvider,
) -> Result<Vec<Collected>> {
    let identities = ctx.identities(revisions);
    let mut collected = Vec::new();

    for target in project.targets() {
        if !ctx.config().is_static(&target) {
            continue;
        }
        let built = ctx.locations().build_products_path_for(&target);
        if !built.is_file() || is_symlink(&built) {
            continue;
        }
        if let Some(dir) = identities.dev_source_dir(&target) {
            if !revisions.is_clean(&dir)? {
                tracing::warn!("{}: {} has local changes, not caching", target, dir.display());
                continue;
            }
        }

        let identity = identities.identity_of(&target)?;
        let cached = ctx.locations().cache_path_for(&target, &identity)?;
        if cached.exists() {
            continue;
        }
        copy_atomic(&built, &cached)?;
        tracing::info!("{}: cached {}", target, cached.display());
        collected.push(Collected {
            target,
            path: cached,
        });
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildFile;
    use crate::test_support::{FakeRevisions, MemoryProject, SyncFixture};
    use crate::util::fs::symlink;

    fn project() -> MemoryProject {
        MemoryProject::new()
            .with_target("A", vec![BuildFile::new("A1")])
            .with_target("B", vec![BuildFile::new("B1")])
            .with_target("MyKit", vec![BuildFile::new("K1")])
    }

    #[test]
    fn test_collects_configured_targets_once() {
        let mut fixture = SyncFixture::new();
        fixture
            .released_pod("A", "aaaa")
            .released_pod("B", "bbbb")
            .configure("A", true)
            .configure("B", false);
        let built = fixture.write_built_library("A");
        fixture.write_built_library("B");
        let ctx = fixture.context();
        let revisions = FakeRevisions::new();

        let collected = collect(&ctx, &project(), &revisions).unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].target, "A");
        assert_eq!(
            std::fs::read(&collected[0].path).unwrap(),
            std::fs::read(&built).unwrap()
        );
        assert_eq!(
            collected[0].path,
            ctx.locations().cache_path_for("A", "aaaa").unwrap()
        );
        assert!(!ctx.locations().cache_dir_for("B", "bbbb").exists());

        assert!(collect(&ctx, &project(), &revisions).unwrap().is_empty());
    }

    #[test]
    fn test_skips_links_into_cache() {
        let mut fixture = SyncFixture::new();
        fixture.released_pod("A", "new").configure("A", true);
        let old = fixture.seed_cache("A", "old");
        let product = fixture.build_products_path("A");
        std::fs::create_dir_all(product.parent().unwrap()).unwrap();
        symlink(&old, &product).unwrap();

        let ctx = fixture.context();
        assert!(collect(&ctx, &project(), &FakeRevisions::new())
            .unwrap()
            .is_empty());
        assert!(!ctx.locations().cache_dir_for("A", "new").join("libA.a").exists());
    }

    #[test]
    fn test_dev_pods_use_revision_and_skip_dirty_trees() {
        let mut fixture = SyncFixture::new();
        let dir = fixture.dev_pod("MyKit");
        fixture.configure("MyKit", true);
        fixture.write_built_library("MyKit");
        let ctx = fixture.context();

        let mut dirty = FakeRevisions::new();
        dirty.add_repo(&dir, "abc1234", false);
        assert!(collect(&ctx, &project(), &dirty).unwrap().is_empty());

        let mut clean = FakeRevisions::new();
        clean.add_repo(&dir, "abc1234", true);
        let collected = collect(&ctx, &project(), &clean).unwrap();
        assert_eq!(
            collected[0].path,
            ctx.locations().cache_path_for("MyKit", "abc1234").unwrap()
        );
    }
}
