//! Test doubles for Apollon unit tests.
//!
//! The sync engine only talks to a [`ProjectStore`] and a
//! [`RevisionProvider`], so tests swap in [`MemoryProject`] and
//! [`FakeRevisions`] and never need a real Xcode project or git checkout.
//! [`SyncFixture`] lays out everything else a run touches in a temp dir.

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use indexmap::IndexMap;

use crate::core::{ApollonError, BuildFile, ProjectStore};
use crate::sources::RevisionProvider;

pub use fixtures::*;

/// In-memory project: target name to compile-sources phase (`None` for
/// targets without one, like aggregate targets).
#[derive(Debug, Clone, Default)]
pub struct MemoryProject {
    targets: IndexMap<String, Option<Vec<BuildFile>>>,
    saves: usize,
}

impl MemoryProject {
    pub fn new() -> Self {
        MemoryProject::default()
    }

    /// Add a target with a compile-sources phase.
    pub fn with_target(mut self, name: &str, files: Vec<BuildFile>) -> Self {
        self.targets.insert(name.to_string(), Some(files));
        self
    }

    /// Add a target without a compile-sources phase.
    pub fn with_aggregate_target(mut self, name: &str) -> Self {
        self.targets.insert(name.to_string(), None);
        self
    }

    /// Current sources of a target; empty for unknown targets.
    pub fn sources(&self, name: &str) -> Vec<BuildFile> {
        self.targets
            .get(name)
            .cloned()
            .flatten()
            .unwrap_or_default()
    }

    /// How many times `save` was called.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ProjectStore for MemoryProject {
    fn targets(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    fn compile_sources(&self, target: &str) -> Option<Vec<BuildFile>> {
        self.targets.get(target).cloned().flatten()
    }

    fn set_compile_sources(&mut self, target: &str, files: &[BuildFile]) -> Result<()> {
        match self.targets.get_mut(target) {
            Some(Some(phase)) => {
                *phase = files.to_vec();
                Ok(())
            }
            Some(None) => bail!("target `{}` has no compile sources phase", target),
            None => bail!("target `{}` not found", target),
        }
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// Revision provider backed by a map of directory to (revision, clean).
#[derive(Debug, Clone, Default)]
pub struct FakeRevisions {
    repos: HashMap<PathBuf, (String, bool)>,
}

impl FakeRevisions {
    pub fn new() -> Self {
        FakeRevisions::default()
    }

    pub fn add_repo(&mut self, dir: impl Into<PathBuf>, revision: &str, clean: bool) {
        self.repos.insert(dir.into(), (revision.to_string(), clean));
    }

    fn repo(&self, dir: &Path) -> Result<&(String, bool)> {
        match self.repos.get(dir) {
            Some(repo) => Ok(repo),
            None => Err(ApollonError::NotAGitRepo {
                path: dir.to_path_buf(),
            }
            .into()),
        }
    }
}

impl RevisionProvider for FakeRevisions {
    fn current_revision(&self, dir: &Path) -> Result<String> {
        Ok(self.repo(dir)?.0.clone())
    }

    fn is_clean(&self, dir: &Path) -> Result<bool> {
        Ok(self.repo(dir)?.1)
    }
}

/// Initialize a git repository at `dir` with one committed file and return
/// the full commit id.
pub fn init_repo_with_commit(dir: &Path) -> String {
    let repo = git2::Repository::init(dir).unwrap();
    std::fs::write(dir.join("Kit.m"), "@implementation Kit\n@end\n").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("Kit.m")).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = git2::Signature::now("Apollon Test", "test@apollon.dev").unwrap();
    let commit = repo
        .commit(Some("HEAD"), &signature, &signature, "Initial commit", &tree, &[])
        .unwrap();
    commit.to_string()
}
