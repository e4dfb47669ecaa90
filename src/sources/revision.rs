//! Revision provider - VCS state of dev pod source trees.

use std::path::Path;

use anyhow::{Context, Result};
use git2::{Repository, StatusOptions};

use crate::core::ApollonError;

/// Reads the revision and cleanliness of a local source tree.
pub trait RevisionProvider {
    /// Short id of the checked-out revision.
    fn current_revision(&self, dir: &Path) -> Result<String>;

    /// Whether the tree has no uncommitted or untracked changes.
    fn is_clean(&self, dir: &Path) -> Result<bool>;
}

/// Git-backed revision provider. Read-only: never touches the index or the
/// working tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitRevisions;

impl GitRevisions {
    pub fn new() -> Self {
        GitRevisions
    }

    fn open(&self, dir: &Path) -> Result<Repository> {
        if !dir.join(".git").exists() {
            return Err(ApollonError::NotAGitRepo {
                path: dir.to_path_buf(),
            }
            .into());
        }
        Repository::open(dir)
            .with_context(|| format!("failed to open git repository: {}", dir.display()))
    }
}

impl RevisionProvider for GitRevisions {
    fn current_revision(&self, dir: &Path) -> Result<String> {
        let repo = self.open(dir)?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .with_context(|| format!("failed to resolve HEAD of {}", dir.display()))?;
        let short = commit
            .as_object()
            .short_id()
            .with_context(|| format!("failed to abbreviate HEAD of {}", dir.display()))?;
        Ok(short.as_str().unwrap_or_default().to_string())
    }

    fn is_clean(&self, dir: &Path) -> Result<bool> {
        let repo = self.open(dir)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .include_ignored(false)
            .recurse_untracked_dirs(true);
        let statuses = repo
            .statuses(Some(&mut opts))
            .with_context(|| format!("failed to read git status of {}", dir.display()))?;
        Ok(statuses.is_empty())
    }
}
