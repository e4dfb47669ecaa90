//! Artifact identity - the cache key of a pod's library.
//!
//! Released pods are identified by their `SPEC CHECKSUMS` entry. Dev pods
//! (`:path` pods) can change without the checksum changing, so they are
//! identified by the revision checked out in their source tree, which is only
//! trustworthy while the tree is clean.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::{ApollonError, LockData};
use crate::sources::revision::RevisionProvider;

/// Computes identities from the lock data and the dev pods' source trees.
pub struct IdentityResolver<'a> {
    lock: &'a LockData,
    podfile_dir: PathBuf,
    revisions: &'a dyn RevisionProvider,
}

impl<'a> IdentityResolver<'a> {
    /// `podfile_dir` is the directory `:path` entries are relative to, one
    /// level above the Pods project.
    pub fn new(
        lock: &'a LockData,
        podfile_dir: impl Into<PathBuf>,
        revisions: &'a dyn RevisionProvider,
    ) -> Self {
        IdentityResolver {
            lock,
            podfile_dir: podfile_dir.into(),
            revisions,
        }
    }

    /// True iff the pod comes from a local path.
    pub fn is_dev_dependency(&self, pod: &str) -> bool {
        self.lock.external_source_path(pod).is_some()
    }

    /// Source directory of a dev pod.
    pub fn dev_source_dir(&self, pod: &str) -> Option<PathBuf> {
        self.lock
            .external_source_path(pod)
            .map(|relative| normalize(&self.podfile_dir.join(relative)))
    }

    /// Checksum recorded in Podfile.lock.
    pub fn checksum_of(&self, pod: &str) -> Result<String> {
        match self.lock.checksum(pod) {
            Some(checksum) => Ok(checksum.to_string()),
            None => Err(ApollonError::MissingChecksum {
                pod: pod.to_string(),
            }
            .into()),
        }
    }

    /// Short revision checked out in a dev pod's source tree.
    pub fn revision_of(&self, pod: &str) -> Result<String> {
        let Some(dir) = self.dev_source_dir(pod) else {
            bail!("`{}` is not a development pod", pod);
        };
        self.revisions.current_revision(&dir)
    }

    /// The cache key for a pod's library.
    pub fn identity_of(&self, pod: &str) -> Result<String> {
        if self.is_dev_dependency(pod) {
            self.revision_of(pod)
        } else {
            self.checksum_of(pod)
        }
    }

    /// Fail with [`ApollonError::DirtyDevDependency`] if a dev pod has
    /// pending changes. Released pods always pass.
    pub fn ensure_clean(&self, pod: &str) -> Result<()> {
        let Some(dir) = self.dev_source_dir(pod) else {
            return Ok(());
        };
        if !self.revisions.is_clean(&dir)? {
            return Err(ApollonError::DirtyDevDependency { path: dir }.into());
        }
        Ok(())
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
