//! The on-disk library cache and its size budget.
//!
//! Eviction is least-recently-used by modification time: `apollon --cache`
//! touches an entry every time it links it, so old mtimes mark libraries no
//! build has asked for in a while.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::util::fs::remove_dir_all_if_exists;

/// A file found in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl CachedFile {
    /// Last time a build used this file, in local time.
    pub fn last_used(&self) -> String {
        let time: DateTime<Local> = self.modified.into();
        time.format("%Y-%m-%d %H:%M:%S %z").to_string()
    }
}

/// Outcome of [`CacheStore::evict_to_fit`].
#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    /// Cache size before eviction
    pub total_before: u64,
    /// Files deleted, oldest first
    pub removed: Vec<CachedFile>,
}

impl EvictionReport {
    pub fn freed(&self) -> u64 {
        self.removed.iter().map(|f| f.size).sum()
    }

    pub fn total_after(&self) -> u64 {
        self.total_before - self.freed()
    }
}

/// Pick the files to delete so that the cache fits in `budget` bytes.
///
/// Files are taken oldest first while the amount still to free is positive,
/// so the file that crosses the budget is deleted too.
pub fn select_evictions(mut files: Vec<CachedFile>, budget: u64) -> Vec<CachedFile> {
    let total: u64 = files.iter().map(|f| f.size).sum();
    if total <= budget {
        return Vec::new();
    }

    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    let mut to_free = total - budget;
    let mut selected = Vec::new();
    for file in files {
        if to_free == 0 {
            break;
        }
        to_free = to_free.saturating_sub(file.size);
        selected.push(file);
    }
    selected
}

/// The cache root (`~/.apollon`).
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete the whole cache. Returns whether there was anything to delete.
    pub fn clear_all(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        remove_dir_all_if_exists(&self.root)?;
        Ok(true)
    }

    /// Every file in the cache.
    pub fn files(&self) -> Result<Vec<CachedFile>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.with_context(|| format!("failed to walk {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry
                .metadata()
                .with_context(|| format!("failed to stat {}", entry.path().display()))?;
            let modified = metadata.modified().with_context(|| {
                format!("failed to read modification time of {}", entry.path().display())
            })?;
            files.push(CachedFile {
                path: entry.into_path(),
                size: metadata.len(),
                modified,
            });
        }
        Ok(files)
    }

    /// Total size of the cache in bytes.
    pub fn total_size(&self) -> Result<u64> {
        Ok(self.files()?.iter().map(|f| f.size).sum())
    }

    /// Delete least recently used files until the cache fits in `budget`.
    pub fn evict_to_fit(&self, budget: u64) -> Result<EvictionReport> {
        let files = self.files()?;
        let total_before: u64 = files.iter().map(|f| f.size).sum();
        let removed = select_evictions(files, budget);

        for file in &removed {
            tracing::debug!(
                "deleting {}, last used {}",
                file.path.display(),
                file.last_used()
            );
            fs::remove_file(&file.path)
                .with_context(|| format!("failed to remove {}", file.path.display()))?;
        }

        if !removed.is_empty() {
            self.prune_empty_dirs()?;
        }

        Ok(EvictionReport {
            total_before,
            removed,
        })
    }

    /// Remove directories left empty by eviction, keeping the root.
    fn prune_empty_dirs(&self) -> Result<()> {
        for entry in WalkDir::new(&self.root).min_depth(1).contents_first(true) {
            let entry = entry.with_context(|| format!("failed to walk {}", self.root.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let is_empty = fs::read_dir(entry.path())
                .with_context(|| format!("failed to read directory: {}", entry.path().display()))?
                .next()
                .is_none();
            if is_empty {
                fs::remove_dir(entry.path()).with_context(|| {
                    format!("failed to remove directory: {}", entry.path().display())
                })?;
            }
        }
        Ok(())
    }
}
