//! Source mappings: snapshots of compile-sources phases.
//!
//! When a target links a cached library its compile phase is emptied. The
//! snapshot taken at install time is what puts the sources back.
//!
//! On disk each target has a `<target>.cs.json` file holding an array whose
//! items are either a bare file-reference id or a one-entry object mapping the
//! id to its compiler flags:
//!
//! ```json
//! ["0A1B2C3D4E5F60718293A4B5", {"1A2B3C4D5E6F708192A3B4C5": "-fno-objc-arc"}]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::project::BuildFile;
use crate::util::fs::write_string;

/// Directory name, relative to the Pods project directory.
pub const SOURCE_MAPPINGS_DIR: &str = "Source Mappings";

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum MappingItem {
    Bare(String),
    WithFlags(BTreeMap<String, String>),
}

/// Encode a compile phase in the mapping format.
pub fn to_json(files: &[BuildFile]) -> Result<String> {
    let items: Vec<MappingItem> = files
        .iter()
        .map(|file| match &file.compiler_flags {
            None => MappingItem::Bare(file.file_ref.clone()),
            Some(flags) => {
                MappingItem::WithFlags(BTreeMap::from([(file.file_ref.clone(), flags.clone())]))
            }
        })
        .collect();
    serde_json::to_string_pretty(&items).context("failed to serialize source mapping")
}

/// Decode the mapping format.
pub fn from_json(contents: &str) -> Result<Vec<BuildFile>> {
    let items: Vec<MappingItem> = serde_json::from_str(contents)?;
    let mut files = Vec::with_capacity(items.len());
    for item in items {
        match item {
            MappingItem::Bare(file_ref) => files.push(BuildFile::new(file_ref)),
            MappingItem::WithFlags(map) => {
                files.extend(map.into_iter().map(|(id, flags)| BuildFile::with_flags(id, flags)))
            }
        }
    }
    Ok(files)
}

/// The per-project directory of source mappings.
#[derive(Debug, Clone)]
pub struct SourceMappings {
    dir: PathBuf,
}

impl SourceMappings {
    /// Mappings stored under `<project_dir>/Source Mappings`.
    pub fn in_project_dir(project_dir: &Path) -> Self {
        SourceMappings {
            dir: project_dir.join(SOURCE_MAPPINGS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a target's mapping file.
    pub fn path_for(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{}.cs.json", target))
    }

    /// Load a target's mapping, `None` if it was never snapshotted.
    pub fn load(&self, target: &str) -> Result<Option<Vec<BuildFile>>> {
        let path = self.path_for(target);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read source mapping: {}", path.display()))?;
        let files = from_json(&contents)
            .with_context(|| format!("failed to parse source mapping: {}", path.display()))?;
        Ok(Some(files))
    }

    /// Snapshot a target's compile phase.
    pub fn save(&self, target: &str, files: &[BuildFile]) -> Result<()> {
        write_string(&self.path_for(target), &to_json(files)?)
    }
}
