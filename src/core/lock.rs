//! Podfile.lock data needed to identify pod artifacts.
//!
//! Only two sections matter: `SPEC CHECKSUMS` (content checksum of every
//! pod) and `EXTERNAL SOURCES` (pods sourced from a local `:path`, the
//! "dev pods").

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Lock information for one pod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockEntry {
    /// Content checksum from `SPEC CHECKSUMS`
    pub checksum: Option<String>,

    /// Local path from `EXTERNAL SOURCES`, relative to the Podfile directory
    pub external_source_path: Option<PathBuf>,
}

impl LockEntry {
    /// A pod sourced from a local, developer-editable path.
    pub fn is_dev(&self) -> bool {
        self.external_source_path.is_some()
    }
}

/// Parsed Podfile.lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockData {
    entries: BTreeMap<String, LockEntry>,
}

#[derive(Debug, Deserialize)]
struct RawLockfile {
    #[serde(rename = "SPEC CHECKSUMS", default)]
    spec_checksums: Option<BTreeMap<String, String>>,

    #[serde(rename = "EXTERNAL SOURCES", default)]
    external_sources: Option<BTreeMap<String, BTreeMap<String, serde_yaml::Value>>>,
}

impl LockData {
    /// Load a Podfile.lock from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lockfile: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse lockfile: {}", path.display()))
    }

    /// Parse Podfile.lock contents.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: RawLockfile = serde_yaml::from_str(contents)?;
        let mut entries: BTreeMap<String, LockEntry> = BTreeMap::new();

        for (pod, checksum) in raw.spec_checksums.unwrap_or_default() {
            entries.entry(pod).or_default().checksum = Some(checksum);
        }

        for (pod, options) in raw.external_sources.unwrap_or_default() {
            // CocoaPods serializes Ruby symbols, so the key is `:path`.
            let path = options
                .get(":path")
                .or_else(|| options.get("path"))
                .and_then(|v| v.as_str())
                .map(PathBuf::from);
            entries.entry(pod).or_default().external_source_path = path;
        }

        Ok(LockData { entries })
    }

    pub fn get(&self, pod: &str) -> Option<&LockEntry> {
        self.entries.get(pod)
    }

    pub fn checksum(&self, pod: &str) -> Option<&str> {
        self.entries.get(pod).and_then(|e| e.checksum.as_deref())
    }

    pub fn external_source_path(&self, pod: &str) -> Option<&Path> {
        self.entries
            .get(pod)
            .and_then(|e| e.external_source_path.as_deref())
    }

    pub fn insert(&mut self, pod: impl Into<String>, entry: LockEntry) {
        self.entries.insert(pod.into(), entry);
    }
}
