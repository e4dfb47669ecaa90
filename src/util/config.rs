//! User configuration file support for Apollon.
//!
//! The configuration lives in the platform config directory
//! (`~/.config/apollon/config.toml` on Linux,
//! `~/Library/Application Support/com.apollon.apollon/config.toml` on macOS)
//! and is optional. It is kept outside the cache root so `apollon --clean`
//! never removes it.
//!
//! ```toml
//! [cache]
//! size_limit = 2147483648
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default cache budget enforced by `apollon --clean-old` (1 GiB).
pub const DEFAULT_CACHE_LIMIT: u64 = 1024 * 1024 * 1024;

/// Apollon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total size budget in bytes for `--clean-old`
    pub size_limit: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            size_limit: DEFAULT_CACHE_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}
