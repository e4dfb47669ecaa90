//! Global context for Apollon operations.
//!
//! Provides centralized access to the cache root, the user configuration
//! file and the working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::util::config::Config;

/// Overrides the cache root (`~/.apollon`).
pub const APOLLON_HOME_ENV: &str = "APOLLON_HOME";

/// Overrides the user configuration file path.
pub const APOLLON_CONFIG_ENV: &str = "APOLLON_CONFIG";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Cache root holding every cached library (~/.apollon/)
    home: PathBuf,

    /// User configuration file
    config_path: PathBuf,

    /// Loaded user configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = match std::env::var_os(APOLLON_HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(".apollon"))
                .context("failed to locate the home directory")?,
        };

        let config_path = match std::env::var_os(APOLLON_CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => ProjectDirs::from("com", "apollon", "apollon")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .unwrap_or_else(|| home.with_file_name(".apollon.toml")),
        };

        Ok(Self::with_paths(cwd, home, config_path))
    }

    /// Create a GlobalContext with explicit paths.
    pub fn with_paths(cwd: PathBuf, home: PathBuf, config_path: PathBuf) -> Self {
        let config = Config::load_or_default(&config_path);
        GlobalContext {
            cwd,
            home,
            config_path,
            config,
        }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the cache root (~/.apollon/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the user configuration file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the loaded user configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The Podfile in the working directory.
    pub fn podfile_path(&self) -> PathBuf {
        self.cwd.join("Podfile")
    }

    /// The Pods project directory next to the Podfile.
    pub fn pods_dir(&self) -> PathBuf {
        self.cwd.join("Pods")
    }

    /// The Pods Xcode project next to the Podfile.
    pub fn pods_project_path(&self) -> PathBuf {
        self.pods_dir().join("Pods.xcodeproj")
    }
}
