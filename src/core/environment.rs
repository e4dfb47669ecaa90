//! Xcode build-setting environment.
//!
//! `apollon --cache` and `apollon --sync_back` run as shell-script build
//! phases, so Xcode exports the settings we need as environment variables.

use std::path::{Path, PathBuf};

use crate::core::errors::ApollonError;

pub const PROJECT_FILE_PATH: &str = "PROJECT_FILE_PATH";
pub const PROJECT_DIR: &str = "PROJECT_DIR";
pub const CONFIGURATION: &str = "CONFIGURATION";
pub const PLATFORM_NAME: &str = "PLATFORM_NAME";
pub const ARCHS: &str = "ARCHS";
pub const BUILT_PRODUCTS_DIR: &str = "BUILT_PRODUCTS_DIR";

/// Build settings of the running Xcode build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// Path of the Pods `.xcodeproj` bundle
    pub project_file_path: PathBuf,

    /// Directory containing the Pods project
    pub project_dir: PathBuf,

    /// Build configuration name (e.g. `Debug`)
    pub configuration: String,

    /// Platform name (e.g. `iphonesimulator`)
    pub platform_name: String,

    /// Architectures, sorted
    pub archs: Vec<String>,

    /// Build products directory for the configuration and platform
    pub built_products_dir: PathBuf,
}

impl BuildEnvironment {
    /// Read the build settings from the process environment.
    pub fn from_env() -> Result<Self, ApollonError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the build settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApollonError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ApollonError::MissingEnvironment { name })
        };

        let mut archs: Vec<String> = require(ARCHS)?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        archs.sort();

        Ok(BuildEnvironment {
            project_file_path: PathBuf::from(require(PROJECT_FILE_PATH)?),
            project_dir: PathBuf::from(require(PROJECT_DIR)?),
            configuration: require(CONFIGURATION)?,
            platform_name: require(PLATFORM_NAME)?,
            archs,
            built_products_dir: PathBuf::from(require(BUILT_PRODUCTS_DIR)?),
        })
    }

    /// `<CONFIGURATION>-<PLATFORM>/<sorted archs joined by _>`
    pub fn configuration_descriptor(&self) -> String {
        format!(
            "{}-{}/{}",
            self.configuration,
            self.platform_name,
            self.archs.join("_")
        )
    }

    /// The Pods project directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Directory containing the Podfile, one level above the Pods project.
    pub fn podfile_dir(&self) -> PathBuf {
        self.project_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.project_dir.join(".."))
    }

    pub fn podfile_lock_path(&self) -> PathBuf {
        self.podfile_dir().join("Podfile.lock")
    }
}
