//! Error types for Apollon operations.
//!
//! Every variant is fatal for the running command; `main` prints it as
//! `error: <message>` and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::mode::Transition;

/// A malformed or inconsistent Apollonfile.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{target}` Not Found in the Pods project")]
    UnknownTarget { target: String },

    #[error("Configuration of `{target}` is wrong: expected a boolean, found {found}")]
    NotBoolean { target: String, found: String },

    #[error("{} is not a dictionary of target names to booleans", path.display())]
    NotADictionary { path: PathBuf },
}

/// Fatal conditions detected while caching or collecting libraries.
#[derive(Debug, Error)]
pub enum ApollonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{} is dirty!", path.display())]
    DirtyDevDependency { path: PathBuf },

    #[error("no checksum for `{pod}` in Podfile.lock")]
    MissingChecksum { pod: String },

    #[error("{} is not git repo!", path.display())]
    NotAGitRepo { path: PathBuf },

    #[error("environment variable `{name}` is not set (is this running inside an Xcode build phase?)")]
    MissingEnvironment { name: &'static str },

    #[error("[Apollon] Re-Run!")]
    RerunRequired { transitions: Vec<Transition> },
}

impl ApollonError {
    /// Lines describing the per-target changes behind a re-run request.
    pub fn transition_lines(&self) -> Vec<String> {
        match self {
            ApollonError::RerunRequired { transitions } => {
                transitions.iter().map(|t| t.to_string()).collect()
            }
            _ => Vec::new(),
        }
    }
}
