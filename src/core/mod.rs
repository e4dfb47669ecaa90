//! Core data structures for Apollon.
//!
//! This module contains the types shared by every operation:
//! - The Xcode build environment
//! - The Apollonfile and Podfile.lock inputs
//! - Source mappings and the project seam
//! - Target modes and errors

pub mod config;
pub mod environment;
pub mod errors;
pub mod lock;
pub mod mode;
pub mod project;
pub mod source_mapping;

pub use config::{ApollonConfig, ConfigEntry, APOLLONFILE};
pub use environment::BuildEnvironment;
pub use errors::{ApollonError, ConfigError};
pub use lock::{LockData, LockEntry};
pub use mode::{TargetMode, Transition, TransitionKind};
pub use project::{BuildFile, ProjectStore};
pub use source_mapping::{SourceMappings, SOURCE_MAPPINGS_DIR};

/// Name of the aggregate target (and of the tool) inside the Pods project.
pub const APOLLON: &str = "Apollon";
