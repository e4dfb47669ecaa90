//! The project seam: what the sync engine needs from an Xcode project.

use anyhow::Result;

/// An entry of a target's compile-sources phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildFile {
    /// Object id of the referenced source file
    pub file_ref: String,

    /// Per-file `COMPILER_FLAGS`, if any
    pub compiler_flags: Option<String>,
}

impl BuildFile {
    /// A build file without per-file flags.
    pub fn new(file_ref: impl Into<String>) -> Self {
        BuildFile {
            file_ref: file_ref.into(),
            compiler_flags: None,
        }
    }

    /// A build file with per-file compiler flags.
    pub fn with_flags(file_ref: impl Into<String>, flags: impl Into<String>) -> Self {
        BuildFile {
            file_ref: file_ref.into(),
            compiler_flags: Some(flags.into()),
        }
    }
}

/// Targets and compile phases of a host project.
pub trait ProjectStore {
    /// Target names in project order.
    fn targets(&self) -> Vec<String>;

    /// The compile-sources phase of a target, or `None` if the target is
    /// unknown or has no such phase.
    fn compile_sources(&self, target: &str) -> Option<Vec<BuildFile>>;

    /// Replace the compile-sources phase of a target.
    fn set_compile_sources(&mut self, target: &str, files: &[BuildFile]) -> Result<()>;

    /// Persist all changes.
    fn save(&mut self) -> Result<()>;
}
