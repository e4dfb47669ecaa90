//! Xcode project files.

pub mod pbxproj;
pub mod project;

pub use pbxproj::{PbxDict, PbxValue};
pub use project::{PbxProject, PBXPROJ};
