//! Apollon - a static library cache for CocoaPods targets
//!
//! Apollon hooks into the Xcode build of a CocoaPods project. Pod targets
//! whose library is already cached for the current identity are linked
//! from the cache instead of being compiled, and freshly built libraries
//! are collected back into the cache at the end of the build.

pub mod cache;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;
pub mod xcode;

/// Test utilities and fakes for Apollon unit tests.
///
/// Only available when running tests. Provides an in-memory project store,
/// a fake revision provider and on-disk build fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{ApollonConfig, ApollonError, BuildEnvironment, LockData, TargetMode};
pub use ops::RunContext;
pub use util::context::GlobalContext;
