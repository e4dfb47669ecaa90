//! Target artifact modes and the transitions between them.

use std::fmt;

/// How a target is currently built, as observed from the project and the
/// build-products directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// No sources and no cached library linked in.
    Uninitialized,
    /// Sources are listed in the compile phase.
    CompileFromSource,
    /// Compile phase is empty and the build-products library links into the cache.
    LinkFromCache,
}

impl TargetMode {
    /// Derive the mode from the two observable facts.
    pub fn observe(linked: bool, sources_empty: bool) -> Self {
        match (linked, sources_empty) {
            (_, false) => TargetMode::CompileFromSource,
            (true, true) => TargetMode::LinkFromCache,
            (false, true) => TargetMode::Uninitialized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetMode::Uninitialized => "uninitialized",
            TargetMode::CompileFromSource => "compile from source",
            TargetMode::LinkFromCache => "link from cache",
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a compile-phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Compile phase cleared, target links the cached library.
    TurnOn,
    /// Compile phase restored from the source mapping.
    TurnOff,
}

/// A project-visible change made to one target during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: String,
    pub kind: TransitionKind,
}

impl Transition {
    pub fn new(target: impl Into<String>, kind: TransitionKind) -> Self {
        Transition {
            target: target.into(),
            kind,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransitionKind::TurnOn => write!(f, "{}: Turn on Staticization!", self.target),
            TransitionKind::TurnOff => write!(f, "{}: Turn off Staticization!", self.target),
        }
    }
}
