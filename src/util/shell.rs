//! Shell output for user-facing status lines.
//!
//! Diagnostics go through `tracing`; the lines a developer is meant to read
//! in the Xcode build log or the terminal go through [`Shell`].

use std::fmt::Display;
use std::io::{self, IsTerminal};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// errors only
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Added,
    Updated,
    Removed,
    Finished,

    // In-progress statuses (cyan)
    Installing,
    Collecting,
    Linking,

    // Info statuses (blue)
    Info,

    // Warning statuses (yellow)
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Added => "Added",
            Status::Updated => "Updated",
            Status::Removed => "Removed",
            Status::Finished => "Finished",
            Status::Installing => "Installing",
            Status::Collecting => "Collecting",
            Status::Linking => "Linking",
            Status::Info => "Info",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Added | Status::Updated | Status::Removed | Status::Finished => {
                "\x1b[1;32m"
            }
            Status::Installing | Status::Collecting | Status::Linking => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Central shell for user-facing output (stderr).
#[derive(Debug, Clone)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a shell, enabling colors when stderr is a terminal.
    pub fn new(verbosity: Verbosity) -> Self {
        Shell {
            verbosity,
            use_color: io::stderr().is_terminal(),
        }
    }

    /// A shell that never colors its output.
    pub fn plain(verbosity: Verbosity) -> Self {
        Shell {
            verbosity,
            use_color: false,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode only errors are printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.verbosity == Verbosity::Quiet && status != Status::Error {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!("{}{:>12}\x1b[0m", status.color_code(), text)
        } else {
            format!("{:>12}", text)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal)
    }
}
