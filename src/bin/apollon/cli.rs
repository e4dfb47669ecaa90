//! CLI definitions using clap.

use clap::{ArgGroup, Parser};

/// Apollon - a static library cache for CocoaPods targets
///
/// Exactly one action is run per invocation. `--cache` and `--sync_back` are
/// run by the script phases `--install` adds to the Pods project and read the
/// Xcode build environment.
#[derive(Parser)]
#[command(name = "apollon")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("action").required(true).multiple(false)))]
pub struct Cli {
    /// Link cached libraries and empty or restore compile phases
    #[arg(long, group = "action")]
    pub cache: bool,

    /// Copy freshly built libraries into the cache
    #[arg(long = "sync_back", group = "action")]
    pub sync_back: bool,

    /// Add the Apollon hook to the Podfile and run `pod install`
    #[arg(long, group = "action")]
    pub setup: bool,

    /// Remove the Apollon hook and strip Apollon from the Pods project
    #[arg(long, group = "action")]
    pub remove: bool,

    /// Delete every cached library
    #[arg(long, group = "action")]
    pub clean: bool,

    /// Evict least recently used libraries until the cache fits its size limit
    #[arg(long = "clean-old", group = "action")]
    pub clean_old: bool,

    /// Wire Apollon into the generated Pods project (run from the Podfile hook)
    #[arg(long, group = "action")]
    pub install: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// The action selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Cache,
    SyncBack,
    Setup,
    Remove,
    Clean,
    CleanOld,
    Install,
}

impl Cli {
    pub fn action(&self) -> Action {
        if self.cache {
            Action::Cache
        } else if self.sync_back {
            Action::SyncBack
        } else if self.setup {
            Action::Setup
        } else if self.remove {
            Action::Remove
        } else if self.clean {
            Action::Clean
        } else if self.clean_old {
            Action::CleanOld
        } else {
            Action::Install
        }
    }
}
