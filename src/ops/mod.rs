//! High-level operations.
//!
//! This module contains the implementation of Apollon commands.

pub mod apollon_clean;
pub mod apollon_collect;
pub mod apollon_install;
pub mod apollon_setup;
pub mod apollon_sync;
pub mod run_context;

pub use apollon_clean::{clean, clean_old};
pub use apollon_collect::{collect, sync_back, Collected};
pub use apollon_install::{install, install_into, uninstall_from, InstallReport, UninstallReport};
pub use apollon_setup::{remove, setup};
pub use apollon_sync::{reconcile, sync, synchronize, SyncReport};
pub use run_context::RunContext;
