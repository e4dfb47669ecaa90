//! Command implementations

pub mod cache;
pub mod clean;
pub mod clean_old;
pub mod install;
pub mod remove;
pub mod setup;
pub mod sync_back;
