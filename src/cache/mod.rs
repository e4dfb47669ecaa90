//! Library cache: where cached libraries live and how the cache is bounded.

pub mod location;
pub mod store;

pub use location::{library_name, Locations};
pub use store::{select_evictions, CacheStore, CachedFile, EvictionReport};
