//! `apollon --clean` and `apollon --clean-old`.

use anyhow::Result;

use crate::cache::{CacheStore, EvictionReport};
use crate::util::GlobalContext;

/// Delete the whole cache. Returns whether anything was deleted.
pub fn clean(gctx: &GlobalContext) -> Result<bool> {
    let store = CacheStore::new(gctx.home());
    let removed = store.clear_all()?;
    if removed {
        tracing::debug!("removed {}", store.root().display());
    }
    Ok(removed)
}

/// Evict least recently used libraries until the cache fits in the
/// configured size limit.
pub fn clean_old(gctx: &GlobalContext) -> Result<EvictionReport> {
    let limit = gctx.config().cache.size_limit;
    tracing::debug!("cache size limit is {} bytes", limit);
    CacheStore::new(gctx.home()).evict_to_fit(limit)
}
