//! Tier and source traits.
//!
//! The resolver depends only on these contracts, never on a concrete
//! implementation: the volatile tier, the durable tier, and the source of
//! truth are all substitutable.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use strata_core::{CacheEntry, ResourceKey, StrataResult};

/// Marker for types that can live in a cache entry.
///
/// Blanket-implemented for every type that is cloneable, serializable, and
/// usable across await points; implementers never spell this out by hand.
pub trait CacheableContent: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheableContent for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A single cache tier.
///
/// Tiers are dumb storage: `set` is an upsert keyed by the resource key,
/// `get` returns whatever was last written, and no tier ever interprets an
/// entry's timestamp. Implementations must be safe for concurrent access;
/// concurrent `set` calls on the same key resolve to last-writer-wins.
#[async_trait]
pub trait CacheTier<T: CacheableContent>: Send + Sync {
    /// Retrieve the entry for `key`, or `None` if the tier has no entry.
    async fn get(&self, key: &ResourceKey) -> StrataResult<Option<CacheEntry<T>>>;

    /// Store an entry under `key`, inserting or replacing as needed.
    async fn set(&self, key: &ResourceKey, entry: &CacheEntry<T>) -> StrataResult<()>;

    /// Remove the entry for `key`, if any.
    async fn remove(&self, key: &ResourceKey) -> StrataResult<()>;

    /// Empty the tier.
    async fn remove_all(&self) -> StrataResult<()>;

    /// Upsert every entry in `entries`. No atomicity across entries is
    /// guaranteed.
    async fn set_all(&self, entries: &HashMap<ResourceKey, CacheEntry<T>>) -> StrataResult<()>;
}

/// A cache tier backed by a persistent medium, with bulk enumeration.
#[async_trait]
pub trait DurableTier<T: CacheableContent>: CacheTier<T> {
    /// Return every entry the tier holds.
    async fn get_all(&self) -> StrataResult<HashMap<ResourceKey, CacheEntry<T>>>;
}

/// Fetches a fresh entry from the canonical source.
///
/// Whatever this returns is authoritative truth at call time. `Ok(None)`
/// means the resource is absent or the source chose to degrade; either way
/// the resolver moves on to its stale-reuse policy. Errors propagate to the
/// resolver's caller unchanged, so an implementation that wants callers to
/// see an outage returns `Err` instead of `Ok(None)`. Retry and backoff, if
/// any, belong inside the implementation.
#[async_trait]
pub trait SourceFetcher<T: CacheableContent>: Send + Sync {
    /// Fetch the entry for `key` from the source of truth.
    async fn fetch(&self, key: &ResourceKey) -> StrataResult<Option<CacheEntry<T>>>;
}
