//! STRATA Cache - Tiers and the Read-Through Resolver
//!
//! Two cache tiers in front of an expensive or unreliable source of truth:
//! a volatile in-memory tier consulted first, a durable LMDB tier behind it,
//! and a [`ReadThroughCache`] that walks primary, durable, and source in
//! order, promotes what it finds, and falls back to resurrecting stale data
//! when the source has nothing and the policy allows it.
//!
//! Every expiry decision is made here against the
//! [`CachePolicy`](strata_core::CachePolicy); the tiers themselves store
//! blindly and never interpret timestamps.

pub mod lmdb;
pub mod memory;
pub mod read_through;
pub mod traits;

pub use lmdb::LmdbTier;
pub use memory::InMemoryTier;
pub use read_through::{ReadThroughCache, ResolveStats};
pub use traits::{CacheTier, CacheableContent, DurableTier, SourceFetcher};
