//! The read-through resolver.
//!
//! This module implements the core decision logic: consult the volatile
//! tier, then the durable tier, then the source, apply the expiry policy at
//! each step, promote what was found into faster tiers, and decide whether
//! a stale entry may be resurrected when the source has nothing to offer.
//! Everything else in the workspace is mechanical storage.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strata_core::{CacheEntry, CachePolicy, ResourceKey, StrataResult};

use crate::traits::{CacheTier, CacheableContent, DurableTier, SourceFetcher};

/// Counters for resolver outcomes.
///
/// Every completed `resolve` call lands in exactly one bucket; failed calls
/// record no outcome. The sum of the buckets is the number of completed
/// resolutions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Served fresh from the volatile tier.
    pub primary_hits: u64,
    /// Served fresh from the durable tier (and promoted).
    pub durable_hits: u64,
    /// Served from the source (and written to both tiers).
    pub source_fetches: u64,
    /// Served from a resurrected stale entry.
    pub resurrections: u64,
    /// Nothing to serve.
    pub misses: u64,
}

impl ResolveStats {
    /// Fraction of completed resolutions served without touching the
    /// source (0.0 to 1.0).
    pub fn tier_hit_rate(&self) -> f64 {
        let total = self.primary_hits
            + self.durable_hits
            + self.source_fetches
            + self.resurrections
            + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.primary_hits + self.durable_hits) as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    primary_hits: AtomicU64,
    durable_hits: AtomicU64,
    source_fetches: AtomicU64,
    resurrections: AtomicU64,
    misses: AtomicU64,
}

impl StatsInner {
    fn snapshot(&self) -> ResolveStats {
        ResolveStats {
            primary_hits: self.primary_hits.load(Ordering::Relaxed),
            durable_hits: self.durable_hits.load(Ordering::Relaxed),
            source_fetches: self.source_fetches.load(Ordering::Relaxed),
            resurrections: self.resurrections.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Two cache tiers in front of a source of truth.
///
/// Stateless across calls apart from outcome counters; a single long-lived
/// instance is safe to share, and `Clone` is an `Arc` clone. Concurrency
/// discipline belongs to the tiers: two concurrent resolutions of the same
/// expired key may both reach the source and both write back, which is an
/// accepted inefficiency since writes are idempotent upserts.
///
/// # Type Parameters
///
/// - `T`: the cached content type
/// - `P`: the volatile primary tier
/// - `D`: the durable secondary tier
/// - `S`: the source-of-truth fetcher
pub struct ReadThroughCache<T, P, D, S>
where
    T: CacheableContent,
    P: CacheTier<T>,
    D: DurableTier<T>,
    S: SourceFetcher<T>,
{
    primary: Arc<P>,
    durable: Arc<D>,
    source: Arc<S>,
    policy: CachePolicy,
    stats: Arc<StatsInner>,
    _content: PhantomData<fn() -> T>,
}

impl<T, P, D, S> ReadThroughCache<T, P, D, S>
where
    T: CacheableContent,
    P: CacheTier<T>,
    D: DurableTier<T>,
    S: SourceFetcher<T>,
{
    /// Create a new resolver over the given tiers and source.
    pub fn new(primary: Arc<P>, durable: Arc<D>, source: Arc<S>, policy: CachePolicy) -> Self {
        Self {
            primary,
            durable,
            source,
            policy,
            stats: Arc::new(StatsInner::default()),
            _content: PhantomData,
        }
    }

    /// Create a resolver with the default policy.
    pub fn with_defaults(primary: Arc<P>, durable: Arc<D>, source: Arc<S>) -> Self {
        Self::new(primary, durable, source, CachePolicy::default())
    }

    /// The expiry policy in force.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// A snapshot of the outcome counters.
    pub fn stats(&self) -> ResolveStats {
        self.stats.snapshot()
    }

    /// Resolve `key` to the freshest available content.
    ///
    /// The key is validated before any tier is touched; an empty or
    /// oversized key fails with a validation error and zero collaborator
    /// calls. Tier and source errors propagate to the caller unchanged -
    /// there is no retry and no partial-failure recovery here. `Ok(None)`
    /// means a total miss with nothing reusable.
    pub async fn resolve(&self, key: &str) -> StrataResult<Option<T>> {
        let key = ResourceKey::new(key)?;
        self.resolve_key(&key).await
    }

    /// Resolve an already-validated key.
    ///
    /// One sequential pass, no parallel fan-out: primary, then durable,
    /// then source, then the stale-reuse policy. Each step returns early
    /// when it can serve.
    pub async fn resolve_key(&self, key: &ResourceKey) -> StrataResult<Option<T>> {
        let now = Utc::now();

        let primary = self.primary.get(key).await?;
        if let Some(entry) = &primary {
            if !self.policy.is_expired(Some(entry), now) {
                tracing::debug!(key = %key, "primary tier hit");
                self.stats.primary_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.content.clone()));
            }
        }

        let durable = self.durable.get(key).await?;
        if let Some(entry) = &durable {
            if !self.policy.is_expired(Some(entry), now) {
                // Promote into the volatile tier; the durable tier already
                // holds this value and is not rewritten.
                self.primary.set(key, entry).await?;
                tracing::debug!(key = %key, "durable tier hit, promoted");
                self.stats.durable_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.content.clone()));
            }
        }

        match self.source.fetch(key).await? {
            Some(fresh) => {
                // Durable first, then volatile. Both writes complete before
                // the content is returned; a failed write-back surfaces as
                // an error rather than handing back unpersisted content.
                self.durable.set(key, &fresh).await?;
                self.primary.set(key, &fresh).await?;
                tracing::debug!(key = %key, "served from source");
                self.stats.source_fetches.fetch_add(1, Ordering::Relaxed);
                Ok(Some(fresh.content))
            }
            None => self.latest_expired_or_none(key, primary, durable, now).await,
        }
    }

    /// Copy every durable entry into the volatile tier.
    ///
    /// Useful at startup to avoid a cold primary tier. Returns the number
    /// of entries copied.
    pub async fn warm(&self) -> StrataResult<usize> {
        let entries = self.durable.get_all().await?;
        let count = entries.len();
        self.primary.set_all(&entries).await?;
        tracing::debug!(count, "warmed primary tier from durable tier");
        Ok(count)
    }

    /// The stale-reuse fallback: both tiers are missing or expired and the
    /// source yielded nothing.
    ///
    /// When permitted by policy, the more recently created of the two
    /// expired entries (ties favor the primary tier) is resurrected: its
    /// timestamp is reset to `now` and it is written back to both tiers,
    /// making it fresh for exactly one more policy window.
    async fn latest_expired_or_none(
        &self,
        key: &ResourceKey,
        primary: Option<CacheEntry<T>>,
        durable: Option<CacheEntry<T>>,
        now: DateTime<Utc>,
    ) -> StrataResult<Option<T>> {
        if !self.policy.reuse_latest_expired {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        let stale = match (primary, durable) {
            (Some(p), Some(d)) => Some(if p.created_at >= d.created_at { p } else { d }),
            (Some(p), None) => Some(p),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };

        let Some(stale) = stale else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let revived = stale.refreshed(now);
        self.durable.set(key, &revived).await?;
        self.primary.set(key, &revived).await?;
        tracing::warn!(
            key = %key,
            stale_since = %stale.created_at,
            "source yielded nothing, resurrected expired entry"
        );
        self.stats.resurrections.fetch_add(1, Ordering::Relaxed);
        Ok(Some(revived.content))
    }
}

impl<T, P, D, S> Clone for ReadThroughCache<T, P, D, S>
where
    T: CacheableContent,
    P: CacheTier<T>,
    D: DurableTier<T>,
    S: SourceFetcher<T>,
{
    fn clone(&self) -> Self {
        Self {
            primary: Arc::clone(&self.primary),
            durable: Arc::clone(&self.durable),
            source: Arc::clone(&self.source),
            policy: self.policy.clone(),
            stats: Arc::clone(&self.stats),
            _content: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryTier;
    use async_trait::async_trait;
    use std::time::Duration;

    // A source that always reports absence.
    struct EmptySource;

    #[async_trait]
    impl SourceFetcher<String> for EmptySource {
        async fn fetch(&self, _key: &ResourceKey) -> StrataResult<Option<CacheEntry<String>>> {
            Ok(None)
        }
    }

    // A source that serves a fixed value for every key.
    struct ConstantSource(String);

    #[async_trait]
    impl SourceFetcher<String> for ConstantSource {
        async fn fetch(&self, _key: &ResourceKey) -> StrataResult<Option<CacheEntry<String>>> {
            Ok(Some(CacheEntry::new(self.0.clone())))
        }
    }

    fn full_pipeline(
        source_value: &str,
    ) -> ReadThroughCache<String, InMemoryTier<String>, InMemoryTier<String>, ConstantSource> {
        ReadThroughCache::with_defaults(
            Arc::new(InMemoryTier::new()),
            Arc::new(InMemoryTier::new()),
            Arc::new(ConstantSource(source_value.to_string())),
        )
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_without_io() {
        let cache = full_pipeline("A");
        let err = cache.resolve("   ").await.unwrap_err();
        assert!(matches!(
            err,
            strata_core::StrataError::Validation(strata_core::ValidationError::EmptyKey)
        ));
        // No outcome was recorded.
        assert_eq!(cache.stats(), ResolveStats::default());
    }

    #[tokio::test]
    async fn test_total_miss_populates_both_tiers() {
        let cache = full_pipeline("A");

        let content = cache.resolve("https://example.com").await.expect("resolve");
        assert_eq!(content.as_deref(), Some("A"));

        let key = ResourceKey::new("https://example.com").expect("valid key");
        assert!(cache.primary.get(&key).await.expect("get").is_some());
        assert!(cache.durable.get(&key).await.expect("get").is_some());
        assert_eq!(cache.stats().source_fetches, 1);
    }

    #[tokio::test]
    async fn test_second_resolve_is_a_primary_hit() {
        let cache = full_pipeline("A");

        cache.resolve("k").await.expect("resolve");
        let content = cache.resolve("k").await.expect("resolve");

        assert_eq!(content.as_deref(), Some("A"));
        let stats = cache.stats();
        assert_eq!(stats.source_fetches, 1);
        assert_eq!(stats.primary_hits, 1);
    }

    #[tokio::test]
    async fn test_miss_with_empty_source_and_no_stale_data() {
        let cache = ReadThroughCache::with_defaults(
            Arc::new(InMemoryTier::new()),
            Arc::new(InMemoryTier::new()),
            Arc::new(EmptySource),
        );

        let content: Option<String> = cache.resolve("k").await.expect("resolve");
        assert!(content.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_resurrection_refreshes_timestamp_in_both_tiers() {
        let primary = Arc::new(InMemoryTier::new());
        let durable = Arc::new(InMemoryTier::new());
        let cache = ReadThroughCache::new(
            Arc::clone(&primary),
            Arc::clone(&durable),
            Arc::new(EmptySource),
            CachePolicy::new().with_expire_after(Duration::from_secs(60)),
        );

        let key = ResourceKey::new("k").expect("valid key");
        let stale = CacheEntry::with_created_at(
            "old-content".to_string(),
            Utc::now() - chrono::Duration::days(3650),
        );
        primary.set(&key, &stale).await.expect("set");

        let before = Utc::now();
        let content = cache.resolve_key(&key).await.expect("resolve");
        assert_eq!(content.as_deref(), Some("old-content"));

        for tier in [&primary, &durable] {
            let entry = tier.get(&key).await.expect("get").expect("present");
            assert_eq!(entry.content, "old-content");
            assert!(entry.created_at >= before);
        }
        assert_eq!(cache.stats().resurrections, 1);
    }

    #[tokio::test]
    async fn test_clone_shares_tiers_and_stats() {
        let cache = full_pipeline("A");
        let clone = cache.clone();

        clone.resolve("k").await.expect("resolve");
        // The original sees the clone's outcome and its cached entry.
        assert_eq!(cache.stats().source_fetches, 1);
        let content = cache.resolve("k").await.expect("resolve");
        assert_eq!(content.as_deref(), Some("A"));
        assert_eq!(cache.stats().primary_hits, 1);
    }

    #[test]
    fn test_tier_hit_rate() {
        let stats = ResolveStats {
            primary_hits: 6,
            durable_hits: 2,
            source_fetches: 1,
            resurrections: 0,
            misses: 1,
        };
        assert!((stats.tier_hit_rate() - 0.8).abs() < 0.001);
        assert!((ResolveStats::default().tier_hit_rate() - 0.0).abs() < 0.001);
    }
}
