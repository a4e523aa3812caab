//! STRATA Test Utilities
//!
//! Centralized test infrastructure for the STRATA workspace:
//! - Recording tiers that log every call, for asserting not just what a
//!   resolution returned but which collaborators it touched
//! - Scripted sources (fixed entry, absence, failure)
//! - Entry fixtures for aged content

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use strata_cache::{CacheTier, CacheableContent, DurableTier, InMemoryTier, SourceFetcher};
use strata_core::{CacheEntry, ResourceKey, SourceError, StorageError, StrataResult};

/// One recorded call against a [`RecordingTier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierCall {
    Get(ResourceKey),
    Set(ResourceKey),
    Remove(ResourceKey),
    RemoveAll,
    SetAll(usize),
    GetAll,
}

/// An in-memory tier that records every call made against it.
///
/// The counterpart of mock verification in ordinary unit tests: after a
/// resolution, assert on [`calls`](Self::calls) to prove which collaborators
/// were touched and which were not. Seeding and peeking bypass the log so
/// test setup never pollutes the assertions.
pub struct RecordingTier<T> {
    inner: InMemoryTier<T>,
    calls: Mutex<Vec<TierCall>>,
    fail_writes: AtomicBool,
}

impl<T: CacheableContent> RecordingTier<T> {
    /// Create an empty recording tier.
    pub fn new() -> Self {
        Self {
            inner: InMemoryTier::new(),
            calls: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Insert an entry without recording the call (test setup).
    pub async fn seed(&self, key: &ResourceKey, entry: &CacheEntry<T>) {
        self.inner.set(key, entry).await.expect("seed should succeed");
    }

    /// Read an entry without recording the call (test assertions).
    pub async fn peek(&self, key: &ResourceKey) -> Option<CacheEntry<T>> {
        self.inner.get(key).await.expect("peek should succeed")
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<TierCall> {
        self.calls.lock().expect("call log lock").clone()
    }

    /// Number of recorded `set` calls.
    pub fn set_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TierCall::Set(_)))
            .count()
    }

    /// Assert that no call of any kind was recorded.
    pub fn assert_untouched(&self) {
        assert_eq!(self.calls(), Vec::new(), "tier should not have been called");
    }

    /// Make every subsequent write call fail with a storage error.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    fn record(&self, call: TierCall) {
        self.calls.lock().expect("call log lock").push(call);
    }

    fn write_error(&self) -> Option<StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Some(StorageError::Transaction {
                reason: "injected write failure".to_string(),
            })
        } else {
            None
        }
    }
}

impl<T: CacheableContent> Default for RecordingTier<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: CacheableContent> CacheTier<T> for RecordingTier<T> {
    async fn get(&self, key: &ResourceKey) -> StrataResult<Option<CacheEntry<T>>> {
        self.record(TierCall::Get(key.clone()));
        self.inner.get(key).await
    }

    async fn set(&self, key: &ResourceKey, entry: &CacheEntry<T>) -> StrataResult<()> {
        self.record(TierCall::Set(key.clone()));
        if let Some(err) = self.write_error() {
            return Err(err.into());
        }
        self.inner.set(key, entry).await
    }

    async fn remove(&self, key: &ResourceKey) -> StrataResult<()> {
        self.record(TierCall::Remove(key.clone()));
        if let Some(err) = self.write_error() {
            return Err(err.into());
        }
        self.inner.remove(key).await
    }

    async fn remove_all(&self) -> StrataResult<()> {
        self.record(TierCall::RemoveAll);
        if let Some(err) = self.write_error() {
            return Err(err.into());
        }
        self.inner.remove_all().await
    }

    async fn set_all(&self, entries: &HashMap<ResourceKey, CacheEntry<T>>) -> StrataResult<()> {
        self.record(TierCall::SetAll(entries.len()));
        if let Some(err) = self.write_error() {
            return Err(err.into());
        }
        self.inner.set_all(entries).await
    }
}

#[async_trait]
impl<T: CacheableContent> DurableTier<T> for RecordingTier<T> {
    async fn get_all(&self) -> StrataResult<HashMap<ResourceKey, CacheEntry<T>>> {
        self.record(TierCall::GetAll);
        self.inner.get_all().await
    }
}

/// What a [`RecordingSource`] does when fetched from.
#[derive(Debug, Clone)]
pub enum SourceScript<T> {
    /// Report absence (or a degraded outage).
    Absent,
    /// Serve this entry.
    Entry(CacheEntry<T>),
    /// Fail with a source error.
    Fail(String),
}

/// A scripted source fetcher that records the keys it was asked for.
pub struct RecordingSource<T> {
    script: SourceScript<T>,
    fetches: Mutex<Vec<ResourceKey>>,
}

impl<T: CacheableContent> RecordingSource<T> {
    /// A source with nothing to offer.
    pub fn absent() -> Self {
        Self::scripted(SourceScript::Absent)
    }

    /// A source that serves `entry` for every key.
    pub fn serving(entry: CacheEntry<T>) -> Self {
        Self::scripted(SourceScript::Entry(entry))
    }

    /// A source that fails every fetch.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::scripted(SourceScript::Fail(reason.into()))
    }

    fn scripted(script: SourceScript<T>) -> Self {
        Self {
            script,
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Every key fetched, in order.
    pub fn fetched_keys(&self) -> Vec<ResourceKey> {
        self.fetches.lock().expect("fetch log lock").clone()
    }

    /// Number of fetches made.
    pub fn fetch_count(&self) -> usize {
        self.fetched_keys().len()
    }

    /// Assert that the source was never consulted.
    pub fn assert_untouched(&self) {
        assert_eq!(
            self.fetch_count(),
            0,
            "source should not have been fetched from"
        );
    }
}

#[async_trait]
impl<T: CacheableContent> SourceFetcher<T> for RecordingSource<T> {
    async fn fetch(&self, key: &ResourceKey) -> StrataResult<Option<CacheEntry<T>>> {
        self.fetches.lock().expect("fetch log lock").push(key.clone());
        match &self.script {
            SourceScript::Absent => Ok(None),
            SourceScript::Entry(entry) => Ok(Some(entry.clone())),
            SourceScript::Fail(reason) => Err(SourceError::Unavailable {
                reason: reason.clone(),
            }
            .into()),
        }
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A valid resource key, panicking on invalid text (test code only).
pub fn key(text: &str) -> ResourceKey {
    ResourceKey::new(text).expect("fixture key should be valid")
}

/// An entry whose content was stamped `days` days ago.
pub fn entry_aged_days<T>(content: T, days: i64) -> CacheEntry<T> {
    CacheEntry::with_created_at(content, Utc::now() - chrono::Duration::days(days))
}

/// An entry whose content was stamped `secs` seconds ago.
pub fn entry_aged_secs<T>(content: T, secs: i64) -> CacheEntry<T> {
    CacheEntry::with_created_at(content, Utc::now() - chrono::Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_tier_logs_calls_in_order() {
        let tier: RecordingTier<String> = RecordingTier::new();
        let k = key("a");

        let _ = tier.get(&k).await;
        let _ = tier.set(&k, &CacheEntry::new("x".to_string())).await;
        let _ = tier.remove(&k).await;

        assert_eq!(
            tier.calls(),
            vec![
                TierCall::Get(k.clone()),
                TierCall::Set(k.clone()),
                TierCall::Remove(k),
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_and_peek_bypass_the_log() {
        let tier: RecordingTier<String> = RecordingTier::new();
        let k = key("a");

        tier.seed(&k, &CacheEntry::new("x".to_string())).await;
        assert!(tier.peek(&k).await.is_some());
        tier.assert_untouched();
    }

    #[tokio::test]
    async fn test_write_failure_injection() {
        let tier: RecordingTier<String> = RecordingTier::new();
        let k = key("a");

        tier.fail_writes(true);
        let err = tier
            .set(&k, &CacheEntry::new("x".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            strata_core::StrataError::Storage(StorageError::Transaction { .. })
        ));

        tier.fail_writes(false);
        tier.set(&k, &CacheEntry::new("x".to_string()))
            .await
            .expect("set should succeed again");
    }

    #[tokio::test]
    async fn test_scripted_sources() {
        let k = key("a");

        let absent: RecordingSource<String> = RecordingSource::absent();
        assert!(absent.fetch(&k).await.expect("fetch").is_none());

        let serving = RecordingSource::serving(CacheEntry::new("x".to_string()));
        let entry = serving.fetch(&k).await.expect("fetch").expect("present");
        assert_eq!(entry.content, "x");

        let failing: RecordingSource<String> = RecordingSource::failing("down");
        assert!(failing.fetch(&k).await.is_err());

        assert_eq!(serving.fetched_keys(), vec![k]);
    }

    #[test]
    fn test_aged_fixtures() {
        let entry = entry_aged_days("x", 10);
        let age = entry.age(Utc::now());
        assert!(age >= chrono::Duration::days(10));
        assert!(age < chrono::Duration::days(11));
    }
}
