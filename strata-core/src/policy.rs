//! Expiry policy.
//!
//! The tiers store whatever they are given and never interpret timestamps;
//! [`CachePolicy`] is the single place where "expired" is decided.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;

/// Governs when cached entries expire and whether expired entries may be
/// resurrected when the source has nothing better to offer.
///
/// Constructed once at process start and handed to the resolver; treat it
/// as immutable from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Entries older than this are expired.
    #[serde(default = "default_expire_after")]
    pub expire_after: Duration,
    /// When the source yields nothing and every tier is expired, reuse the
    /// most recently created expired entry as if it were fresh.
    #[serde(default = "default_reuse_latest_expired")]
    pub reuse_latest_expired: bool,
}

fn default_expire_after() -> Duration {
    // 7 days
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_reuse_latest_expired() -> bool {
    true
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            expire_after: default_expire_after(),
            reuse_latest_expired: default_reuse_latest_expired(),
        }
    }
}

impl CachePolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expiry window.
    pub fn with_expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = expire_after;
        self
    }

    /// Enable or disable stale-entry resurrection.
    pub fn with_reuse_latest_expired(mut self, reuse: bool) -> Self {
        self.reuse_latest_expired = reuse;
        self
    }

    /// Whether an entry is expired at `now`.
    ///
    /// An absent entry is always expired; that is what drives the resolver
    /// on to the next tier. A present entry is expired once
    /// `created_at + expire_after` lies strictly before `now`.
    pub fn is_expired<T>(&self, entry: Option<&CacheEntry<T>>, now: DateTime<Utc>) -> bool {
        let Some(entry) = entry else {
            return true;
        };
        let window = chrono::Duration::from_std(self.expire_after)
            .unwrap_or(chrono::Duration::MAX);
        match entry.created_at.checked_add_signed(window) {
            Some(deadline) => deadline < now,
            // The deadline overflows the representable range; it can never
            // lie before `now`.
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry_aged(now: DateTime<Utc>, age: chrono::Duration) -> CacheEntry<String> {
        CacheEntry::with_created_at("content".to_string(), now - age)
    }

    #[test]
    fn test_defaults() {
        let policy = CachePolicy::default();
        assert_eq!(policy.expire_after, Duration::from_secs(7 * 24 * 60 * 60));
        assert!(policy.reuse_latest_expired);
    }

    #[test]
    fn test_builder() {
        let policy = CachePolicy::new()
            .with_expire_after(Duration::from_secs(60))
            .with_reuse_latest_expired(false);
        assert_eq!(policy.expire_after, Duration::from_secs(60));
        assert!(!policy.reuse_latest_expired);
    }

    #[test]
    fn test_absent_entry_is_expired() {
        let policy = CachePolicy::default();
        assert!(policy.is_expired::<String>(None, Utc::now()));
    }

    #[test]
    fn test_fresh_entry_is_not_expired() {
        let policy = CachePolicy::new().with_expire_after(Duration::from_secs(3600));
        let now = Utc::now();
        let entry = entry_aged(now, chrono::Duration::seconds(10));
        assert!(!policy.is_expired(Some(&entry), now));
    }

    #[test]
    fn test_old_entry_is_expired() {
        let policy = CachePolicy::new().with_expire_after(Duration::from_secs(3600));
        let now = Utc::now();
        let entry = entry_aged(now, chrono::Duration::seconds(3601));
        assert!(policy.is_expired(Some(&entry), now));
    }

    #[test]
    fn test_entry_exactly_at_deadline_is_not_expired() {
        // expired iff created_at + expire_after < now, so the boundary
        // instant itself still counts as fresh.
        let policy = CachePolicy::new().with_expire_after(Duration::from_secs(3600));
        let now = Utc::now();
        let entry = entry_aged(now, chrono::Duration::seconds(3600));
        assert!(!policy.is_expired(Some(&entry), now));
    }

    #[test]
    fn test_huge_window_never_expires() {
        let policy = CachePolicy::new().with_expire_after(Duration::from_secs(u64::MAX));
        let now = Utc::now();
        let entry = entry_aged(now, chrono::Duration::days(365 * 100));
        assert!(!policy.is_expired(Some(&entry), now));
    }

    proptest! {
        #[test]
        fn prop_expiry_matches_age_comparison(
            age_secs in 0i64..=10_000_000,
            window_secs in 1u64..=10_000_000,
        ) {
            let policy = CachePolicy::new()
                .with_expire_after(Duration::from_secs(window_secs));
            let now = Utc::now();
            let entry = entry_aged(now, chrono::Duration::seconds(age_secs));

            let expired = policy.is_expired(Some(&entry), now);
            prop_assert_eq!(expired, age_secs > window_secs as i64);
        }
    }
}
