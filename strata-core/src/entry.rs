//! Cache entries.
//!
//! A [`CacheEntry`] is a timestamped, opaque content holder. It records
//! when its content was considered fresh; every expiry decision is made by
//! [`CachePolicy`](crate::policy::CachePolicy) against that timestamp, never
//! by the entry or the tiers themselves. Absence of an entry is always
//! `Option::None`, never a zero-value entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single cached value together with its freshness timestamp.
///
/// The `id` is a storage identity meaningful only to the durable tier; the
/// resolver never reads it. `content` is opaque: the resolver forwards it to
/// the caller without inspecting or transforming it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Storage identity for the durable tier.
    pub id: Uuid,
    /// When the content was last considered fresh.
    pub created_at: DateTime<Utc>,
    /// The cached payload.
    pub content: T,
}

impl<T> CacheEntry<T> {
    /// Create an entry that is fresh as of now.
    pub fn new(content: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            content,
        }
    }

    /// Create an entry with an explicit freshness timestamp.
    pub fn with_created_at(content: T, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at,
            content,
        }
    }

    /// How old this entry is at `now`. Zero for entries stamped in the
    /// future (clock skew between writers).
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created_at).max(chrono::Duration::zero())
    }

    /// Build a resurrected copy of this entry: same identity and content,
    /// freshness reset to `now`.
    ///
    /// A new value is constructed instead of mutating in place, so a
    /// concurrent reader holding the old entry never observes the timestamp
    /// change under it.
    pub fn refreshed(&self, now: DateTime<Utc>) -> Self
    where
        T: Clone,
    {
        Self {
            id: self.id,
            created_at: now,
            content: self.content.clone(),
        }
    }
}

/// Raw content payload restored from the canonical source.
///
/// Carries the bytes together with their media type, for callers that cache
/// opaque HTTP-style responses rather than typed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// The raw content bytes.
    pub data: Vec<u8>,
    /// The media type of `data`, when the source reported one.
    pub media_type: Option<String>,
}

impl Payload {
    /// Create a payload without a media type.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            media_type: None,
        }
    }

    /// Create a payload with a media type.
    pub fn with_media_type(data: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: Some(media_type.into()),
        }
    }
}
