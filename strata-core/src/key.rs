//! Validated resource keys.
//!
//! A [`ResourceKey`] can only be built through [`ResourceKey::new`], which
//! rejects empty and oversized text. Tier contracts take `&ResourceKey`, so
//! an invalid key cannot reach storage at all - the validation is enforced
//! by construction rather than re-checked at every call site.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest key accepted, in bytes. Matches the default LMDB key limit so
/// the durable tier never has to truncate.
pub const MAX_KEY_BYTES: usize = 511;

/// An opaque, comparable identifier for a cached resource.
///
/// In the common case this is a URI, but any non-empty text works. The
/// same text always maps to the same entry in every tier: equality, hashing,
/// and ordering are those of the canonical (trimmed) text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Create a new resource key from text.
    ///
    /// Surrounding whitespace is trimmed before validation, so `" a "` and
    /// `"a"` are the same key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyKey`] if the trimmed text is empty,
    /// or [`ValidationError::KeyTooLong`] if it exceeds [`MAX_KEY_BYTES`].
    pub fn new(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let canonical = text.as_ref().trim();
        if canonical.is_empty() {
            return Err(ValidationError::EmptyKey);
        }
        if canonical.len() > MAX_KEY_BYTES {
            return Err(ValidationError::KeyTooLong {
                len: canonical.len(),
                limit: MAX_KEY_BYTES,
            });
        }
        Ok(Self(canonical.to_string()))
    }

    /// The canonical key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical key bytes, as stored by the durable tier.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = ValidationError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl TryFrom<&str> for ResourceKey {
    type Error = ValidationError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.0
    }
}
