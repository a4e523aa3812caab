//! Error types for STRATA operations

use thiserror::Error;

/// Validation errors raised before any tier I/O happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Resource key is empty")]
    EmptyKey,

    #[error("Resource key is {len} bytes, limit is {limit}")]
    KeyTooLong { len: usize, limit: usize },
}

/// Storage layer errors, shared by the volatile and durable tiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Failed to open storage environment: {reason}")]
    EnvOpen { reason: String },

    #[error("Failed to open database: {reason}")]
    DbOpen { reason: String },

    #[error("Transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Deserialization failed: {reason}")]
    Deserialization { reason: String },

    #[error("Tier lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {reason}")]
    Io { reason: String },
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io {
            reason: e.to_string(),
        }
    }
}

/// Errors raised by a source-of-truth fetcher.
///
/// A source that is merely unreachable may instead report absence
/// (`Ok(None)`) so that the resolver's stale-reuse policy can engage;
/// these variants are for failures the caller must see.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Invalid payload from source: {reason}")]
    InvalidPayload { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all STRATA errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrataError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for STRATA operations.
pub type StrataResult<T> = Result<T, StrataError>;

// =============================================================================
// TESTS
// =============================================================================
