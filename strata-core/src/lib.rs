//! STRATA Core - Data Types, Policy, and Errors
//!
//! Defines the entities shared by every tier of the STRATA cache:
//! the timestamped cache entry, the validated resource key, the
//! expiry policy, configuration, and the error taxonomy. The tier
//! implementations and the read-through resolver live in `strata-cache`.

pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod policy;

pub use config::StrataConfig;
pub use entry::{CacheEntry, Payload};
pub use error::{
    ConfigError, SourceError, StorageError, StrataError, StrataResult, ValidationError,
};
pub use key::ResourceKey;
pub use policy::CachePolicy;
