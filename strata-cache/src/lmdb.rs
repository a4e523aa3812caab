//! LMDB-backed durable tier.
//!
//! Uses the heed crate (Rust bindings for LMDB) as the persistent medium
//! behind the volatile tier. Keys are the canonical resource-key bytes and
//! values are JSON-encoded entries, so the on-disk format is inspectable
//! with plain LMDB tooling.
//!
//! LMDB gives ACID transactions: reads run in read transactions, every
//! mutation commits a write transaction, and `put` is an upsert keyed by
//! the resource key.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use strata_core::{CacheEntry, ResourceKey, StorageError, StrataConfig, StrataResult};

use crate::traits::{CacheTier, CacheableContent, DurableTier};

/// The durable secondary tier.
///
/// One LMDB environment with a single unnamed database. The environment is
/// internally reference-counted, so the tier is cheap to share behind an
/// `Arc` and safe for concurrent readers alongside a writer.
pub struct LmdbTier<T> {
    env: Env,
    db: Database<Bytes, Bytes>,
    _content: PhantomData<fn() -> T>,
}

fn txn_err(e: heed::Error) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

impl<T: CacheableContent> LmdbTier<T> {
    /// Open (or create) the durable tier at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the LMDB
    /// environment cannot be opened, or the database cannot be created.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| StorageError::EnvOpen {
            reason: e.to_string(),
        })?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| StorageError::DbOpen {
                reason: e.to_string(),
            })?;
        wtxn.commit().map_err(txn_err)?;

        tracing::debug!(path = %path.as_ref().display(), "opened durable tier");

        Ok(Self {
            env,
            db,
            _content: PhantomData,
        })
    }

    /// Open the durable tier described by `config`.
    pub fn from_config(config: &StrataConfig) -> Result<Self, StorageError> {
        Self::open(&config.durable_dir, config.durable_max_size_mb)
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> Result<u64, StorageError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        self.db.len(&rtxn).map_err(txn_err)
    }

    /// Whether the tier is empty.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    fn encode(entry: &CacheEntry<T>) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(entry).map_err(|e| StorageError::Serialization {
            reason: e.to_string(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<CacheEntry<T>, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Deserialization {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl<T: CacheableContent> CacheTier<T> for LmdbTier<T> {
    async fn get(&self, key: &ResourceKey) -> StrataResult<Option<CacheEntry<T>>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        match self.db.get(&rtxn, key.as_bytes()).map_err(txn_err)? {
            Some(bytes) => Ok(Some(Self::decode(bytes)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &ResourceKey, entry: &CacheEntry<T>) -> StrataResult<()> {
        let bytes = Self::encode(entry)?;
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn remove(&self, key: &ResourceKey) -> StrataResult<()> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn remove_all(&self) -> StrataResult<()> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.clear(&mut wtxn).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn set_all(&self, entries: &HashMap<ResourceKey, CacheEntry<T>>) -> StrataResult<()> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        for (key, entry) in entries {
            let bytes = Self::encode(entry)?;
            self.db
                .put(&mut wtxn, key.as_bytes(), &bytes)
                .map_err(txn_err)?;
        }
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }
}

#[async_trait]
impl<T: CacheableContent> DurableTier<T> for LmdbTier<T> {
    async fn get_all(&self) -> StrataResult<HashMap<ResourceKey, CacheEntry<T>>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let mut entries = HashMap::new();

        for result in self.db.iter(&rtxn).map_err(txn_err)? {
            let (key_bytes, value_bytes) = result.map_err(txn_err)?;
            let text =
                std::str::from_utf8(key_bytes).map_err(|e| StorageError::Deserialization {
                    reason: format!("stored key is not UTF-8: {e}"),
                })?;
            let key = ResourceKey::new(text).map_err(|e| StorageError::Deserialization {
                reason: format!("stored key is invalid: {e}"),
            })?;
            entries.insert(key, Self::decode(value_bytes)?);
        }

        Ok(entries)
    }
}
