//! In-memory volatile tier.
//!
//! A `RwLock<HashMap>` keyed by [`ResourceKey`]. Nothing survives a process
//! restart and no expiry is enforced here; the resolver alone interprets
//! timestamps.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use strata_core::{CacheEntry, ResourceKey, StorageError, StrataResult};

use crate::traits::{CacheTier, CacheableContent, DurableTier};

/// The volatile primary tier.
///
/// Safe for concurrent `get`/`set` from many resolver calls at once; two
/// concurrent writes to the same key resolve to last-writer-wins.
#[derive(Debug)]
pub struct InMemoryTier<T> {
    entries: RwLock<HashMap<ResourceKey, CacheEntry<T>>>,
}

impl<T> InMemoryTier<T> {
    /// Create an empty tier.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> StrataResult<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the tier is empty.
    pub fn is_empty(&self) -> StrataResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<ResourceKey, CacheEntry<T>>>, StorageError>
    {
        self.entries.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<ResourceKey, CacheEntry<T>>>, StorageError>
    {
        self.entries.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl<T> Default for InMemoryTier<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: CacheableContent> CacheTier<T> for InMemoryTier<T> {
    async fn get(&self, key: &ResourceKey) -> StrataResult<Option<CacheEntry<T>>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn set(&self, key: &ResourceKey, entry: &CacheEntry<T>) -> StrataResult<()> {
        self.write()?.insert(key.clone(), entry.clone());
        Ok(())
    }

    async fn remove(&self, key: &ResourceKey) -> StrataResult<()> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn remove_all(&self) -> StrataResult<()> {
        self.write()?.clear();
        Ok(())
    }

    async fn set_all(&self, entries: &HashMap<ResourceKey, CacheEntry<T>>) -> StrataResult<()> {
        let mut map = self.write()?;
        for (key, entry) in entries {
            map.insert(key.clone(), entry.clone());
        }
        Ok(())
    }
}

// Usable as a durable stand-in for tests and single-process setups where
// persistence across restarts is not needed.
#[async_trait]
impl<T: CacheableContent> DurableTier<T> for InMemoryTier<T> {
    async fn get_all(&self) -> StrataResult<HashMap<ResourceKey, CacheEntry<T>>> {
        Ok(self.read()?.clone())
    }
}
