//! Cache store trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Cache store trait for different cache backends.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a JSON value from the cache.
    ///
    /// Returns `Ok(None)` when the key is absent, expired or unreadable.
    async fn get_json(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Set a JSON value in the cache.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live duration; `None` never expires
    async fn set_json(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key from the cache. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Check if a live entry exists for the key.
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get_json(key).await?.is_some())
    }

    /// Clear all keys from the cache.
    async fn clear(&self) -> CacheResult<()>;

    /// Remove every expired or unreadable entry, returning how many were
    /// removed.
    async fn cleanup_expired(&self) -> CacheResult<usize>;
}
