//! Typed access on top of any [`CacheStore`].

use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use zocalo_log::debug;

/// Read `key` as a `T`.
///
/// An entry that no longer has the shape of `T` (for example after a
/// struct gained a field) is evicted and reported as a miss, the same way
/// the file store handles unreadable entries.
pub async fn get<S, T>(store: &S, key: &str) -> CacheResult<Option<T>>
where
    S: CacheStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(json) = store.get_json(key).await? else {
        return Ok(None);
    };

    match serde_json::from_value(json) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            debug!(key, error = %e, "Cached value has an unexpected shape, evicting");
            store.delete(key).await?;
            Ok(None)
        }
    }
}

/// Store `value` under `key`; `ttl` of `None` never expires.
pub async fn set<S, T>(store: &S, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
where
    S: CacheStore + ?Sized,
    T: Serialize,
{
    let json = serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    store.set_json(key, json, ttl).await
}

/// Cached value for `key`, or the result of `load` stored for `ttl`.
///
/// Failures of `load` are returned untouched and nothing is cached.
pub async fn remember<S, T, F, Fut, E>(store: &S, key: &str, ttl: Duration, load: F) -> Result<T, E>
where
    S: CacheStore + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: From<CacheError>,
{
    if let Some(value) = get(store, key).await? {
        return Ok(value);
    }

    let value = load().await?;
    set(store, key, &value, Some(ttl)).await?;
    Ok(value)
}
