//! File-backed cache store.
//!
//! Each key maps to one `<sanitized key>.cache` file holding the entry
//! document `{"value": ..., "expires_at": <unix seconds>|null}`, optionally
//! sealed with [`Cipher`]. Writes go to a unique temporary file that is then
//! renamed over the target, so readers never see a partial entry.

use crate::cipher::Cipher;
use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncReadExt;
use zocalo_log::{debug, warn};

const EXTENSION: &str = "cache";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct CacheEntry {
    value: Value,
    expires_at: Option<i64>,
}

impl CacheEntry {
    fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

/// Identity of the file version a slot was read from. A rename over the
/// path changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamp {
    len: u64,
    modified: Option<SystemTime>,
    #[cfg(unix)]
    inode: u64,
}

impl Stamp {
    fn of(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;

        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            #[cfg(unix)]
            inode: meta.ino(),
        }
    }
}

/// Outcome of reading one cache file
enum Slot {
    Missing,
    Live(CacheEntry),
    Expired(Stamp),
    Corrupt(String, Stamp),
}

/// Map a key to a safe file stem: everything outside `[A-Za-z0-9_-]`
/// becomes `_`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Cache store keeping one file per key under a directory
#[derive(Clone)]
pub struct FileCache {
    directory: PathBuf,
    cipher: Option<Cipher>,
}

impl FileCache {
    /// Open (creating if needed) a plaintext cache rooted at `directory`
    pub async fn new(directory: impl Into<PathBuf>) -> CacheResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await?;
        debug!(directory = %directory.display(), "File cache ready");

        Ok(Self {
            directory,
            cipher: None,
        })
    }

    /// Encrypt entries at rest with a key derived from `secret`
    pub fn with_encryption(mut self, secret: &str) -> CacheResult<Self> {
        self.cipher = Some(Cipher::new(secret)?);
        Ok(self)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{}", sanitize_key(key), EXTENSION))
    }

    fn encode(&self, entry: &CacheEntry) -> CacheResult<Vec<u8>> {
        let json = serde_json::to_vec(entry).map_err(|e| CacheError::Serialization(e.to_string()))?;
        match &self.cipher {
            Some(cipher) => Ok(cipher.seal(&json)?.into_bytes()),
            None => Ok(json),
        }
    }

    fn decode(&self, raw: &[u8]) -> CacheResult<CacheEntry> {
        let json = match &self.cipher {
            Some(cipher) => cipher.open(&String::from_utf8_lossy(raw))?,
            None => raw.to_vec(),
        };
        serde_json::from_slice(&json).map_err(|e| CacheError::Deserialization(e.to_string()))
    }

    async fn read_slot(&self, path: &Path, now: i64) -> CacheResult<Slot> {
        let mut file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Slot::Missing),
            Err(e) => return Err(e.into()),
        };
        let stamp = Stamp::of(&file.metadata().await?);
        let mut raw = Vec::new();
        file.read_to_end(&mut raw).await?;

        Ok(match self.decode(&raw) {
            Ok(entry) if entry.is_expired(now) => Slot::Expired(stamp),
            Ok(entry) => Slot::Live(entry),
            Err(e) => Slot::Corrupt(e.to_string(), stamp),
        })
    }

    /// Remove `path` only while it is still the version described by
    /// `stamp`; an entry written since then is kept.
    async fn remove_if_unchanged(path: &Path, stamp: &Stamp) -> CacheResult<bool> {
        match fs::metadata(path).await {
            Ok(meta) if Stamp::of(&meta) == *stamp => {
                Self::remove(path).await?;
                Ok(true)
            }
            Ok(_) => {
                debug!(path = %path.display(), "Cache entry rewritten since read, keeping it");
                Ok(false)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(path: &Path) -> CacheResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entry(&self, key: &str, entry: &CacheEntry) -> CacheResult<()> {
        let bytes = self.encode(entry)?;
        let target = self.path_for(key);
        let temp = self.directory.join(format!(
            ".{}.{}.tmp",
            sanitize_key(key),
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = fs::write(&temp, &bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn cache_files(&self) -> CacheResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<Value>> {
        let path = self.path_for(key);

        match self.read_slot(&path, Utc::now().timestamp()).await? {
            Slot::Missing => Ok(None),
            Slot::Live(entry) => Ok(Some(entry.value)),
            Slot::Expired(stamp) => {
                debug!(key, "Cache entry expired");
                Self::remove_if_unchanged(&path, &stamp).await?;
                Ok(None)
            }
            Slot::Corrupt(reason, stamp) => {
                warn!(key, reason = %reason, "Discarding unreadable cache entry");
                Self::remove_if_unchanged(&path, &stamp).await?;
                Ok(None)
            }
        }
    }

    async fn set_json(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = match ttl {
            Some(ttl) => {
                let secs = i64::try_from(ttl.as_secs())
                    .map_err(|_| CacheError::Config(format!("TTL too large: {:?}", ttl)))?;
                Some(Utc::now().timestamp().saturating_add(secs))
            }
            None => None,
        };

        self.write_entry(key, &CacheEntry { value, expires_at }).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        Self::remove(&self.path_for(key)).await
    }

    async fn clear(&self) -> CacheResult<()> {
        let files = self.cache_files().await?;
        let count = files.len();
        for path in files {
            Self::remove(&path).await?;
        }
        debug!(count, "Cache cleared");
        Ok(())
    }

    async fn cleanup_expired(&self) -> CacheResult<usize> {
        let now = Utc::now().timestamp();
        let mut removed = 0;

        for path in self.cache_files().await? {
            match self.read_slot(&path, now).await? {
                Slot::Expired(stamp) | Slot::Corrupt(_, stamp) => {
                    if Self::remove_if_unchanged(&path, &stamp).await? {
                        removed += 1;
                    }
                }
                Slot::Missing | Slot::Live(_) => {}
            }
        }

        debug!(removed, "Expired cache entries removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn cache(dir: &TempDir) -> FileCache {
        FileCache::new(dir.path()).await.unwrap()
    }

    fn stale(value: Value) -> CacheEntry {
        CacheEntry {
            value,
            expires_at: Some(Utc::now().timestamp() - 10),
        }
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("user:email:ana@example.com"), "user_email_ana_example_com");
        assert_eq!(sanitize_key("ok_key-1"), "ok_key-1");
        assert_eq!(sanitize_key("../etc/passwd"), "___etc_passwd");
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;

        cache
            .set_json("user:1", json!({ "id": 1 }), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(cache.get_json("user:1").await.unwrap(), Some(json!({ "id": 1 })));
        assert!(cache.path_for("user:1").ends_with("user_1.cache"));
        assert!(cache.exists("user:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_plaintext_document_shape() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        cache.set_json("k", json!("v"), None).await.unwrap();

        let raw = std::fs::read_to_string(cache.path_for("k")).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc, json!({ "value": "v", "expires_at": null }));
    }

    #[tokio::test]
    async fn test_expired_entry_is_deleted_on_read() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        cache.write_entry("old", &stale(json!(1))).await.unwrap();

        assert!(cache.path_for("old").exists());
        assert_eq!(cache.get_json("old").await.unwrap(), None);
        assert!(!cache.path_for("old").exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        std::fs::write(cache.path_for("bad"), b"{not json").unwrap();

        assert_eq!(cache.get_json("bad").await.unwrap(), None);
        assert!(!cache.path_for("bad").exists());
    }

    #[tokio::test]
    async fn test_stale_read_keeps_entry_rewritten_after_it() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        let path = cache.path_for("sesion");
        cache.write_entry("sesion", &stale(json!(1))).await.unwrap();

        let Slot::Expired(stamp) = cache.read_slot(&path, Utc::now().timestamp()).await.unwrap()
        else {
            panic!("expected an expired slot");
        };

        cache
            .set_json("sesion", json!({ "id": 2, "rol": "admin" }), None)
            .await
            .unwrap();

        assert!(!FileCache::remove_if_unchanged(&path, &stamp).await.unwrap());
        assert_eq!(
            cache.get_json("sesion").await.unwrap(),
            Some(json!({ "id": 2, "rol": "admin" }))
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        cache.delete("nothing").await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        cache.write_entry("a", &stale(json!(1))).await.unwrap();
        cache.write_entry("b", &stale(json!(2))).await.unwrap();
        cache.set_json("c", json!(3), None).await.unwrap();

        assert_eq!(cache.cleanup_expired().await.unwrap(), 2);
        assert_eq!(cache.get_json("c").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_clear_keeps_other_files() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        cache.set_json("a", json!(1), None).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        cache.clear().await.unwrap();
        assert!(!cache.exists("a").await.unwrap());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_encrypted_entries() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await.with_encryption("clave").unwrap();
        cache
            .set_json("user:email:ana@example.com", json!({ "password": "hash" }), None)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(cache.path_for("user:email:ana@example.com")).unwrap();
        assert!(!raw.contains("password"));
        assert_eq!(
            cache.get_json("user:email:ana@example.com").await.unwrap(),
            Some(json!({ "password": "hash" }))
        );
    }

    #[tokio::test]
    async fn test_undecryptable_entry_is_removed() {
        let dir = TempDir::new().unwrap();
        let writer = cache(&dir).await.with_encryption("uno").unwrap();
        writer.set_json("k", json!(1), None).await.unwrap();

        let reader = cache(&dir).await.with_encryption("dos").unwrap();
        assert_eq!(reader.get_json("k").await.unwrap(), None);
        assert!(!reader.path_for("k").exists());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir).await;
        for i in 0..5 {
            cache.set_json("same", json!(i), None).await.unwrap();
        }

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["same.cache".to_string()]);
        assert_eq!(cache.get_json("same").await.unwrap(), Some(json!(4)));
    }
}
