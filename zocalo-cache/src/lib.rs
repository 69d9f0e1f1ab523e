//! File-backed caching for zocalo.
//!
//! [`FileCache`] implements [`CacheStore`] on top of a directory of entry
//! files, with per-entry TTL and optional AES-256-GCM encryption at rest.
//! The free functions in [`helpers`] add typed access on any store.
//!
//! ```no_run
//! # use zocalo_cache::*;
//! # use std::time::Duration;
//! # async fn example() -> CacheResult<()> {
//! let cache = FileCache::new("./cache").await?.with_encryption("secret")?;
//! helpers::set(&cache, "user:1", &vec![1, 2, 3], Some(Duration::from_secs(3600))).await?;
//! let ids: Option<Vec<u32>> = helpers::get(&cache, "user:1").await?;
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod error;
pub mod file_cache;
pub mod helpers;
pub mod traits;

pub use cipher::Cipher;
pub use error::{CacheError, CacheResult};
pub use file_cache::{FileCache, sanitize_key};
pub use traits::CacheStore;
