//! Session Module
//!
//! The narrow capability the facade needs from a cache backend, plus the
//! adapters that provide it.

mod entry;
pub mod memcached;
mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendError;

pub use entry::Entry;
pub use memcached::MemcachedSession;
pub use memory::MemorySession;

// == Cache Session ==
/// A live, authenticated handle to one backend bucket.
///
/// Implementations must be safe to share between tasks; the facade issues
/// calls concurrently without any locking of its own.
#[async_trait]
pub trait CacheSession: Send + Sync {
    /// Fetches the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Bytes, BackendError>;

    /// Inserts or replaces `key`. A `ttl_secs` of 0 means no expiry.
    async fn upsert(&self, key: &str, value: Bytes, ttl_secs: u32) -> Result<(), BackendError>;

    /// Removes `key` regardless of its current version.
    async fn remove(&self, key: &str) -> Result<(), BackendError>;

    /// Concatenates `value` onto the existing value of `key`, keeping its expiry.
    async fn append(&self, key: &str, value: Bytes) -> Result<(), BackendError>;
}
