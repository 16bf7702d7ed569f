//! In-Memory Session Module
//!
//! A process-local backend with TTL expiration, for embedding and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::cache::MAX_VALUE_SIZE;
use crate::error::{BackendError, BackendErrorKind};
use crate::session::{CacheSession, Entry};

// == Memory Session ==
/// In-process backend storing documents in a HashMap.
#[derive(Debug)]
pub struct MemorySession {
    /// Key-value storage
    entries: RwLock<HashMap<String, Entry>>,
    /// Largest document the backend will hold
    max_value_size: usize,
}

impl MemorySession {
    // == Constructor ==
    /// Creates an empty session that accepts documents up to 20 MiB.
    pub fn new() -> Self {
        Self::with_max_value_size(MAX_VALUE_SIZE)
    }

    /// Creates an empty session with a custom document size limit.
    pub fn with_max_value_size(max_value_size: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_value_size,
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn too_large(&self, len: usize) -> BackendError {
        BackendError::new(
            BackendErrorKind::ValueTooLarge,
            format!("{} bytes exceeds limit of {}", len, self.max_value_size),
        )
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheSession for MemorySession {
    async fn get(&self, key: &str) -> Result<Bytes, BackendError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(entry.value.clone()),
            _ => Err(BackendError::key_not_found(key)),
        }
    }

    async fn upsert(&self, key: &str, value: Bytes, ttl_secs: u32) -> Result<(), BackendError> {
        if value.len() > self.max_value_size {
            return Err(self.too_large(value.len()));
        }

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(value, ttl_secs));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) if !entry.is_expired() => Ok(()),
            _ => Err(BackendError::key_not_found(key)),
        }
    }

    async fn append(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        let mut entries = self.entries.write().await;
        let entry = match entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => entry,
            _ => return Err(BackendError::key_not_found(key)),
        };

        let combined = entry.value.len() + value.len();
        if combined > self.max_value_size {
            return Err(self.too_large(combined));
        }

        entry.append(&value);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let session = MemorySession::new();

        session.upsert("key1", Bytes::from_static(b"value1"), 0).await.unwrap();
        let value = session.get("key1").await.unwrap();

        assert_eq!(&value[..], b"value1");
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let session = MemorySession::new();

        session.upsert("key1", Bytes::from_static(b"value1"), 0).await.unwrap();
        session.upsert("key1", Bytes::from_static(b"value2"), 0).await.unwrap();

        assert_eq!(&session.get("key1").await.unwrap()[..], b"value2");
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_reports_key_not_found() {
        let session = MemorySession::new();

        let err = session.get("nonexistent").await.unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_remove() {
        let session = MemorySession::new();

        session.upsert("key1", Bytes::from_static(b"v"), 0).await.unwrap();
        session.remove("key1").await.unwrap();

        assert!(session.is_empty().await);
        let err = session.remove("key1").await.unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_append_missing_key() {
        let session = MemorySession::new();

        let err = session.append("nope", Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_value_too_large() {
        let session = MemorySession::with_max_value_size(4);

        let err = session
            .upsert("key", Bytes::from_static(b"12345"), 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::ValueTooLarge);

        session.upsert("key", Bytes::from_static(b"123"), 0).await.unwrap();
        let err = session.append("key", Bytes::from_static(b"45")).await.unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::ValueTooLarge);

        // A rejected append leaves the stored value untouched
        assert_eq!(&session.get("key").await.unwrap()[..], b"123");
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let session = MemorySession::new();

        session.upsert("key1", Bytes::from_static(b"v"), 1).await.unwrap();
        assert!(session.get("key1").await.is_ok());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let err = session.get("key1").await.unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let session = MemorySession::new();

        session.upsert("key1", Bytes::from_static(b"v"), 1).await.unwrap();
        session.upsert("key2", Bytes::from_static(b"v"), 10).await.unwrap();
        session.upsert("key3", Bytes::from_static(b"v"), 0).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(session.purge_expired().await, 1);
        assert_eq!(session.len().await, 2);
        assert!(session.get("key2").await.is_ok());
    }
}
