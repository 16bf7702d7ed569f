//! Cache Facade Module
//!
//! Bounded Get/Set/Delete/Append over one backend session.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, warn};

use crate::cache::{normalize_ttl, validate_key, validate_value};
use crate::config::Config;
use crate::error::{BackendError, BackendErrorKind, CacheError, ConnectError, Result};
use crate::session::{CacheSession, MemcachedSession};

// == Cache Facade ==
/// Validating front for a backend session.
///
/// Cloning is cheap and every clone shares the same session.
#[derive(Clone)]
pub struct CacheFacade {
    session: Arc<dyn CacheSession>,
}

impl CacheFacade {
    // == Constructors ==
    /// Wraps an already established session.
    pub fn new(session: Arc<dyn CacheSession>) -> Self {
        Self { session }
    }

    /// Connects to the backend at `address` and opens `bucket` with `password`.
    ///
    /// Connection failures are returned as-is.
    pub async fn connect(
        address: &str,
        bucket: &str,
        password: &str,
    ) -> std::result::Result<Self, ConnectError> {
        info!("Connecting to {}", address);
        let session = MemcachedSession::connect(address, bucket, password).await?;
        Ok(Self::new(Arc::new(session)))
    }

    /// Connects using the address and credentials in `config`.
    pub async fn from_config(config: &Config) -> std::result::Result<Self, ConnectError> {
        Self::connect(&config.address(), &config.bucket, &config.password).await
    }

    // == Get ==
    /// Reads `key`, returning None when it is absent or the read failed.
    ///
    /// Keys are not validated here. Failures other than "not found" are
    /// logged and otherwise look the same as a miss.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        match self.session.get(key).await {
            Ok(value) => Some(value),
            Err(e) if e.kind() == BackendErrorKind::KeyNotFound => None,
            Err(e) => {
                warn!("get '{}' failed: {}", key, e);
                None
            }
        }
    }

    // == Set ==
    /// Upserts `key` with `value`, expiring after `ttl_secs` clamped to 30 days.
    pub async fn set(&self, key: &str, value: Bytes, ttl_secs: i64) -> Result<()> {
        validate_key(key)?;
        validate_value(&value)?;
        let ttl = normalize_ttl(ttl_secs);

        self.session
            .upsert(key, value, ttl)
            .await
            .map_err(translate)
    }

    // == Delete ==
    /// Removes `key` unconditionally.
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.session.remove(key).await.map_err(translate)
    }

    // == Append ==
    /// Concatenates `value` onto the value stored at `key`. The key's TTL is kept.
    pub async fn append(&self, key: &str, value: Bytes) -> Result<()> {
        validate_key(key)?;
        validate_value(&value)?;

        self.session.append(key, value).await.map_err(translate)
    }

    // == Close ==
    /// Releases this handle on the session.
    ///
    /// The connection closes once the last clone of the facade is gone.
    pub fn close(self) {
        if Arc::strong_count(&self.session) == 1 {
            info!("Closing cache session");
        }
    }
}

/// Maps backend failures onto the domain taxonomy.
fn translate(err: BackendError) -> CacheError {
    match err.kind() {
        BackendErrorKind::KeyNotFound
        | BackendErrorKind::KeyExists
        | BackendErrorKind::NotStored => CacheError::NotFound,
        BackendErrorKind::ValueTooLarge => CacheError::OversizedBody,
        _ => {
            error!("backend error: {}", err);
            CacheError::Backend(err)
        }
    }
}
