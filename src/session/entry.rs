//! Stored Entry Module
//!
//! Defines a single document held by the in-memory backend, with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};

// == Entry ==
/// A stored document with its expiry metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry. A `ttl_secs` of 0 means the entry never expires.
    pub fn new(value: Bytes, ttl_secs: u32) -> Self {
        let expires_at = match ttl_secs {
            0 => None,
            ttl => Some(current_timestamp_ms() + u64::from(ttl) * 1000),
        };

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Append ==
    /// Concatenates `suffix` onto the stored value, keeping the expiry.
    pub fn append(&mut self, suffix: &[u8]) {
        let mut buf = BytesMut::with_capacity(self.value.len() + suffix.len());
        buf.extend_from_slice(&self.value);
        buf.extend_from_slice(suffix);
        self.value = buf.freeze();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
