//! Key, value and TTL bounds enforced before any backend call.

use tracing::debug;

use crate::cache::{MAX_KEY_LENGTH, MAX_TTL_SECS, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

/// Checks that `key` is between 1 and [`MAX_KEY_LENGTH`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        debug!("key of {} bytes rejected", key.len());
        return Err(CacheError::InvalidKey);
    }
    Ok(())
}

/// Checks that `value` is non-empty and at most [`MAX_VALUE_SIZE`] bytes.
pub fn validate_value(value: &[u8]) -> Result<()> {
    if value.is_empty() {
        debug!("body is empty");
        return Err(CacheError::EmptyBody);
    }
    if value.len() > MAX_VALUE_SIZE {
        debug!("body is too large: {} bytes", value.len());
        return Err(CacheError::OversizedBody);
    }
    Ok(())
}

/// Clamps a requested TTL into `0..=MAX_TTL_SECS`. Zero means no expiry.
pub fn normalize_ttl(ttl_secs: i64) -> u32 {
    ttl_secs.clamp(0, i64::from(MAX_TTL_SECS)) as u32
}
