//! Cache Module
//!
//! The bounded facade over a backend session: validation, TTL normalization
//! and error translation.

mod facade;
mod limits;

#[cfg(test)]
mod property_tests;

pub use facade::CacheFacade;
pub use limits::{normalize_ttl, validate_key, validate_value};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 20 * 1024 * 1024; // 20 MiB

/// Maximum TTL in seconds (30 days).
///
/// Larger expiry values are read by memcached-protocol backends as absolute
/// Unix timestamps.
pub const MAX_TTL_SECS: u32 = 60 * 60 * 24 * 30;
