//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the facade's contract against the in-memory backend.

use std::sync::Arc;

use bytes::Bytes;
use proptest::prelude::*;
use tokio_test::block_on;

use crate::cache::{normalize_ttl, CacheFacade, MAX_KEY_LENGTH, MAX_TTL_SECS};
use crate::error::CacheError;
use crate::session::MemorySession;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,64}"
}

/// Generates keys that are longer than the limit
fn overlong_key_strategy() -> impl Strategy<Value = String> {
    (MAX_KEY_LENGTH + 1..MAX_KEY_LENGTH + 64).prop_map(|len| "k".repeat(len))
}

/// Generates valid values
fn valid_value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..256)
}

fn memory_facade() -> CacheFacade {
    CacheFacade::new(Arc::new(MemorySession::new()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Clamping never leaves 0..=30 days and is the identity inside it
    #[test]
    fn prop_ttl_normalization(ttl in any::<i64>()) {
        let normalized = normalize_ttl(ttl);
        prop_assert!(normalized <= MAX_TTL_SECS);
        if (0..=i64::from(MAX_TTL_SECS)).contains(&ttl) {
            prop_assert_eq!(i64::from(normalized), ttl);
        } else if ttl < 0 {
            prop_assert_eq!(normalized, 0);
        } else {
            prop_assert_eq!(normalized, MAX_TTL_SECS);
        }
    }

    // Storing then reading a valid pair returns exactly what was stored
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl in -10i64..10_000_000,
    ) {
        let facade = memory_facade();
        block_on(async {
            facade.set(&key, Bytes::from(value.clone()), ttl).await.unwrap();
            let stored = facade.get(&key).await;
            prop_assert_eq!(stored.as_deref(), Some(&value[..]));
            Ok::<(), TestCaseError>(())
        })?;
    }

    // After a delete the key reads as absent
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let facade = memory_facade();
        block_on(async {
            facade.set(&key, Bytes::from(value), 0).await.unwrap();
            facade.delete(&key).await.unwrap();
            prop_assert!(facade.get(&key).await.is_none());
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Append concatenates bytes in order with nothing in between
    #[test]
    fn prop_append_concatenates(
        key in valid_key_strategy(),
        first in valid_value_strategy(),
        second in valid_value_strategy(),
    ) {
        let facade = memory_facade();
        block_on(async {
            facade.set(&key, Bytes::from(first.clone()), 60).await.unwrap();
            facade.append(&key, Bytes::from(second.clone())).await.unwrap();

            let mut expected = first;
            expected.extend_from_slice(&second);
            let stored = facade.get(&key).await;
            prop_assert_eq!(stored.as_deref(), Some(&expected[..]));
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Overlong keys are rejected by every write path
    #[test]
    fn prop_overlong_keys_rejected(key in overlong_key_strategy(), value in valid_value_strategy()) {
        let facade = memory_facade();
        block_on(async {
            let value = Bytes::from(value);
            prop_assert!(matches!(facade.set(&key, value.clone(), 10).await, Err(CacheError::InvalidKey)));
            prop_assert!(matches!(facade.delete(&key).await, Err(CacheError::InvalidKey)));
            prop_assert!(matches!(facade.append(&key, value).await, Err(CacheError::InvalidKey)));
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Reads of keys never written are plain misses
    #[test]
    fn prop_get_missing_is_absent(key in ".{0,300}") {
        let facade = memory_facade();
        prop_assert!(block_on(facade.get(&key)).is_none());
    }
}
