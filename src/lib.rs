//! couchcache - A bounded facade over a remote key-value cache
//!
//! Validates keys and values, clamps TTLs, and translates backend failures
//! into a small domain error set.

pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod tasks;

pub use cache::CacheFacade;
pub use config::Config;
pub use error::{BackendError, BackendErrorKind, CacheError, ConnectError};
pub use session::{CacheSession, MemcachedSession, MemorySession};
pub use tasks::spawn_purge_task;
