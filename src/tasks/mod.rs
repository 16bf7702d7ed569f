//! Background Tasks Module
//!
//! # Tasks
//! - Expiry purge: drops expired entries from the in-memory backend at a fixed interval

mod purge;

pub use purge::spawn_purge_task;
