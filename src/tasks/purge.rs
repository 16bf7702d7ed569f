//! Expiry Purge Task
//!
//! Expired entries in the in-memory backend already read as missing; this task
//! reclaims their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::session::MemorySession;

/// Shortest interval between purges.
const MIN_INTERVAL_SECS: u64 = 1;

/// Spawns a background task that periodically purges expired entries.
///
/// Intervals below one second are raised to one second. The task runs until
/// aborted through the returned handle, which shutdown code is expected to do.
///
/// # Example
/// ```ignore
/// let session = Arc::new(MemorySession::new());
/// let purge_handle = spawn_purge_task(session.clone(), 1);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_purge_task(session: Arc<MemorySession>, interval_secs: u64) -> JoinHandle<()> {
    let interval = purge_interval(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry purge task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = session.purge_expired().await;
            if removed > 0 {
                info!("Expiry purge: removed {} expired entries", removed);
            } else {
                debug!("Expiry purge: no expired entries found");
            }
        }
    })
}

/// Each purge takes the write lock, so a zero interval would starve callers.
fn purge_interval(interval_secs: u64) -> Duration {
    Duration::from_secs(interval_secs.max(MIN_INTERVAL_SECS))
}
