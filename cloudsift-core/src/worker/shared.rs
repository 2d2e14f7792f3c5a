use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::pool::WorkerPool;
use crate::error::PoolError;

static SHARED_POOL: OnceCell<Arc<WorkerPool>> = OnceCell::new();

/// Returns the process-wide pool, creating and starting it on first use.
///
/// `max_workers` only applies to the call that creates the pool; later calls
/// get the existing instance regardless of the value passed. Must be called
/// from within a Tokio runtime.
pub fn init_shared_pool(max_workers: usize) -> Result<Arc<WorkerPool>, PoolError> {
    SHARED_POOL
        .get_or_try_init(|| {
            let pool = WorkerPool::new(max_workers)?;
            pool.start();
            Ok(Arc::new(pool))
        })
        .cloned()
}

/// The process-wide pool, if it has been initialised.
pub fn shared_pool() -> Option<Arc<WorkerPool>> {
    SHARED_POOL.get().cloned()
}
