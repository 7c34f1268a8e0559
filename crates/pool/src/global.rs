//! Process-wide pool
//!
//! The pool is constructed lazily on first access and stays uninitialized
//! until someone calls [`MemoryPool::init`] on it. [`configure_global`] picks
//! its configuration; it only succeeds before the first [`global`] call.

use std::sync::OnceLock;

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::pool::MemoryPool;

static GLOBAL_POOL: OnceLock<MemoryPool> = OnceLock::new();

/// Returns the process-wide pool, creating it with the default configuration
/// if [`configure_global`] was never called
pub fn global() -> &'static MemoryPool {
    GLOBAL_POOL.get_or_init(MemoryPool::new)
}

/// Builds the process-wide pool with `config`
///
/// Fails with [`PoolError::AlreadyInitialized`] once the pool exists.
pub fn configure_global(config: PoolConfig) -> PoolResult<&'static MemoryPool> {
    let pool = MemoryPool::with_config(config)?;
    GLOBAL_POOL
        .set(pool)
        .map_err(|_| PoolError::AlreadyInitialized)?;
    tracing::debug!("global pool configured");
    Ok(global())
}
