//! Thread-safe memory pool
//!
//! [`MemoryPool`] wraps the unlocked allocator core in a single
//! [`parking_lot::Mutex`]. Every public operation, `init` included, takes the
//! lock, checks the lifecycle state, and delegates.
//!
//! # Example
//!
//! ```
//! use mempool::{MemoryPool, PoolConfig};
//!
//! let pool = MemoryPool::with_config(PoolConfig::reference())?;
//! pool.init(1024)?;
//!
//! let block = pool.alloc(64)?;
//! pool.write(block, 0, b"hello")?;
//! assert_eq!(pool.read_at(block, 0, 5)?, b"hello");
//!
//! pool.free(block)?;
//! let stats = pool.deinit()?;
//! assert_eq!(stats.used_bytes, 0);
//! # Ok::<(), mempool::PoolError>(())
//! ```

use core::fmt;

use parking_lot::Mutex;

use crate::allocator::PoolCore;
use crate::config::PoolConfig;
use crate::directory::BlockInfo;
use crate::error::{PoolError, PoolResult};
use crate::handle::BlockHandle;
use crate::stats::PoolStats;

/// Lifecycle state of a [`MemoryPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// Constructed, no buffer yet
    Uninitialized,
    /// Buffer allocated, operations accepted
    Ready,
    /// Torn down; terminal
    Closed,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

enum Lifecycle {
    Uninitialized,
    Ready(PoolCore),
    Closed,
}

impl Lifecycle {
    fn state(&self) -> PoolState {
        match self {
            Self::Uninitialized => PoolState::Uninitialized,
            Self::Ready(_) => PoolState::Ready,
            Self::Closed => PoolState::Closed,
        }
    }
}

/// First-fit memory pool over one fixed-size buffer
pub struct MemoryPool {
    config: PoolConfig,
    inner: Mutex<Lifecycle>,
}

impl MemoryPool {
    /// Creates an uninitialized pool with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            inner: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    /// Creates an uninitialized pool with a custom configuration
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            inner: Mutex::new(Lifecycle::Uninitialized),
        })
    }

    /// Configuration the pool was built with
    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.inner.lock().state()
    }

    /// Check if the pool accepts allocations
    pub fn is_initialized(&self) -> bool {
        self.state() == PoolState::Ready
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Allocates the pool buffer and one free block spanning it
    pub fn init(&self, size: usize) -> PoolResult<()> {
        let mut inner = self.inner.lock();
        match *inner {
            Lifecycle::Uninitialized if size == 0 => {
                Err(PoolError::invalid_config("pool size must be non-zero"))
            }
            Lifecycle::Uninitialized => {
                *inner = Lifecycle::Ready(PoolCore::new(size, self.config.clone()));
                tracing::debug!(size, coalesce = ?self.config.coalesce, "pool initialized");
                Ok(())
            }
            Lifecycle::Ready(_) => Err(PoolError::AlreadyInitialized),
            Lifecycle::Closed => Err(PoolError::AlreadyClosed),
        }
    }

    /// Releases the buffer and the block directory
    ///
    /// The pool is closed for good afterwards. Returns the final statistics.
    pub fn deinit(&self) -> PoolResult<PoolStats> {
        let mut inner = self.inner.lock();
        match core::mem::replace(&mut *inner, Lifecycle::Closed) {
            Lifecycle::Ready(core) => {
                let stats = core.stats();
                tracing::debug!(
                    pool_size = stats.pool_size,
                    leaked_bytes = stats.used_bytes,
                    "pool closed"
                );
                Ok(stats)
            }
            Lifecycle::Uninitialized => {
                *inner = Lifecycle::Uninitialized;
                Err(PoolError::NotInitialized)
            }
            Lifecycle::Closed => Err(PoolError::AlreadyClosed),
        }
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Allocates `size` bytes from the first free block large enough
    pub fn alloc(&self, size: usize) -> PoolResult<BlockHandle> {
        self.with_core_mut(|core| core.allocate(size))
    }

    /// Returns a block to the pool and merges it with free neighbours
    pub fn free(&self, handle: BlockHandle) -> PoolResult<()> {
        self.with_core_mut(|core| core.deallocate(handle))
    }

    /// Grows a block, moving its contents when it does not already fit
    ///
    /// Returns `handle` unchanged when the block is already large enough.
    /// On error the original block stays valid.
    pub fn resize(&self, handle: BlockHandle, new_size: usize) -> PoolResult<BlockHandle> {
        self.with_core_mut(|core| core.resize(handle, new_size))
    }

    // ------------------------------------------------------------------
    // Block access
    // ------------------------------------------------------------------

    /// Copies out the whole block
    pub fn read(&self, handle: BlockHandle) -> PoolResult<Vec<u8>> {
        self.with_core(|core| core.bytes(handle).map(<[u8]>::to_vec))
    }

    /// Copies out `len` bytes starting at `offset` within the block
    pub fn read_at(&self, handle: BlockHandle, offset: usize, len: usize) -> PoolResult<Vec<u8>> {
        self.with_core(|core| core.read_at(handle, offset, len).map(<[u8]>::to_vec))
    }

    /// Writes `data` at `offset` within the block
    pub fn write(&self, handle: BlockHandle, offset: usize, data: &[u8]) -> PoolResult<()> {
        self.with_core_mut(|core| core.write(handle, offset, data))
    }

    /// Metadata for an allocated block
    pub fn block(&self, handle: BlockHandle) -> PoolResult<BlockInfo> {
        self.with_core(|core| core.block(handle))
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Snapshot of the block directory in offset order
    pub fn blocks(&self) -> PoolResult<Vec<BlockInfo>> {
        self.with_core(|core| Ok(core.blocks()))
    }

    /// Current statistics
    pub fn stats(&self) -> PoolResult<PoolStats> {
        self.with_core(|core| Ok(core.stats()))
    }

    /// Verifies the block directory, reporting [`PoolError::Corruption`]
    pub fn check_invariants(&self) -> PoolResult<()> {
        self.with_core(PoolCore::check_invariants)
    }

    fn with_core<R>(&self, f: impl FnOnce(&PoolCore) -> PoolResult<R>) -> PoolResult<R> {
        match &*self.inner.lock() {
            Lifecycle::Ready(core) => f(core),
            Lifecycle::Uninitialized => Err(PoolError::NotInitialized),
            Lifecycle::Closed => Err(PoolError::AlreadyClosed),
        }
    }

    fn with_core_mut<R>(&self, f: impl FnOnce(&mut PoolCore) -> PoolResult<R>) -> PoolResult<R> {
        match &mut *self.inner.lock() {
            Lifecycle::Ready(core) => f(core),
            Lifecycle::Uninitialized => Err(PoolError::NotInitialized),
            Lifecycle::Closed => Err(PoolError::AlreadyClosed),
        }
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        let mut debug = f.debug_struct("MemoryPool");
        debug.field("state", &inner.state());
        if let Lifecycle::Ready(core) = &*inner {
            debug.field("pool_size", &core.pool_size());
        }
        debug.field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_before_init() {
        let pool = MemoryPool::new();
        assert_eq!(pool.state(), PoolState::Uninitialized);
        assert_eq!(pool.alloc(8), Err(PoolError::NotInitialized));
        assert_eq!(pool.deinit(), Err(PoolError::NotInitialized));
        // A failed deinit does not close the pool.
        assert!(pool.init(64).is_ok());
    }

    #[test]
    fn test_double_init() {
        let pool = MemoryPool::new();
        pool.init(64).unwrap();
        assert_eq!(pool.init(64), Err(PoolError::AlreadyInitialized));
    }

    #[test]
    fn test_zero_size_rejected() {
        let pool = MemoryPool::new();
        assert!(matches!(pool.init(0), Err(PoolError::InvalidConfig { .. })));
        assert_eq!(pool.state(), PoolState::Uninitialized);
    }

    #[test]
    fn test_lifecycle_checked_before_size() {
        let pool = MemoryPool::new();
        pool.init(64).unwrap();
        assert_eq!(pool.init(0), Err(PoolError::AlreadyInitialized));

        pool.deinit().unwrap();
        assert_eq!(pool.init(0), Err(PoolError::AlreadyClosed));
    }

    #[test]
    fn test_closed_is_terminal() {
        let pool = MemoryPool::new();
        pool.init(64).unwrap();
        pool.deinit().unwrap();

        assert_eq!(pool.state(), PoolState::Closed);
        assert_eq!(pool.init(64), Err(PoolError::AlreadyClosed));
        assert_eq!(pool.alloc(1), Err(PoolError::AlreadyClosed));
        assert_eq!(pool.deinit(), Err(PoolError::AlreadyClosed));
    }

    #[test]
    fn test_with_config_validates() {
        let config = PoolConfig {
            alloc_pattern: Some(1),
            dealloc_pattern: Some(1),
            ..PoolConfig::default()
        };
        assert!(MemoryPool::with_config(config).is_err());
    }

    #[test]
    fn test_debug_shows_state() {
        let pool = MemoryPool::new();
        pool.init(32).unwrap();
        let text = format!("{pool:?}");
        assert!(text.contains("Ready"));
        assert!(text.contains("pool_size: 32"));
    }
}
