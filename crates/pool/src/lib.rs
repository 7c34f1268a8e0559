//! # mempool
//!
//! A self-managed memory pool: one fixed-size byte buffer handed out in
//! variable-sized blocks with a first-fit policy.
//!
//! The pool keeps a **block directory**, an offset-ordered chain of records
//! that partitions the buffer into contiguous allocated and free ranges.
//! Allocation splits the first free record that fits; freeing merges the
//! block with free neighbours. Callers address blocks through
//! [`BlockHandle`]s, which go stale as soon as the block is freed.
//!
//! ## Quick Start
//!
//! ```rust
//! use mempool::prelude::*;
//!
//! let pool = MemoryPool::new();
//! pool.init(1024)?;
//!
//! let a = pool.alloc(64)?;
//! let a = pool.resize(a, 128)?;
//! pool.free(a)?;
//!
//! pool.check_invariants()?;
//! println!("{}", pool.stats()?);
//! # Ok::<(), PoolError>(())
//! ```
//!
//! ## Features
//!
//! - `serde` (default): `Serialize`/`Deserialize` for [`PoolConfig`]
//!
//! ## Architecture
//!
//! - [`MemoryPool`]: locked façade with an `Uninitialized → Ready → Closed`
//!   lifecycle
//! - `allocator`: unlocked first-fit core (split, coalesce, resize)
//! - `directory`: arena-backed record chain
//! - [`global()`]: optional process-wide pool

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod global;
pub mod handle;
pub mod pool;
pub mod stats;

mod allocator;
mod directory;

pub use crate::config::{CoalescePolicy, PoolConfig};
pub use crate::directory::BlockInfo;
pub use crate::error::{PoolError, PoolResult, Result};
pub use crate::global::{configure_global, global};
pub use crate::handle::BlockHandle;
pub use crate::pool::{MemoryPool, PoolState};
pub use crate::stats::PoolStats;

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::config::{CoalescePolicy, PoolConfig};
    pub use crate::directory::BlockInfo;
    pub use crate::error::{PoolError, PoolResult};
    pub use crate::handle::BlockHandle;
    pub use crate::pool::{MemoryPool, PoolState};
    pub use crate::stats::PoolStats;
}
