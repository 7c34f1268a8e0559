//! # mempool-list
//!
//! A singly linked list of `u16` values whose nodes are allocated from a
//! [`mempool::MemoryPool`] instead of the global allocator.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mempool::MemoryPool;
//! use mempool_list::PoolList;
//!
//! let list = PoolList::init(Arc::new(MemoryPool::new()), 1024)?;
//! list.insert(10)?;
//! let twenty = list.insert(20)?;
//! list.insert_before(twenty, 15)?;
//!
//! assert_eq!(list.display()?, "[10, 15, 20]");
//! list.cleanup()?;
//! # Ok::<(), mempool_list::ListError>(())
//! ```

#![warn(rust_2018_idioms)]

pub mod error;
pub mod list;
pub mod node;

pub use crate::error::{ListError, ListResult};
pub use crate::list::PoolList;
pub use crate::node::{NODE_SIZE, NodeRef};
