//! `mempool list` - build and print a pool-backed list.

use std::sync::Arc;

use anyhow::{Context, Result};
use mempool::{MemoryPool, PoolConfig};
use mempool_list::{ListError, PoolList};

pub fn run(
    config: PoolConfig,
    size: usize,
    insert: &[u16],
    delete: &[u16],
    search: Option<u16>,
) -> Result<()> {
    let pool = MemoryPool::with_config(config).context("invalid pool config")?;
    let list = PoolList::init(Arc::new(pool), size).context("failed to initialize list")?;

    for &value in insert {
        list.insert(value)
            .with_context(|| format!("failed to insert {value}"))?;
    }

    for &value in delete {
        match list.delete(value) {
            Ok(()) => {}
            Err(ListError::ValueNotFound { .. }) => println!("delete {value}: not in list"),
            Err(error) => return Err(error).with_context(|| format!("failed to delete {value}")),
        }
    }

    println!("list: {}", list.display()?);
    println!("count: {}", list.count()?);

    if let Some(value) = search {
        match list.search(value)? {
            Some(node) => println!("search {value}: found at {node}"),
            None => println!("search {value}: not in list"),
        }
    }

    let stats = list.cleanup().context("failed to clean up list")?;
    println!("{stats}");
    Ok(())
}
