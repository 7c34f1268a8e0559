//! `mempool inspect` - dump the block directory.

use anyhow::{Context, Result, bail};
use mempool::{MemoryPool, PoolConfig};

pub fn run(config: PoolConfig, size: usize, alloc: &[usize], free: &[usize]) -> Result<()> {
    let pool = MemoryPool::with_config(config).context("invalid pool config")?;
    pool.init(size).context("failed to initialize pool")?;

    let mut handles = Vec::with_capacity(alloc.len());
    for (position, &bytes) in alloc.iter().enumerate() {
        match pool.alloc(bytes) {
            Ok(handle) => handles.push(Some(handle)),
            Err(error) => {
                println!("alloc #{position} ({bytes} bytes): {error}");
                handles.push(None);
            }
        }
    }

    for &position in free {
        let Some(slot) = handles.get_mut(position) else {
            bail!("--free {position}: only {} allocations were made", alloc.len());
        };
        if let Some(handle) = slot.take() {
            pool.free(handle)
                .with_context(|| format!("failed to free allocation #{position}"))?;
        }
    }

    println!("{:>8}  {:>8}  state", "offset", "size");
    for block in pool.blocks()? {
        let state = if block.free { "free" } else { "used" };
        println!("{:>8}  {:>8}  {state}", block.offset, block.size);
    }
    println!();
    println!("{}", pool.stats()?);

    pool.check_invariants()?;
    pool.deinit()?;
    Ok(())
}
