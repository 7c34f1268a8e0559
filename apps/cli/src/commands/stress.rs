//! `mempool stress` - concurrent random workload.

use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use mempool::{BlockHandle, MemoryPool, PoolConfig, PoolError};
use rand::Rng;

const MAX_BLOCK: usize = 256;
const MAX_HELD: usize = 32;

pub fn run(config: PoolConfig, size: usize, threads: usize, iterations: usize) -> Result<()> {
    let pool = Arc::new(MemoryPool::with_config(config).context("invalid pool config")?);
    pool.init(size).context("failed to initialize pool")?;

    let workers: Vec<_> = (0..threads)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || work(&pool, worker, iterations))
        })
        .collect();

    let mut failures = 0usize;
    for worker in workers {
        failures += worker
            .join()
            .map_err(|_| anyhow!("stress worker panicked"))??;
    }

    pool.check_invariants().context("pool invariants violated")?;
    let stats = pool.deinit()?;
    println!("threads: {threads}, iterations: {iterations}");
    println!("retryable failures: {failures}");
    println!("invariants: ok");
    println!("{stats}");
    Ok(())
}

/// Random alloc/resize/free loop; returns the number of allocation failures
fn work(pool: &MemoryPool, worker: usize, iterations: usize) -> Result<usize, PoolError> {
    let mut rng = rand::rng();
    let mut held: Vec<BlockHandle> = Vec::new();
    let mut failures = 0;

    for _ in 0..iterations {
        let roll = rng.random_range(0..10);
        let result = if roll < 5 || held.is_empty() {
            pool.alloc(rng.random_range(0..=MAX_BLOCK))
                .map(|handle| held.push(handle))
        } else if roll < 7 {
            let slot = rng.random_range(0..held.len());
            pool.resize(held[slot], rng.random_range(0..=2 * MAX_BLOCK))
                .map(|handle| held[slot] = handle)
        } else {
            let handle = held.swap_remove(rng.random_range(0..held.len()));
            pool.free(handle)
        };

        match result {
            Ok(()) => {}
            Err(error) if error.is_retryable() => failures += 1,
            Err(error) => return Err(error),
        }

        if held.len() > MAX_HELD {
            pool.free(held.swap_remove(0))?;
        }
    }

    for handle in held {
        pool.free(handle)?;
    }
    tracing::debug!(worker, failures, "stress worker finished");
    Ok(failures)
}
