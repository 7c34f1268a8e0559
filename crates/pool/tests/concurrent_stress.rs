//! Concurrent stress test for the memory pool.
//!
//! Several threads allocate, fill, verify, resize and free blocks on one
//! shared pool. Every block must keep the bytes its owner wrote, and the
//! directory must be intact once all threads finish.

use std::sync::Arc;
use std::thread;

use mempool::{MemoryPool, PoolConfig};

const THREADS: usize = 8;
const ITERATIONS: usize = 500;

#[test]
fn threads_keep_their_bytes() {
    let pool = Arc::new(MemoryPool::with_config(PoolConfig::debug()).unwrap());
    pool.init(64 * 1024).unwrap();

    let workers: Vec<_> = (0..THREADS)
        .map(|id| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let tag = id as u8 + 1;
                let mut held = Vec::new();

                for i in 0..ITERATIONS {
                    let size = 8 + (i * 7 + id * 13) % 120;
                    if let Ok(handle) = pool.alloc(size) {
                        pool.write(handle, 0, &vec![tag; size]).unwrap();
                        held.push((handle, size));
                    }

                    if i % 5 == 0 {
                        if let Some((handle, size)) = held.pop() {
                            let grown = pool.resize(handle, size * 2).unwrap_or(handle);
                            assert_eq!(pool.read_at(grown, 0, size).unwrap(), vec![tag; size]);
                            held.push((grown, size));
                        }
                    }

                    if held.len() > 8 {
                        let (handle, size) = held.remove(0);
                        assert_eq!(pool.read_at(handle, 0, size).unwrap(), vec![tag; size]);
                        pool.free(handle).unwrap();
                    }
                }

                for (handle, _) in held {
                    pool.free(handle).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    pool.check_invariants().unwrap();
    let stats = pool.stats().unwrap();
    assert_eq!(stats.used_bytes, 0);
    assert_eq!(stats.allocation_count, stats.deallocation_count);
    // Bidirectional merging folds everything back into one block.
    assert_eq!(pool.blocks().unwrap().len(), 1);
}

#[test]
fn concurrent_init_succeeds_once() {
    let pool = Arc::new(MemoryPool::new());

    let results: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.init(4096).is_ok())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|&&ok| ok).count(), 1);
    assert!(pool.is_initialized());
}
