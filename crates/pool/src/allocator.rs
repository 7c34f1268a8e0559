//! Unlocked allocator core
//!
//! Nothing here locks: the caller already holds the pool lock.
//! [`MemoryPool`](crate::MemoryPool) is the only caller. `resize` composes the
//! two primitives below directly instead of going back through the locked
//! façade.
//!
//! ## Primitives
//!
//! - [`PoolCore::find_and_split`]: first-fit scan in offset order, then split
//!   the match into an allocated prefix and a free remainder
//! - [`PoolCore::mark_free_and_merge`]: flag a record free and fold free
//!   neighbours into it according to the [`CoalescePolicy`]

use crate::config::{CoalescePolicy, PoolConfig};
use crate::directory::{BlockDirectory, BlockInfo};
use crate::error::{PoolError, PoolResult};
use crate::handle::BlockHandle;
use crate::stats::{Counters, PoolStats};

/// Pool buffer plus the directory that partitions it
#[derive(Debug)]
pub(crate) struct PoolCore {
    buffer: Box<[u8]>,
    directory: BlockDirectory,
    config: PoolConfig,
    used_bytes: usize,
    counters: Counters,
}

impl PoolCore {
    /// Allocates the pool buffer and one free record covering it
    pub(crate) fn new(size: usize, config: PoolConfig) -> Self {
        Self {
            buffer: vec![0u8; size].into_boxed_slice(),
            directory: BlockDirectory::new(size),
            config,
            used_bytes: 0,
            counters: Counters::default(),
        }
    }

    #[inline]
    pub(crate) fn pool_size(&self) -> usize {
        self.buffer.len()
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Claims the first free record of at least `size` bytes
    ///
    /// Returns the index of the claimed record, or `None` when nothing fits.
    pub(crate) fn find_and_split(&mut self, size: usize) -> Option<u32> {
        let index = self
            .directory
            .iter()
            .find(|(_, record)| record.free && record.size >= size)
            .map(|(index, _)| index)?;

        let record = self.directory.get_mut(index)?;
        record.free = false;
        let offset = record.offset;
        let remainder = record.size - size;

        if remainder > 0 || self.config.record_empty_remainder {
            record.size = size;
            self.directory
                .insert_after(index, offset + size, remainder, true);
            tracing::trace!(offset, size, remainder, "split block");
        }

        let claimed = self.directory.get(index).map_or(size, |record| record.size);
        self.used_bytes += claimed;
        if self.config.track_stats {
            self.counters.peak_used_bytes = self.counters.peak_used_bytes.max(self.used_bytes);
        }
        if let Some(pattern) = self.config.alloc_pattern {
            self.buffer[offset..offset + claimed].fill(pattern);
        }
        Some(index)
    }

    /// Frees the allocated record at `index` and coalesces it
    ///
    /// Returns the index of the record that now holds the freed range, which
    /// differs from `index` when the block was absorbed by its predecessor.
    pub(crate) fn mark_free_and_merge(&mut self, index: u32) -> u32 {
        let Some(record) = self.directory.get_mut(index) else {
            return index;
        };
        record.free = true;
        let (offset, size, next, prev) = (record.offset, record.size, record.next, record.prev);

        self.used_bytes -= size;
        if let Some(pattern) = self.config.dealloc_pattern {
            self.buffer[offset..offset + size].fill(pattern);
        }
        self.directory.retire_handle(index);

        if let Some(next) = next.filter(|&next| self.is_free(next)) {
            if let Some(absorbed) = self.directory.remove(next) {
                if let Some(record) = self.directory.get_mut(index) {
                    record.size += absorbed.size;
                }
                tracing::trace!(offset, absorbed = absorbed.size, "merged with successor");
            }
        }

        if self.config.coalesce == CoalescePolicy::Bidirectional {
            if let Some(prev) = prev.filter(|&prev| self.is_free(prev)) {
                if let Some(absorbed) = self.directory.remove(index) {
                    if let Some(record) = self.directory.get_mut(prev) {
                        record.size += absorbed.size;
                    }
                    tracing::trace!(offset, absorbed = absorbed.size, "merged into predecessor");
                    return prev;
                }
            }
        }

        index
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// First-fit allocation of `size` bytes
    pub(crate) fn allocate(&mut self, size: usize) -> PoolResult<BlockHandle> {
        let Some(index) = self.find_and_split(size) else {
            self.record_failure();
            return Err(PoolError::allocation_failed(size, self.largest_free_block()));
        };
        self.record_allocation();
        self.handle_of(index)
    }

    /// Returns an allocated block to the pool
    pub(crate) fn deallocate(&mut self, handle: BlockHandle) -> PoolResult<()> {
        let index = self.resolve_allocated(handle)?;
        self.mark_free_and_merge(index);
        if self.config.track_stats {
            self.counters.deallocation_count += 1;
        }
        Ok(())
    }

    /// Grows a block by moving it; never shrinks
    ///
    /// On allocation failure the block, its bytes and `handle` are left
    /// untouched.
    pub(crate) fn resize(&mut self, handle: BlockHandle, new_size: usize) -> PoolResult<BlockHandle> {
        let index = self.resolve_allocated(handle)?;
        let (old_offset, old_size) = self
            .directory
            .get(index)
            .map(|record| (record.offset, record.size))
            .ok_or_else(|| PoolError::not_found(handle))?;

        if old_size >= new_size {
            return Ok(handle);
        }

        let Some(new_index) = self.find_and_split(new_size) else {
            self.record_failure();
            return Err(PoolError::allocation_failed(
                new_size,
                self.largest_free_block(),
            ));
        };

        let new_offset = self
            .directory
            .get(new_index)
            .map(|record| record.offset)
            .ok_or_else(|| PoolError::corruption("claimed record vanished during resize"))?;
        self.buffer
            .copy_within(old_offset..old_offset + old_size, new_offset);
        self.mark_free_and_merge(index);

        if self.config.track_stats {
            self.counters.resize_count += 1;
        }
        tracing::trace!(old_offset, new_offset, old_size, new_size, "moved block");
        self.handle_of(new_index)
    }

    // ------------------------------------------------------------------
    // Block access
    // ------------------------------------------------------------------

    pub(crate) fn block(&self, handle: BlockHandle) -> PoolResult<BlockInfo> {
        let index = self.resolve_allocated(handle)?;
        self.directory
            .get(index)
            .map(BlockInfo::from)
            .ok_or_else(|| PoolError::not_found(handle))
    }

    pub(crate) fn bytes(&self, handle: BlockHandle) -> PoolResult<&[u8]> {
        let info = self.block(handle)?;
        Ok(&self.buffer[info.offset..info.offset + info.size])
    }

    pub(crate) fn bytes_mut(&mut self, handle: BlockHandle) -> PoolResult<&mut [u8]> {
        let info = self.block(handle)?;
        Ok(&mut self.buffer[info.offset..info.offset + info.size])
    }

    pub(crate) fn read_at(&self, handle: BlockHandle, offset: usize, len: usize) -> PoolResult<&[u8]> {
        let bytes = self.bytes(handle)?;
        let end = checked_end(offset, len, bytes.len())?;
        Ok(&bytes[offset..end])
    }

    pub(crate) fn write(&mut self, handle: BlockHandle, offset: usize, data: &[u8]) -> PoolResult<()> {
        let bytes = self.bytes_mut(handle)?;
        let end = checked_end(offset, data.len(), bytes.len())?;
        bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Directory snapshot in offset order
    pub(crate) fn blocks(&self) -> Vec<BlockInfo> {
        self.directory
            .iter()
            .map(|(_, record)| BlockInfo::from(record))
            .collect()
    }

    pub(crate) fn largest_free_block(&self) -> usize {
        self.directory
            .iter()
            .filter(|(_, record)| record.free)
            .map(|(_, record)| record.size)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            pool_size: self.pool_size(),
            used_bytes: self.used_bytes,
            block_count: self.directory.len(),
            allocation_count: self.counters.allocation_count,
            deallocation_count: self.counters.deallocation_count,
            resize_count: self.counters.resize_count,
            failed_allocations: self.counters.failed_allocations,
            peak_used_bytes: self.counters.peak_used_bytes,
            ..PoolStats::default()
        };
        for (_, record) in self.directory.iter().filter(|(_, record)| record.free) {
            stats.free_bytes += record.size;
            stats.free_block_count += 1;
            stats.largest_free_block = stats.largest_free_block.max(record.size);
        }
        stats
    }

    /// Checks directory structure and byte accounting
    pub(crate) fn check_invariants(&self) -> PoolResult<()> {
        self.directory
            .validate(self.pool_size())
            .map_err(PoolError::corruption)?;

        let allocated: usize = self
            .directory
            .iter()
            .filter(|(_, record)| !record.free)
            .map(|(_, record)| record.size)
            .sum();
        if allocated != self.used_bytes {
            return Err(PoolError::corruption(format!(
                "allocated records hold {allocated} bytes, accounting says {}",
                self.used_bytes
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn is_free(&self, index: u32) -> bool {
        self.directory.get(index).is_some_and(|record| record.free)
    }

    fn resolve_allocated(&self, handle: BlockHandle) -> PoolResult<u32> {
        self.directory
            .resolve(handle)
            .filter(|&index| !self.is_free(index))
            .ok_or_else(|| PoolError::not_found(handle))
    }

    fn handle_of(&self, index: u32) -> PoolResult<BlockHandle> {
        self.directory
            .handle(index)
            .ok_or_else(|| PoolError::corruption(format!("record #{index} has no live slot")))
    }

    fn record_allocation(&mut self) {
        if self.config.track_stats {
            self.counters.allocation_count += 1;
        }
    }

    fn record_failure(&mut self) {
        if self.config.track_stats {
            self.counters.failed_allocations += 1;
        }
    }
}

fn checked_end(offset: usize, len: usize, size: usize) -> PoolResult<usize> {
    offset
        .checked_add(len)
        .filter(|&end| end <= size)
        .ok_or_else(|| PoolError::out_of_bounds(offset, len, size))
}
