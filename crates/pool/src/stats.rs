//! Pool statistics
//!
//! Structural fields (sizes, block counts) are always computed from the block
//! directory. Operation counters only advance when
//! [`PoolConfig::track_stats`](crate::PoolConfig::track_stats) is enabled.

use core::fmt;

/// Operation counters kept by the allocator core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub(crate) allocation_count: usize,
    pub(crate) deallocation_count: usize,
    pub(crate) resize_count: usize,
    pub(crate) failed_allocations: usize,
    pub(crate) peak_used_bytes: usize,
}

/// Snapshot of a pool's occupancy and activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total pool size in bytes
    pub pool_size: usize,
    /// Bytes held by allocated blocks
    pub used_bytes: usize,
    /// Bytes held by free blocks
    pub free_bytes: usize,
    /// Size of the largest free block
    pub largest_free_block: usize,
    /// Number of records in the block directory
    pub block_count: usize,
    /// Number of free records, zero-length ones included
    pub free_block_count: usize,
    /// Successful allocations
    pub allocation_count: usize,
    /// Successful deallocations
    pub deallocation_count: usize,
    /// Resizes that moved a block
    pub resize_count: usize,
    /// Allocations (including resize growth) that found no fitting block
    pub failed_allocations: usize,
    /// Highest `used_bytes` observed
    pub peak_used_bytes: usize,
}

impl PoolStats {
    /// External fragmentation ratio (0.0 to 1.0)
    ///
    /// `1 - largest_free_block / free_bytes`; zero when the free space is a
    /// single block or there is none.
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - (self.largest_free_block as f64 / self.free_bytes as f64)
    }

    /// Fraction of the pool held by allocated blocks
    pub fn utilization(&self) -> f64 {
        if self.pool_size == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.pool_size as f64
    }

    /// Check if there are any live allocations
    pub fn has_active_allocations(&self) -> bool {
        self.used_bytes > 0 || self.block_count > self.free_block_count
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pool Statistics:")?;
        writeln!(f, "  Pool size: {} bytes", self.pool_size)?;
        writeln!(
            f,
            "  Used: {} bytes ({:.1}%)",
            self.used_bytes,
            self.utilization() * 100.0
        )?;
        writeln!(f, "  Free: {} bytes", self.free_bytes)?;
        writeln!(f, "  Largest free block: {} bytes", self.largest_free_block)?;
        writeln!(
            f,
            "  Blocks: {} ({} free)",
            self.block_count, self.free_block_count
        )?;
        writeln!(f, "  Fragmentation: {:.1}%", self.fragmentation() * 100.0)?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Deallocations: {}", self.deallocation_count)?;
        writeln!(f, "  Resizes: {}", self.resize_count)?;
        writeln!(f, "  Failed allocations: {}", self.failed_allocations)?;
        write!(f, "  Peak used: {} bytes", self.peak_used_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragmentation_single_free_block() {
        let stats = PoolStats {
            pool_size: 100,
            free_bytes: 60,
            largest_free_block: 60,
            ..Default::default()
        };
        assert_eq!(stats.fragmentation(), 0.0);
    }

    #[test]
    fn test_fragmentation_split_free_space() {
        let stats = PoolStats {
            pool_size: 100,
            free_bytes: 80,
            largest_free_block: 20,
            ..Default::default()
        };
        assert!((stats.fragmentation() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_utilization_of_empty_stats() {
        assert_eq!(PoolStats::default().utilization(), 0.0);
    }

    #[test]
    fn test_display_lists_counters() {
        let stats = PoolStats {
            pool_size: 1024,
            used_bytes: 64,
            allocation_count: 3,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Pool size: 1024 bytes"));
        assert!(text.contains("Allocations: 3"));
    }
}
