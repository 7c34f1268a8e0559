//! Pool configuration

use crate::error::{PoolError, PoolResult};

/// How a freed block is merged with its free neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CoalescePolicy {
    /// Merge only with the immediate successor
    Forward,
    /// Merge with the immediate successor, then with the immediate predecessor
    #[default]
    Bidirectional,
}

/// Configuration for a memory pool
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Neighbour merging performed on free
    pub coalesce: CoalescePolicy,

    /// Keep a zero-length free record after an exact-size allocation
    pub record_empty_remainder: bool,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for newly allocated memory (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for deallocated memory (for debugging)
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            coalesce: CoalescePolicy::Bidirectional,
            record_empty_remainder: true,
            track_stats: true,
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl PoolConfig {
    /// Classic first-fit behaviour: forward-only merging with zero-length
    /// remainders kept and no fill patterns
    #[must_use]
    pub fn reference() -> Self {
        Self {
            coalesce: CoalescePolicy::Forward,
            record_empty_remainder: true,
            track_stats: true,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Production configuration - optimized for low fragmentation
    #[must_use]
    pub fn production() -> Self {
        Self {
            coalesce: CoalescePolicy::Bidirectional,
            record_empty_remainder: false,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            coalesce: CoalescePolicy::Bidirectional,
            record_empty_remainder: true,
            track_stats: true,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Override the coalesce policy
    #[must_use = "builder methods must be chained or built"]
    pub fn with_coalesce(mut self, coalesce: CoalescePolicy) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// Override zero-length remainder handling
    #[must_use = "builder methods must be chained or built"]
    pub fn with_empty_remainder(mut self, record: bool) -> Self {
        self.record_empty_remainder = record;
        self
    }

    /// Checks the configuration for combinations the pool cannot honour
    pub fn validate(&self) -> PoolResult<()> {
        match (self.alloc_pattern, self.dealloc_pattern) {
            (Some(alloc), Some(dealloc)) if alloc == dealloc => Err(PoolError::invalid_config(
                "alloc_pattern and dealloc_pattern must differ",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_forward_only() {
        let config = PoolConfig::reference();
        assert_eq!(config.coalesce, CoalescePolicy::Forward);
        assert!(config.record_empty_remainder);
        assert!(config.alloc_pattern.is_none());
    }

    #[test]
    fn test_default_merges_both_ways() {
        assert_eq!(PoolConfig::default().coalesce, CoalescePolicy::Bidirectional);
    }

    #[test]
    fn test_builders() {
        let config = PoolConfig::production()
            .with_coalesce(CoalescePolicy::Forward)
            .with_empty_remainder(true);
        assert_eq!(config.coalesce, CoalescePolicy::Forward);
        assert!(config.record_empty_remainder);
    }

    #[test]
    fn test_validate_rejects_identical_patterns() {
        let config = PoolConfig {
            alloc_pattern: Some(0xAA),
            dealloc_pattern: Some(0xAA),
            ..PoolConfig::debug()
        };
        assert!(config.validate().is_err());
        assert!(PoolConfig::debug().validate().is_ok());
    }
}
