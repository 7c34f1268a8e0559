//! Standalone error types for mempool
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;

use crate::handle::BlockHandle;

// ============================================================================
// Main Error Type
// ============================================================================

/// Memory pool errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // --- Allocation Errors ---
    #[error("Pool allocation failed: requested {requested} bytes, largest free block {largest_free}")]
    AllocationFailed { requested: usize, largest_free: usize },

    // --- Handle Errors ---
    #[error("Block not found for handle {handle}")]
    NotFound { handle: BlockHandle },

    #[error("Access out of bounds: {len} bytes at offset {offset} in a {size}-byte block")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    // --- Lifecycle Errors ---
    #[error("Pool is not initialized")]
    NotInitialized,

    #[error("Pool is already initialized")]
    AlreadyInitialized,

    #[error("Pool has been closed")]
    AlreadyClosed,

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Integrity Errors ---
    #[error("Block directory corruption: {details}")]
    Corruption { details: String },
}

impl PoolError {
    /// Check if error is retryable
    ///
    /// Only allocation failures can succeed later, once other blocks are freed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "POOL:ALLOC:FAILED",
            Self::NotFound { .. } => "POOL:HANDLE:NOT_FOUND",
            Self::OutOfBounds { .. } => "POOL:HANDLE:BOUNDS",
            Self::NotInitialized => "POOL:STATE:UNINIT",
            Self::AlreadyInitialized => "POOL:STATE:INIT",
            Self::AlreadyClosed => "POOL:STATE:CLOSED",
            Self::InvalidConfig { .. } => "POOL:CONFIG:INVALID",
            Self::Corruption { .. } => "POOL:SYSTEM:CORRUPTION",
        }
    }

    /// Check if this error comes from using the pool outside its `Ready` state
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::AlreadyInitialized | Self::AlreadyClosed
        )
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation failed error
    pub fn allocation_failed(requested: usize, largest_free: usize) -> Self {
        tracing::warn!(requested, largest_free, "pool allocation failed");

        Self::AllocationFailed {
            requested,
            largest_free,
        }
    }

    /// Create not found error for a stale or foreign handle
    pub fn not_found(handle: BlockHandle) -> Self {
        tracing::warn!(%handle, "rejected unknown block handle");

        Self::NotFound { handle }
    }

    /// Create out of bounds error
    #[must_use]
    pub fn out_of_bounds(offset: usize, len: usize, size: usize) -> Self {
        Self::OutOfBounds { offset, len, size }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create directory corruption error
    pub fn corruption(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::error!(%details, "block directory corruption");

        Self::Corruption { details }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for pool operations
pub type PoolResult<T> = core::result::Result<T, PoolError>;

/// Generic result type alias
pub type Result<T> = PoolResult<T>;

// ============================================================================
// Tests
// ============================================================================
