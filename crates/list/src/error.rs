//! List errors

use mempool::PoolError;
use thiserror::Error;

use crate::node::NodeRef;

/// Errors returned by [`PoolList`](crate::PoolList)
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// The backing pool rejected an operation
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Node {node} is not part of this list")]
    NodeNotFound { node: NodeRef },

    #[error("No node holds value {value}")]
    ValueNotFound { value: u16 },

    #[error("List has been cleaned up")]
    Closed,
}

impl ListError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Pool(error) => error.is_retryable(),
            _ => false,
        }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pool(error) => error.code(),
            Self::NodeNotFound { .. } => "LIST:NODE:NOT_FOUND",
            Self::ValueNotFound { .. } => "LIST:VALUE:NOT_FOUND",
            Self::Closed => "LIST:STATE:CLOSED",
        }
    }
}

/// Result type for list operations
pub type ListResult<T> = Result<T, ListError>;

#[cfg(test)]
mod tests {
    use mempool::BlockHandle;

    use super::*;

    #[test]
    fn test_pool_errors_pass_through() {
        let error = ListError::from(PoolError::allocation_failed(16, 8));
        assert!(error.is_retryable());
        assert_eq!(error.code(), "POOL:ALLOC:FAILED");
        assert!(error.to_string().contains("16"));
    }

    #[test]
    fn test_list_error_codes() {
        let node = NodeRef::from(BlockHandle::new(1, 0));
        assert_eq!(ListError::NodeNotFound { node }.code(), "LIST:NODE:NOT_FOUND");
        assert_eq!(ListError::ValueNotFound { value: 9 }.code(), "LIST:VALUE:NOT_FOUND");
        assert!(!ListError::Closed.is_retryable());
    }
}
