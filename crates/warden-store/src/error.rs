//! Store errors

use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record failed to serialize or deserialize
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value is not in the expected shape (e.g. a non-numeric counter)
    #[error("corrupt value at key {0}")]
    Corrupt(String),

    /// The backing store is unreachable or returned a failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
