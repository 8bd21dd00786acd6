//! Storage failures.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by [`crate::Store`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record under the requested key.
    #[error("record not found")]
    NotFound,

    /// An insert-if-absent found the key taken.
    #[error("record already exists")]
    AlreadyExists,

    /// The record changed between read and write.
    #[error("conflicting update")]
    Conflict,

    /// RocksDB reported an error.
    #[error("database error: {0}")]
    Database(String),

    /// A value could not be CBOR encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}
