//! Crate-wide error type.
//!
//! One enum covers every failure mode named in the error taxonomy: invalid
//! argument, duplicate key, not found, and the I/O and serialization
//! failures the storage collaborator can surface. Storage-layer update
//! failures are *not* represented here, per the write coordinator's
//! contract: those are swallowed and reported through the result types
//! instead of propagated as errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlatDocError>;

#[derive(Debug, Error)]
pub enum FlatDocError {
    /// A query document, sort specifier, or insert payload had the wrong shape.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Same class of failure as `InvalidQuery`, raised for non-query inputs
    /// (e.g. `insert_one` given a JSON array instead of an object).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `_id` collision on insert.
    #[error("duplicate key: _id {0:?} already exists in collection {1:?}")]
    DuplicateKey(String, String),

    /// A delete or find_one-backed operation matched no document.
    #[error("not found")]
    NotFound,

    /// `Cursor::next` advanced past the end of the materialized sequence.
    #[error("cursor out of range")]
    CursorOutOfRange,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
