//! # Error Module
//!
//! Error types shared by every layer of Active Bean. Parsing and resolution
//! failures are programmer errors, `NotFound` is an expected outcome of a
//! lookup, and `Store` wraps anything the underlying record store reports.

use thiserror::Error;

// ============================================================================
// Store Errors
// ============================================================================

/// Failures reported by a [`Store`](crate::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQL driver rejected a query or a write.
    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    /// The store refused the operation for a reason of its own.
    #[error("store rejected the operation: {0}")]
    Rejected(String),

    /// The connection was closed with `Store::close`.
    #[error("store connection is closed")]
    Closed,
}

// ============================================================================
// Error Enum
// ============================================================================

/// The error type returned by Active Bean operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation name matches no registered verb prefix.
    #[error("unrecognized operation `{0}`")]
    UnrecognizedOperation(String),

    /// A field expression combines `_and_` and `_or_`.
    #[error("field expression `{0}` mixes `_and_` and `_or_`")]
    MixedCombinatorExpression(String),

    /// A field expression is empty or has an empty segment.
    #[error("invalid field expression `{0}`")]
    InvalidExpression(String),

    /// A field expression names a property the entity does not declare.
    #[error("entity `{entity}` has no property `{property}`")]
    UnknownProperty { entity: &'static str, property: String },

    /// `load_by` found no matching row.
    #[error("no `{table}` record matches `{predicate}`")]
    NotFound { table: String, predicate: String },

    /// A composite property value could not be encoded.
    #[error("failed to serialize property `{property}`: {source}")]
    Serialization {
        property: String,
        #[source]
        source: serde_json::Error,
    },

    /// The operation needs a bound record but none was loaded or dispensed.
    #[error("`{0}` requires a bound record, call load_by or upsert_by first")]
    Unbound(&'static str),

    /// An operation was called without the argument it needs.
    #[error("operation `{operation}` expects {expected}")]
    InvalidArgument { operation: String, expected: &'static str },

    /// The record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A cache mutex was poisoned by a panicking thread.
    #[error("cache lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns `true` for the expected "no matching row" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns `true` when the failure came from the record store.
    pub fn is_store(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Store(StoreError::Sql(err))
    }
}
