//! Watch Engine Error Hierarchy
//!
//! Errors are split by who can act on them:
//! - [`QueryError`] is produced at the store boundary by a
//!   [`BlockingKvClient`](crate::BlockingKvClient) read. Most variants are
//!   transient and are absorbed by the watch task with backoff.
//! - [`Error`] is what callers of this crate see: configuration problems,
//!   fatal query failures that ended a subscription, and setup failures.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store query failures that could not be recovered locally
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures outside the query path
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Failure of a single blocking read against the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Connection refused, reset, or dropped mid-request
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The request outlived its client-side deadline
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The store answered but cannot serve reads right now (no leader, 5xx)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store returned data that cannot be interpreted
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The watched key is rejected by the store
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Credentials are missing or insufficient
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The client cannot issue requests at all (bad endpoint, TLS setup)
    #[error("Client unusable: {0}")]
    ClientUnusable(String),
}

impl QueryError {
    /// Whether this failure should end the subscription instead of being
    /// retried with backoff.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidKey(_) | QueryError::Unauthorized(_) | QueryError::ClientUnusable(_)
        )
    }
}
