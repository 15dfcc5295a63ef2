//! Store boundary for the watch engine
//!
//! The engine never talks to a coordination store directly. It consumes the
//! [`BlockingKvClient`] capability, which performs one long-poll read, and
//! builds fresh clients through a [`KvClientFactory`] so that independent
//! watches never share client state.
//!
//! - [`ConsulKvClient`] - blocking reads against a Consul-style HTTP KV API
//! - [`ConsulClientBuilder`] - factory producing independent HTTP clients
//!
//! # Cancellation
//!
//! A read is aborted by dropping its future. Implementations must release
//! the underlying request when that happens instead of letting it run to its
//! server-side timeout.

mod consul;

pub use consul::*;


use std::fmt;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::QueryError;

/// Path of one entry in the coordination store.
///
/// Leading and trailing slashes are stripped; an empty path is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchKey(String);

impl WatchKey {
    pub fn new(path: impl Into<String>) -> std::result::Result<Self, QueryError> {
        let path = path.into();
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(QueryError::InvalidKey(format!("'{path}' names no key")));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(QueryError::InvalidKey(format!("'{path}' contains whitespace")));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WatchKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one successful read: the key's value, or `None` when the key
/// does not exist, paired with the store's change index at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub value: Option<String>,
    pub index: u64,
}

impl Snapshot {
    pub fn present(
        value: impl Into<String>,
        index: u64,
    ) -> Self {
        Self {
            value: Some(value.into()),
            index,
        }
    }

    pub fn absent(index: u64) -> Self {
        Self { value: None, index }
    }
}

/// Long-poll read capability of a coordination store.
///
/// Implementations must be safe for several simultaneous reads issued by
/// independent watches.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait BlockingKvClient: Send + Sync + 'static {
    /// Reads `key`, blocking server-side until its change index exceeds
    /// `wait_index` or `wait` elapses.
    ///
    /// A `wait_index` of 0 never blocks and returns the current state.
    async fn read(
        &self,
        key: &WatchKey,
        wait_index: u64,
        wait: Duration,
    ) -> std::result::Result<Snapshot, QueryError>;
}

/// Produces independent store clients sharing one connection configuration.
pub trait KvClientFactory: Send + Sync {
    type Client: BlockingKvClient;

    /// Fails with a fatal [`QueryError`] when the configuration cannot yield
    /// a usable client.
    fn build(&self) -> std::result::Result<Self::Client, QueryError>;
}
