//! Push-style change streams over blocking key-value queries.
//!
//! Coordination stores such as Consul expose "read key K, block until its
//! change index exceeds I or a timeout elapses". This crate turns that
//! long-poll primitive into cancellable subscriptions:
//!
//! - [`watch()`] - start a watch on one key and get a [`Subscription`]
//! - [`WatchContext`] - per-service wiring with `watch_config()` / `watch_control()`
//! - [`BlockingKvClient`] - the store capability the engine consumes
//! - [`ConsulKvClient`] - HTTP implementation of that capability
//! - [`WatchEngineConfig`] - layered configuration (defaults, file, `WATCH__` env)

mod client;
mod config;
mod context;
mod errors;
mod keys;
mod watch;

pub use crate::client::*;
pub use crate::config::*;
pub use crate::context::*;
pub use crate::errors::*;
pub use crate::keys::*;
pub use crate::watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
