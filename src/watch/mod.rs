//! Long-poll watch engine
//!
//! Turns successive blocking reads of one key into a push-style stream of
//! change notifications.
//!
//! ```text
//! ┌──────────────┐  read(key, last_index, wait)  ┌──────────────────┐
//! │ Watch task   │ ────────────────────────────▶ │ BlockingKvClient │
//! │  query loop  │ ◀──────────────────────────── │                  │
//! └──────┬───────┘      Snapshot / QueryError    └──────────────────┘
//!        │ CursorTracker: index advanced and value differs?
//!        ▼
//! ┌──────────────┐
//! │ mpsc channel │ (bounded, one consumer)
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │ Subscription │ next() / Stream
//! └──────────────┘
//! ```
//!
//! # Lifecycle
//!
//! `Idle → Querying → {Emitting | WaitingBackoff} → Querying → … → Cancelled`.
//! Transient failures never end a watch. Fatal failures (invalid key,
//! rejected credentials, unusable client) are delivered once as an error
//! item, after which the subscription yields `None`.
//!
//! # Suspension points
//!
//! A watch task only suspends inside the blocking read and during a backoff
//! delay. Both race against the subscription's cancellation token, so
//! cancelling aborts an in-flight long poll instead of waiting for its
//! server-side timeout.
//!
//! # Example
//!
//! ```ignore
//! let client = Arc::new(ConsulClientBuilder::new(ClientConfig::default()).build()?);
//! let key = WatchKey::new("kv-watch/billing/config")?;
//! let mut sub = watch(client, key, &WatchConfig::default(), BackoffPolicy::default());
//!
//! while let Some(item) = sub.next().await {
//!     match item? {
//!         Some(value) => println!("config is now {value}"),
//!         None => println!("config deleted"),
//!     }
//! }
//! ```

mod backoff;
mod cursor;
mod engine;
mod query_loop;
mod subscription;

pub use backoff::*;
pub use cursor::*;
pub use engine::*;
pub use query_loop::*;
pub use subscription::*;

#[cfg(test)]
mod backoff_test;
