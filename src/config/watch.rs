//! Long-poll configuration
//!
//! ```toml
//! [watch]
//! wait_time_ms = 300000   # server-side blocking timeout
//! channel_capacity = 16   # buffered changes per subscriber
//! ```

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

const MIN_WAIT_MS: u64 = 1_000;
const MAX_WAIT_MS: u64 = 600_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// How long the store may hold a blocking read open, in milliseconds
    #[serde(default = "default_wait_time_ms")]
    pub wait_time_ms: u64,

    /// Capacity of the channel between a watch task and its subscriber
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            wait_time_ms: default_wait_time_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl WatchConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    pub fn validate(&self) -> Result<()> {
        // Stores cap blocking queries at 10 minutes; below 1s is a busy poll.
        if !(MIN_WAIT_MS..=MAX_WAIT_MS).contains(&self.wait_time_ms) {
            return Err(Error::Config(ConfigError::Message(format!(
                "watch wait_time_ms must be between {MIN_WAIT_MS} and {MAX_WAIT_MS}, got {}",
                self.wait_time_ms
            ))));
        }

        if self.channel_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "watch channel_capacity must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_wait_time_ms() -> u64 {
    300_000
}
fn default_channel_capacity() -> usize {
    16
}
