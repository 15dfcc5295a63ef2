use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Connection parameters for the coordination store's HTTP API
///
/// The per-request deadline of a blocking read is the server-side wait time
/// plus `request_timeout_slack_ms`, so that a long poll the store answers on
/// time is never cut short by the client.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the store agent, e.g. `http://127.0.0.1:8500`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Extra time granted on top of the server-side wait, in milliseconds
    #[serde(default = "default_request_timeout_slack_ms")]
    pub request_timeout_slack_ms: u64,

    /// ACL token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Datacenter to query instead of the agent's own
    #[serde(default)]
    pub datacenter: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_slack_ms: default_request_timeout_slack_ms(),
            token: None,
            datacenter: None,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout_slack(&self) -> Duration {
        Duration::from_millis(self.request_timeout_slack_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(Error::Config(ConfigError::Message(format!(
                "client endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            ))));
        }

        if self.connect_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "client connect_timeout_ms must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8500".to_string()
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_request_timeout_slack_ms() -> u64 {
    5000
}
