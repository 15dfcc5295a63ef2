use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Identity of the logical service whose `config` and `control` keys are watched
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Logical service name, shared by every instance of the service
    #[serde(default)]
    pub name: String,

    /// Instance identifier; falls back to `name` when unset
    #[serde(default)]
    pub id: Option<String>,

    /// Root under which service keys live
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: None,
            key_prefix: default_key_prefix(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "service name must not be empty".into(),
            )));
        }

        if self.name.contains('/') {
            return Err(Error::Config(ConfigError::Message(format!(
                "service name must not contain '/', got '{}'",
                self.name
            ))));
        }

        Ok(())
    }
}

pub(crate) fn default_key_prefix() -> String {
    "kv-watch".to_string()
}
