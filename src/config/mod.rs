//! Configuration management for the watch engine.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`WATCH__` prefix)
//! - Component-wise validation
mod client;
mod retry;
mod service;
mod watch;
pub use client::*;
pub use retry::*;
pub use service::*;
pub use watch::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

const ENV_PREFIX: &str = "WATCH";

/// Main configuration container for the watch engine
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct WatchEngineConfig {
    /// Store connection parameters
    #[serde(default)]
    pub client: ClientConfig,
    /// Long-poll and delivery parameters
    #[serde(default)]
    pub watch: WatchConfig,
    /// Retry delays after failed queries
    #[serde(default)]
    pub backoff: BackoffPolicy,
    /// Identity of the service whose keys are watched
    #[serde(default)]
    pub service: ServiceConfig,
}

impl Debug for WatchEngineConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WatchEngineConfig")
            .field("endpoint", &self.client.endpoint)
            .field("service", &self.service.name)
            .field("watch", &self.watch)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl WatchEngineConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `WATCH__` prefix
    ///
    /// Callers must call [`validate()`](Self::validate) before using the result.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("WATCH__SERVICE__NAME", "billing");
    /// let cfg = WatchEngineConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every subsystem and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.client.validate()?;
        self.watch.validate()?;
        self.backoff.validate()?;
        self.service.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
