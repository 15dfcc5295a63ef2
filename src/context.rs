//! Per-service wiring of the watch engine.
//!
//! A [`WatchContext`] bundles everything a service instance needs to follow
//! its coordination keys: the client factory, the service identity, the key
//! naming, and the watch/backoff parameters. Each named watch gets a client
//! of its own from the factory.

use std::sync::Arc;

use tracing::info;

use crate::watch;
use crate::BackoffPolicy;
use crate::ConsulClientBuilder;
use crate::KvClientFactory;
use crate::Result;
use crate::ServiceConfig;
use crate::ServiceKeys;
use crate::Subscription;
use crate::WatchConfig;
use crate::WatchEngineConfig;
use crate::WatchKey;

pub struct WatchContext<F>
where
    F: KvClientFactory,
{
    factory: F,
    primary_client: Arc<F::Client>,
    keys: ServiceKeys,
    service_name: String,
    service_id: String,
    watch: WatchConfig,
    backoff: BackoffPolicy,
}

impl WatchContext<ConsulClientBuilder> {
    /// Builds a context talking to the store described by a validated
    /// [`WatchEngineConfig`].
    pub fn from_config(config: WatchEngineConfig) -> Result<Self> {
        let WatchEngineConfig {
            client,
            watch,
            backoff,
            service,
        } = config;
        Self::new(ConsulClientBuilder::new(client), &service, watch, backoff)
    }
}

impl<F> WatchContext<F>
where
    F: KvClientFactory,
{
    /// Fails when the factory cannot build a client or the service name
    /// cannot be turned into key paths.
    pub fn new(
        factory: F,
        service: &ServiceConfig,
        watch: WatchConfig,
        backoff: BackoffPolicy,
    ) -> Result<Self> {
        let keys = ServiceKeys::new(service.key_prefix.clone(), service.name.clone())?;
        let primary_client = Arc::new(factory.build()?);
        let service_id = service.id.clone().unwrap_or_else(|| service.name.clone());

        info!(service = %service.name, %service_id, "watch context ready");

        Ok(Self {
            factory,
            primary_client,
            keys,
            service_name: service.name.clone(),
            service_id,
            watch,
            backoff,
        })
    }

    /// Client built at construction, for callers that issue their own reads.
    pub fn primary_client(&self) -> Arc<F::Client> {
        self.primary_client.clone()
    }

    pub fn client_factory(&self) -> &F {
        &self.factory
    }

    pub fn keys(&self) -> &ServiceKeys {
        &self.keys
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Follows the service's `config` key.
    pub fn watch_config(&self) -> Result<Subscription> {
        self.watch_key(self.keys.config())
    }

    /// Follows the service's `control` key.
    pub fn watch_control(&self) -> Result<Subscription> {
        self.watch_key(self.keys.control())
    }

    /// Follows an arbitrary key with a freshly built client.
    pub fn watch_key(
        &self,
        key: WatchKey,
    ) -> Result<Subscription> {
        let client = Arc::new(self.factory.build()?);
        Ok(watch(client, key, &self.watch, self.backoff))
    }
}
