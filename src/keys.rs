use crate::QueryError;
use crate::WatchKey;

const CONFIG_LEAF: &str = "config";
const CONTROL_LEAF: &str = "control";

/// Store paths of the keys that belong to one logical service.
///
/// Keys live under `<prefix>/<service>/`, e.g. `kv-watch/billing/config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceKeys {
    service_name: String,
    config: WatchKey,
    control: WatchKey,
}

impl ServiceKeys {
    pub fn new(
        prefix: impl Into<String>,
        service_name: impl Into<String>,
    ) -> std::result::Result<Self, QueryError> {
        let prefix = prefix.into();
        let service_name = service_name.into();

        if service_name.trim().is_empty() || service_name.contains('/') {
            return Err(QueryError::InvalidKey(format!(
                "service name '{service_name}' cannot be used in a key path"
            )));
        }

        let base = match prefix.trim_matches('/') {
            "" => service_name.clone(),
            p => format!("{p}/{service_name}"),
        };

        Ok(Self {
            config: WatchKey::new(format!("{base}/{CONFIG_LEAF}"))?,
            control: WatchKey::new(format!("{base}/{CONTROL_LEAF}"))?,
            service_name,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Key holding the service's configuration document.
    pub fn config(&self) -> WatchKey {
        self.config.clone()
    }

    /// Key holding the service's control document.
    pub fn control(&self) -> WatchKey {
        self.control.clone()
    }
}
