use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::HeaderMap;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;
use tracing::instrument;

use super::BlockingKvClient;
use super::KvClientFactory;
use super::Snapshot;
use super::WatchKey;
use crate::ClientConfig;
use crate::QueryError;

pub(crate) const INDEX_HEADER: &str = "X-Consul-Index";
pub(crate) const TOKEN_HEADER: &str = "X-Consul-Token";

/// Builds independent [`ConsulKvClient`]s from one [`ClientConfig`]
///
/// Every call to [`build()`](KvClientFactory::build) creates a new HTTP
/// client with its own connection pool, so a stalled long poll on one watch
/// never holds a connection another watch needs.
#[derive(Debug, Clone)]
pub struct ConsulClientBuilder {
    config: ClientConfig,
}

impl ConsulClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Set the ACL token sent with every read
    pub fn token(
        mut self,
        token: impl Into<String>,
    ) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Query a datacenter other than the agent's own
    pub fn datacenter(
        mut self,
        datacenter: impl Into<String>,
    ) -> Self {
        self.config.datacenter = Some(datacenter.into());
        self
    }
}

impl KvClientFactory for ConsulClientBuilder {
    type Client = ConsulKvClient;

    fn build(&self) -> std::result::Result<ConsulKvClient, QueryError> {
        let base = Url::parse(&self.config.endpoint)
            .map_err(|e| QueryError::ClientUnusable(format!("endpoint '{}': {e}", self.config.endpoint)))?;

        let http = HttpClient::builder()
            .connect_timeout(self.config.connect_timeout())
            .build()
            .map_err(|e| QueryError::ClientUnusable(format!("failed to build HTTP client: {e}")))?;

        Ok(ConsulKvClient {
            http,
            base,
            config: self.config.clone(),
        })
    }
}

/// Blocking KV reads over the Consul HTTP API
///
/// `GET /v1/kv/<key>?index=<wait_index>&wait=<ms>ms`. The change index is
/// taken from the `X-Consul-Index` response header, which the agent sets on
/// both hits and misses.
#[derive(Debug, Clone)]
pub struct ConsulKvClient {
    http: HttpClient,
    base: Url,
    config: ClientConfig,
}

impl ConsulKvClient {
    /// `<endpoint>/v1/kv/<key>` with every key segment percent-encoded, so
    /// `?`, `#` and `%` stay part of the key path.
    pub(crate) fn kv_url(
        &self,
        key: &WatchKey,
    ) -> std::result::Result<Url, QueryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| QueryError::ClientUnusable(format!("endpoint '{}' cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(key.as_str().split('/'));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl BlockingKvClient for ConsulKvClient {
    #[instrument(skip(self, key), level = "debug", fields(key = %key))]
    async fn read(
        &self,
        key: &WatchKey,
        wait_index: u64,
        wait: Duration,
    ) -> std::result::Result<Snapshot, QueryError> {
        let deadline = wait + self.config.request_timeout_slack();

        let mut query = vec![
            ("index", wait_index.to_string()),
            ("wait", format!("{}ms", wait.as_millis())),
        ];
        if let Some(dc) = &self.config.datacenter {
            query.push(("dc", dc.clone()));
        }

        let mut request = self.http.get(self.kv_url(key)?).query(&query).timeout(deadline);
        if let Some(token) = &self.config.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| map_transport_error(e, deadline))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => {
                let index = parse_index_header(response.headers())?;
                debug!(index, "key absent");
                Ok(Snapshot::absent(index))
            }
            s if s.is_success() => {
                let index = parse_index_header(response.headers())?;
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| map_transport_error(e, deadline))?;
                let value = decode_kv_body(&body)?;
                debug!(index, bytes = body.len(), "key read");
                Ok(Snapshot { value, index })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let text = response.text().await.unwrap_or_default();
                Err(QueryError::Unauthorized(format!("{status}: {}", text.trim())))
            }
            StatusCode::BAD_REQUEST => {
                let text = response.text().await.unwrap_or_default();
                Err(QueryError::InvalidKey(format!("{key}: {}", text.trim())))
            }
            s if s.is_server_error() => {
                let text = response.text().await.unwrap_or_default();
                Err(QueryError::Unavailable(format!("{status}: {}", text.trim())))
            }
            other => Err(QueryError::Malformed(format!("unexpected status {other}"))),
        }
    }
}

fn map_transport_error(
    err: reqwest::Error,
    deadline: Duration,
) -> QueryError {
    if err.is_timeout() {
        QueryError::Timeout(deadline)
    } else if err.is_builder() {
        QueryError::ClientUnusable(err.to_string())
    } else if err.is_decode() {
        QueryError::Malformed(err.to_string())
    } else {
        QueryError::Transport(err.to_string())
    }
}

pub(crate) fn parse_index_header(headers: &HeaderMap) -> std::result::Result<u64, QueryError> {
    let raw = headers
        .get(INDEX_HEADER)
        .ok_or_else(|| QueryError::Malformed(format!("missing {INDEX_HEADER} header")))?;

    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| QueryError::Malformed(format!("unparsable {INDEX_HEADER} header: {raw:?}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvEntry {
    value: Option<String>,
}

/// Extracts the value from a KV read body.
///
/// A present key with a null value reads as an empty string; an empty
/// result list reads as absent.
pub(crate) fn decode_kv_body(body: &[u8]) -> std::result::Result<Option<String>, QueryError> {
    let entries: Vec<KvEntry> =
        serde_json::from_slice(body).map_err(|e| QueryError::Malformed(format!("invalid KV body: {e}")))?;

    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };

    let Some(encoded) = entry.value else {
        return Ok(Some(String::new()));
    };

    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| QueryError::Malformed(format!("value is not base64: {e}")))?;

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| QueryError::Malformed(format!("value is not UTF-8: {e}")))
}
