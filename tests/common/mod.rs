//! In-process fake of a Consul agent's KV endpoint with real blocking-query
//! semantics: a read with `index=N` is held open until the store's index
//! moves past `N` or `wait` elapses.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kv_watch::BackoffPolicy;
use kv_watch::WatchEngineConfig;
use tokio::sync::watch;
use warp::http::Response;
use warp::Filter;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct FakeConsul {
    entries: Mutex<HashMap<String, String>>,
    index_tx: watch::Sender<u64>,
    fail_next: AtomicUsize,
    requests: AtomicUsize,
}

impl FakeConsul {
    pub fn start() -> (Arc<Self>, SocketAddr) {
        let (index_tx, _) = watch::channel(1);
        let store = Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            index_tx,
            fail_next: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        });

        let shared = store.clone();
        let route = warp::path!("v1" / "kv" / ..)
            .and(warp::path::tail())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::any().map(move || shared.clone()))
            .and_then(handle_read);

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        (store, addr)
    }

    pub fn put(
        &self,
        key: &str,
        value: &str,
    ) {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
        self.bump();
    }

    pub fn delete(
        &self,
        key: &str,
    ) {
        self.entries.lock().unwrap().remove(key);
        self.bump();
    }

    /// Answers the next `n` reads with `500 No cluster leader`.
    pub fn fail_next(
        &self,
        n: usize,
    ) {
        self.fail_next.store(n, Ordering::SeqCst);
        // Release parked long polls so the outage is observed right away.
        self.bump();
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.index_tx.send_modify(|i| *i += 1);
    }
}

async fn handle_read(
    tail: warp::path::Tail,
    query: HashMap<String, String>,
    store: Arc<FakeConsul>,
) -> Result<Response<String>, Infallible> {
    store.requests.fetch_add(1, Ordering::SeqCst);

    let wait_index: u64 = query.get("index").and_then(|i| i.parse().ok()).unwrap_or(0);
    let wait = query
        .get("wait")
        .and_then(|w| w.strip_suffix("ms"))
        .and_then(|ms| ms.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(1));

    if wait_index > 0 {
        let mut rx = store.index_tx.subscribe();
        let _ = tokio::time::timeout(wait, rx.wait_for(|index| *index > wait_index)).await;
    }

    let outage = store
        .fail_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if outage {
        return Ok(Response::builder()
            .status(500)
            .body("No cluster leader".to_string())
            .unwrap());
    }

    let index = *store.index_tx.borrow();
    let value = store.entries.lock().unwrap().get(tail.as_str()).cloned();

    let response = Response::builder().header("X-Consul-Index", index.to_string());
    Ok(match value {
        None => response.status(404).body(String::new()).unwrap(),
        Some(value) => {
            let body = format!(
                r#"[{{"Key":"{}","Value":"{}","ModifyIndex":{}}}]"#,
                tail.as_str(),
                STANDARD.encode(value),
                index
            );
            response.status(200).body(body).unwrap()
        }
    })
}

/// Engine configuration pointing at `addr`, tuned for fast tests.
pub fn engine_config(
    addr: SocketAddr,
    service: &str,
) -> WatchEngineConfig {
    let mut config = WatchEngineConfig::default();
    config.client.endpoint = format!("http://{addr}");
    config.client.request_timeout_slack_ms = 2000;
    config.watch.wait_time_ms = 1000;
    config.backoff = BackoffPolicy {
        base_delay_ms: 20,
        max_delay_ms: 200,
        multiplier: 2,
    };
    config.service.name = service.to_string();
    config
}
