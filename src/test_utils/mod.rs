//! Scripted store doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::BlockingKvClient;
use crate::KvClientFactory;
use crate::QueryError;
use crate::Snapshot;
use crate::WatchKey;

/// What the scripted store does with the next read.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Respond(std::result::Result<Snapshot, QueryError>),
    /// Respond after holding the long poll open for the given time.
    Delay(Duration, std::result::Result<Snapshot, QueryError>),
    /// Block until the read is abandoned.
    Hang,
}

impl Step {
    pub(crate) fn value(
        value: &str,
        index: u64,
    ) -> Self {
        Step::Respond(Ok(Snapshot::present(value, index)))
    }

    pub(crate) fn absent(index: u64) -> Self {
        Step::Respond(Ok(Snapshot::absent(index)))
    }

    pub(crate) fn fail(err: QueryError) -> Self {
        Step::Respond(Err(err))
    }

    pub(crate) fn transient() -> Self {
        Step::fail(QueryError::Transport("connection reset".into()))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ReadCall {
    pub(crate) key: WatchKey,
    pub(crate) wait_index: u64,
    pub(crate) wait: Duration,
    pub(crate) at: Instant,
}

/// In-memory [`BlockingKvClient`] replaying a fixed script of responses.
///
/// Once the script runs out every read hangs, which is what a real long poll
/// does when nothing changes.
#[derive(Debug, Default)]
pub(crate) struct ScriptedKvClient {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<ReadCall>>,
    completed: AtomicUsize,
    aborted: AtomicUsize,
}

impl ScriptedKvClient {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        })
    }

    pub(crate) fn calls(&self) -> Vec<ReadCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn completed_reads(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn aborted_reads(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Counts a read as aborted unless it was marked finished before drop.
struct InFlight<'a> {
    client: &'a ScriptedKvClient,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let counter = if self.finished {
            &self.client.completed
        } else {
            &self.client.aborted
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl BlockingKvClient for ScriptedKvClient {
    async fn read(
        &self,
        key: &WatchKey,
        wait_index: u64,
        wait: Duration,
    ) -> std::result::Result<Snapshot, QueryError> {
        self.calls.lock().unwrap().push(ReadCall {
            key: key.clone(),
            wait_index,
            wait,
            at: Instant::now(),
        });
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Hang);

        let mut in_flight = InFlight {
            client: self,
            finished: false,
        };

        let result = match step {
            Step::Respond(result) => result,
            Step::Delay(delay, result) => {
                tokio::time::sleep(delay).await;
                result
            }
            Step::Hang => std::future::pending().await,
        };

        in_flight.finished = true;
        result
    }
}

/// Hands out pre-built scripted clients, one per `build()` call.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFactory {
    clients: Mutex<VecDeque<Arc<ScriptedKvClient>>>,
    built: AtomicUsize,
    fail_with: Option<QueryError>,
}

impl ScriptedFactory {
    pub(crate) fn new(clients: impl IntoIterator<Item = Arc<ScriptedKvClient>>) -> Self {
        Self {
            clients: Mutex::new(clients.into_iter().collect()),
            ..Default::default()
        }
    }

    pub(crate) fn failing(err: QueryError) -> Self {
        Self {
            fail_with: Some(err),
            ..Default::default()
        }
    }

    pub(crate) fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

/// Shares a scripted client so tests keep a handle after the engine owns it.
#[derive(Debug, Clone)]
pub(crate) struct SharedClient(pub(crate) Arc<ScriptedKvClient>);

#[async_trait::async_trait]
impl BlockingKvClient for SharedClient {
    async fn read(
        &self,
        key: &WatchKey,
        wait_index: u64,
        wait: Duration,
    ) -> std::result::Result<Snapshot, QueryError> {
        self.0.read(key, wait_index, wait).await
    }
}

impl KvClientFactory for ScriptedFactory {
    type Client = SharedClient;

    fn build(&self) -> std::result::Result<SharedClient, QueryError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.built.fetch_add(1, Ordering::SeqCst);
        let client = self
            .clients
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedKvClient::new([]));
        Ok(SharedClient(client))
    }
}
