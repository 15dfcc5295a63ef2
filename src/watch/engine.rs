use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::Backoff;
use super::BlockingQueryLoop;
use super::Subscription;
use super::WatchEvent;
use super::WatchItem;
use crate::BackoffPolicy;
use crate::BlockingKvClient;
use crate::Error;
use crate::WatchConfig;
use crate::WatchKey;

/// Starts watching `key` and returns the subscription that receives its
/// changes.
///
/// The watch runs on its own Tokio task and must be called from within a
/// runtime. It issues one blocking read at a time, retries transient
/// failures with `backoff`, and stops when the subscription is cancelled or
/// dropped, or after delivering a fatal error.
///
/// `config` need not be validated; a `channel_capacity` of 0 is treated
/// as 1.
pub fn watch<C>(
    client: Arc<C>,
    key: WatchKey,
    config: &WatchConfig,
    backoff: BackoffPolicy,
) -> Subscription
where
    C: BlockingKvClient,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let token = CancellationToken::new();

    let query_loop = BlockingQueryLoop::new(client, key.clone(), config.wait_time());
    let task = tokio::spawn(run_watch(query_loop, Backoff::new(backoff), tx, token.clone()));

    Subscription::new(key, rx, token, task)
}

async fn run_watch<C>(
    mut query_loop: BlockingQueryLoop<C>,
    mut backoff: Backoff,
    tx: mpsc::Sender<WatchItem>,
    token: CancellationToken,
) where
    C: BlockingKvClient,
{
    let key = query_loop.key().clone();
    info!(%key, "watch started");

    loop {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            outcome = query_loop.run_cycle() => outcome,
        };

        match outcome {
            Ok(event) => {
                backoff.reset();

                let Some(WatchEvent::Value(value)) = event else {
                    continue;
                };
                debug!(%key, index = query_loop.cursor().last_index(), present = value.is_some(), "key changed");

                if !deliver(&tx, &token, Ok(value)).await {
                    break;
                }
            }
            Err(e) if e.is_fatal() => {
                error!(%key, "watch failed: {}", e);
                deliver(&tx, &token, Err(Error::Query(e))).await;
                break;
            }
            Err(e) => {
                let delay = backoff.on_failure();
                warn!(
                    %key,
                    attempt = backoff.consecutive_failures(),
                    ?delay,
                    "blocking read failed, retrying: {}",
                    e
                );

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = sleep(delay) => {}
                }
            }
        }
    }

    info!(%key, index = query_loop.cursor().last_index(), "watch stopped");
}

/// Hands one item to the subscriber. Returns `false` when nobody will read
/// it any more.
async fn deliver(
    tx: &mpsc::Sender<WatchItem>,
    token: &CancellationToken,
    item: WatchItem,
) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        sent = tx.send(item) => {
            if sent.is_err() {
                debug!("subscriber gone, stopping watch");
            }
            sent.is_ok()
        }
    }
}
