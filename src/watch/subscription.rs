use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Result;
use crate::WatchKey;

/// Item delivered to a subscriber: a new value (`None` when the key was
/// deleted), or the fatal error that ended the watch.
pub type WatchItem = Result<Option<String>>;

/// Consumer side of one running watch.
///
/// `next()` suspends until the key changes. It yields `None` once the
/// subscription has ended, either because it was cancelled or because the
/// watch reported a fatal error as its last item.
///
/// Dropping the subscription cancels the watch and aborts any in-flight
/// blocking read.
pub struct Subscription {
    key: WatchKey,
    receiver: mpsc::Receiver<WatchItem>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    cancelled: bool,
}

impl Subscription {
    pub(crate) fn new(
        key: WatchKey,
        receiver: mpsc::Receiver<WatchItem>,
        token: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            key,
            receiver,
            token,
            task: Some(task),
            cancelled: false,
        }
    }

    pub fn key(&self) -> &WatchKey {
        &self.key
    }

    /// Waits for the next change.
    pub async fn next(&mut self) -> Option<WatchItem> {
        if self.cancelled {
            return None;
        }
        self.receiver.recv().await
    }

    /// Stops the watch. Changes already buffered are discarded.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        debug!(key = %self.key, "subscription cancelled");
        self.cancelled = true;
        self.token.cancel();
        self.receiver.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Cancels the watch and waits until its task has released the client.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(key = %self.key, "watch task ended abnormally: {:?}", e);
            }
        }
    }
}

impl Stream for Subscription {
    type Item = WatchItem;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancelled {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}
