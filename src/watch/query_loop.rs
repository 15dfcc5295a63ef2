use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::CursorTracker;
use super::WatchEvent;
use crate::BlockingKvClient;
use crate::QueryError;
use crate::WatchKey;

/// One key, one cursor, one read at a time.
///
/// The cursor only moves after a successful read, so a failed or abandoned
/// cycle is retried with the same wait index and cannot skip a change made
/// while the store was unreachable.
pub struct BlockingQueryLoop<C> {
    client: Arc<C>,
    key: WatchKey,
    cursor: CursorTracker,
    wait: Duration,
}

impl<C> BlockingQueryLoop<C>
where
    C: BlockingKvClient,
{
    pub fn new(
        client: Arc<C>,
        key: WatchKey,
        wait: Duration,
    ) -> Self {
        Self {
            client,
            key,
            cursor: CursorTracker::new(),
            wait,
        }
    }

    pub fn key(&self) -> &WatchKey {
        &self.key
    }

    pub fn cursor(&self) -> &CursorTracker {
        &self.cursor
    }

    /// Issues one blocking read and reports whether the value changed.
    ///
    /// `Ok(None)` means the read succeeded without a change, typically a long
    /// poll that hit its server-side timeout. Dropping the returned future
    /// abandons the read and leaves the cursor untouched.
    pub async fn run_cycle(&mut self) -> std::result::Result<Option<WatchEvent>, QueryError> {
        let wait_index = self.cursor.last_index();

        let snapshot = self.client.read(&self.key, wait_index, self.wait).await?;
        trace!(key = %self.key, wait_index, index = snapshot.index, "blocking read returned");

        Ok(self.cursor.observe(snapshot))
    }
}
