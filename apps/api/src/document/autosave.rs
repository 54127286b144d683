//! Trailing-edge debounced persistence.
//!
//! Each call to `schedule` cancels the pending write and starts a fresh timer
//! holding a snapshot of the latest document, so at most one write happens
//! per quiet period and it always carries the most recent state.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::document::Document;
use crate::storage::DocumentStore;

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

pub struct Autosave {
    store: DocumentStore,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Autosave {
    pub fn new(store: DocumentStore, delay: Duration) -> Self {
        Autosave {
            store,
            delay,
            pending: None,
        }
    }

    /// Restarts the quiet-period timer with `snapshot` as the state to write.
    ///
    /// Outside a tokio runtime there is no timer to arm, so the write happens
    /// immediately.
    pub fn schedule(&mut self, snapshot: Document) {
        self.cancel();
        let Ok(handle) = Handle::try_current() else {
            debug!("No async runtime; saving without debounce");
            self.store.save(&snapshot);
            return;
        };
        let store = self.store.clone();
        let delay = self.delay;
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // FileStore writes and fsyncs synchronously.
            if let Err(e) = tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
                warn!("Autosave task failed: {e}");
            }
        }));
    }

    /// Cancels any pending write and persists `doc` right away.
    pub fn flush(&mut self, doc: &Document) {
        self.cancel();
        self.store.save(doc);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.cancel();
    }
}
