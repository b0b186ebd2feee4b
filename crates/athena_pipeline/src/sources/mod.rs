//! Source adapters: typed queries against the device stores, normalized into
//! the snapshot data model.
//!
//! Adapters absorb store failures. A failed or denied query is logged and the
//! affected part of the snapshot is left empty; nothing here returns an error.

pub mod calendar;
pub mod metrics;
pub mod workouts;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Countdown of adapter queries dispatched in the current fetch cycle that
/// have not resolved yet.
#[derive(Clone, Debug)]
pub struct PendingQueries {
    tx: Arc<watch::Sender<usize>>,
}

impl Default for PendingQueries {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingQueries {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, n: usize) {
        self.tx.send_modify(|p| *p += n);
    }

    pub fn complete(&self) {
        self.tx.send_modify(|p| *p = p.saturating_sub(1));
    }

    pub fn remaining(&self) -> usize {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.tx.subscribe()
    }

    /// Await `fut` and count it as resolved. The caller must have
    /// [`dispatch`](Self::dispatch)ed it first.
    pub async fn track<F: Future>(&self, fut: F) -> F::Output {
        let out = fut.await;
        self.complete();
        out
    }
}
