use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::core::error::{SyncError, SyncResult};

/// Batch-wide cancellation flag shared by every install task.
///
/// Tripped once by the first failing entry; every other task observes it at
/// its next guarded suspension point.
#[derive(Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal has been tripped.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let tripped = rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
        if tripped.is_err() {
            // Sender is owned by `self`, so this cannot happen while we exist.
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless the signal trips first, in which case it is dropped
    /// and `SyncError::Cancelled` is returned. An already tripped signal
    /// never polls `fut` at all.
    pub async fn guard<T, F>(&self, fut: F) -> SyncResult<T>
    where
        F: Future<Output = SyncResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(SyncError::Cancelled),
            result = fut => result,
        }
    }
}
