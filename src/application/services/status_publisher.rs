use crate::domain::entities::SyncFailure;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Observable sync state for the UI. Derived, never persisted: recomputed
/// from the queue length and sync metadata whenever either changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub pending_operations: u32,
    /// Epoch milliseconds of the last successful drain-and-refresh cycle;
    /// 0 when the engine has never synced.
    pub last_sync: i64,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            is_syncing: false,
            pending_operations: 0,
            last_sync: 0,
        }
    }
}

/// Last-value-wins fan-out of [`SyncStatus`] changes, plus a side channel
/// for permanently failed operations.
///
/// Delivery contract: a subscriber receives the current status immediately
/// upon subscribing, then every subsequent change in order. Missed
/// intermediate values are not buffered; only the latest status matters.
pub struct StatusPublisher {
    status_tx: watch::Sender<SyncStatus>,
    failure_tx: broadcast::Sender<SyncFailure>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::default());
        let (failure_tx, _) = broadcast::channel(64);
        Self {
            status_tx,
            failure_tx,
        }
    }

    pub fn current(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    /// Publishes a recomputed status. Subscribers are only notified when
    /// the value actually changed.
    pub fn publish(&self, status: SyncStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Raw receiver for async consumers.
    pub fn watch(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Callback subscription. Invokes `callback` synchronously with the
    /// current status, then from a forwarding task on every change. Must be
    /// called from within a Tokio runtime. Dropping the handle (or calling
    /// [`SubscriptionHandle::unsubscribe`]) ends delivery.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(SyncStatus) + Send + 'static,
    {
        let mut rx = self.status_tx.subscribe();
        callback(rx.borrow_and_update().clone());
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = rx.borrow_and_update().clone();
                callback(status);
            }
        });
        SubscriptionHandle { task }
    }

    /// Records an operation dropped after a permanent remote failure.
    /// Best-effort: an unobserved channel drops the record.
    pub fn report_failure(&self, failure: SyncFailure) {
        let _ = self.failure_tx.send(failure);
    }

    pub fn failures(&self) -> broadcast::Receiver<SyncFailure> {
        self.failure_tx.subscribe()
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
