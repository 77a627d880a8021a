use crate::application::ports::local_store::LocalStore;
use crate::domain::entities::{QueuedOperation, QueuedOperationDraft};
use crate::domain::value_objects::SequenceId;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Thin semantic layer over the store's queue primitives. Operations are
/// always listed in ascending sequence order; there is no batching or
/// reordering, so a failed operation stays first in line for the next
/// drain attempt.
#[derive(Clone)]
pub struct MutationQueue {
    store: Arc<dyn LocalStore>,
}

impl MutationQueue {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub async fn push(&self, draft: QueuedOperationDraft) -> Result<QueuedOperation, AppError> {
        self.store.enqueue(draft).await
    }

    /// The full current queue. Re-sorted by sequence id regardless of the
    /// storage engine's iteration order.
    pub async fn list(&self) -> Result<Vec<QueuedOperation>, AppError> {
        let mut operations = self.store.list_queue().await?;
        operations.sort_by_key(|op| op.sequence_id);
        Ok(operations)
    }

    pub async fn ack(&self, sequence_id: SequenceId) -> Result<(), AppError> {
        self.store.dequeue(sequence_id).await
    }

    pub async fn len(&self) -> Result<u32, AppError> {
        self.store.queue_len().await
    }
}
