use crate::domain::entities::{CachedEntity, QueuedOperation, QueuedOperationDraft};
use crate::domain::value_objects::{Collection, EntityId, SequenceId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable storage for cached entities, the mutation queue, and sync
/// metadata. Every operation persists before returning; a failure means
/// the caller must not assume partial writes succeeded.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Every cached record for a collection. Empty when nothing is cached;
    /// never fails for a missing collection.
    async fn get_all(&self, collection: Collection) -> Result<Vec<CachedEntity>, AppError>;

    async fn get(
        &self,
        collection: Collection,
        id: &EntityId,
    ) -> Result<Option<CachedEntity>, AppError>;

    /// Upsert by id. Replaces the existing record entirely.
    async fn put(&self, collection: Collection, entity: CachedEntity) -> Result<(), AppError>;

    async fn put_many(
        &self,
        collection: Collection,
        entities: Vec<CachedEntity>,
    ) -> Result<(), AppError>;

    /// Makes the cached set exactly `entities`, evicting anything else in
    /// the collection. Used by refresh.
    async fn replace_collection(
        &self,
        collection: Collection,
        entities: Vec<CachedEntity>,
    ) -> Result<(), AppError>;

    /// No-op if absent.
    async fn remove(&self, collection: Collection, id: &EntityId) -> Result<(), AppError>;

    /// Wipes all collections, the queue, and metadata. Full logout/reset only.
    async fn clear_all(&self) -> Result<(), AppError>;

    async fn enqueue(&self, draft: QueuedOperationDraft) -> Result<QueuedOperation, AppError>;

    /// The full current queue in insertion order.
    async fn list_queue(&self) -> Result<Vec<QueuedOperation>, AppError>;

    async fn queue_len(&self) -> Result<u32, AppError>;

    async fn dequeue(&self, sequence_id: SequenceId) -> Result<(), AppError>;

    async fn get_metadata(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set_metadata(&self, key: &str, value: &str) -> Result<(), AppError>;
}
