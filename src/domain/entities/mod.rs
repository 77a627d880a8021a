pub mod cached_entity;
pub mod queued_operation;
pub mod sync_failure;

pub use cached_entity::CachedEntity;
pub use queued_operation::{QueuedOperation, QueuedOperationDraft};
pub use sync_failure::SyncFailure;
