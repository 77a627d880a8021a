use crate::domain::value_objects::{
    Collection, EntityId, OperationKind, OperationPayload, SequenceId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending write before the store assigns its queue position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedOperationDraft {
    pub kind: OperationKind,
    pub collection: Collection,
    pub entity_id: EntityId,
    pub payload: OperationPayload,
}

impl QueuedOperationDraft {
    pub fn new(
        kind: OperationKind,
        collection: Collection,
        entity_id: EntityId,
        payload: OperationPayload,
    ) -> Self {
        Self {
            kind,
            collection,
            entity_id,
            payload,
        }
    }
}

/// A durably queued write operation. Created when a UI mutation commits
/// locally, destroyed only after its remote replay succeeds (or fails
/// permanently). Never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedOperation {
    pub sequence_id: SequenceId,
    pub kind: OperationKind,
    pub collection: Collection,
    pub entity_id: EntityId,
    pub payload: OperationPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedOperation {
    pub fn new(
        sequence_id: SequenceId,
        draft: QueuedOperationDraft,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sequence_id,
            kind: draft.kind,
            collection: draft.collection,
            entity_id: draft.entity_id,
            payload: draft.payload,
            enqueued_at,
        }
    }
}
