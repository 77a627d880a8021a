use crate::domain::value_objects::{Collection, EntityId, OperationKind, SequenceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observability record for an operation dropped from the queue after a
/// permanent remote failure. The affected local entity may stay
/// inconsistent with the server until the next refresh reconciles it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncFailure {
    pub sequence_id: SequenceId,
    pub kind: OperationKind,
    pub collection: Collection,
    pub entity_id: EntityId,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}
