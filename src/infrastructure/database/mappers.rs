use super::rows::{CachedEntityRow, QueuedOperationRow};
use crate::domain::entities::{CachedEntity, QueuedOperation};
use crate::domain::value_objects::{
    Collection, EntityId, OperationKind, OperationPayload, SequenceId,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

pub fn cached_entity_from_row(row: CachedEntityRow) -> Result<CachedEntity, AppError> {
    let data: serde_json::Value = serde_json::from_str(&row.data)
        .map_err(|err| AppError::DeserializationError(err.to_string()))?;
    Ok(CachedEntity::new(
        EntityId::new(row.entity_id).map_err(AppError::ValidationError)?,
        data,
        timestamp_to_datetime(row.fetched_at),
    ))
}

pub fn queued_operation_from_row(row: QueuedOperationRow) -> Result<QueuedOperation, AppError> {
    let payload_value: serde_json::Value = serde_json::from_str(&row.payload)
        .map_err(|err| AppError::DeserializationError(err.to_string()))?;
    Ok(QueuedOperation {
        sequence_id: SequenceId::new(row.id).map_err(AppError::ValidationError)?,
        kind: OperationKind::parse(&row.kind).map_err(AppError::ValidationError)?,
        collection: Collection::parse(&row.collection).map_err(AppError::ValidationError)?,
        entity_id: EntityId::new(row.entity_id).map_err(AppError::ValidationError)?,
        payload: OperationPayload::new(payload_value).map_err(AppError::ValidationError)?,
        enqueued_at: timestamp_to_datetime(row.created_at),
    })
}

fn timestamp_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}
