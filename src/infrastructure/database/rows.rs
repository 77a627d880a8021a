use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CachedEntityRow {
    pub entity_id: String,
    pub data: String,
    pub fetched_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct QueuedOperationRow {
    pub id: i64,
    pub kind: String,
    pub collection: String,
    pub entity_id: String,
    pub payload: String,
    pub created_at: i64,
}
