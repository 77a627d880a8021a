use super::connection::DbPool;
use super::mappers::{cached_entity_from_row, queued_operation_from_row};
use super::rows::{CachedEntityRow, QueuedOperationRow};
use crate::application::ports::local_store::LocalStore;
use crate::domain::entities::{CachedEntity, QueuedOperation, QueuedOperationDraft};
use crate::domain::value_objects::{Collection, EntityId, SequenceId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;

/// SQLite-backed [`LocalStore`]. Every call commits before returning, so
/// queued operations and cached records survive process restarts.
pub struct SqliteLocalStore {
    pool: DbPool,
}

impl SqliteLocalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn serialize_json(value: &serde_json::Value) -> Result<String, AppError> {
        serde_json::to_string(value).map_err(|err| AppError::SerializationError(err.to_string()))
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<CachedEntity>, AppError> {
        let rows = sqlx::query_as::<_, CachedEntityRow>(
            r#"
            SELECT entity_id, data, fetched_at
            FROM cached_entities
            WHERE collection = ?1
            ORDER BY entity_id ASC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(cached_entity_from_row).collect()
    }

    async fn get(
        &self,
        collection: Collection,
        id: &EntityId,
    ) -> Result<Option<CachedEntity>, AppError> {
        let row = sqlx::query_as::<_, CachedEntityRow>(
            r#"
            SELECT entity_id, data, fetched_at
            FROM cached_entities
            WHERE collection = ?1 AND entity_id = ?2
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(cached_entity_from_row).transpose()
    }

    async fn put(&self, collection: Collection, entity: CachedEntity) -> Result<(), AppError> {
        let data = Self::serialize_json(&entity.data)?;
        sqlx::query(
            r#"
            INSERT INTO cached_entities (collection, entity_id, data, fetched_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (collection, entity_id)
            DO UPDATE SET data = excluded.data, fetched_at = excluded.fetched_at
            "#,
        )
        .bind(collection.as_str())
        .bind(entity.id.as_str())
        .bind(&data)
        .bind(entity.fetched_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put_many(
        &self,
        collection: Collection,
        entities: Vec<CachedEntity>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for entity in &entities {
            let data = Self::serialize_json(&entity.data)?;
            sqlx::query(
                r#"
                INSERT INTO cached_entities (collection, entity_id, data, fetched_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (collection, entity_id)
                DO UPDATE SET data = excluded.data, fetched_at = excluded.fetched_at
                "#,
            )
            .bind(collection.as_str())
            .bind(entity.id.as_str())
            .bind(&data)
            .bind(entity.fetched_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_collection(
        &self,
        collection: Collection,
        entities: Vec<CachedEntity>,
    ) -> Result<(), AppError> {
        // Delete-then-insert in one transaction: the cached set becomes
        // exactly the snapshot, including evicting server-deleted rows.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cached_entities WHERE collection = ?1")
            .bind(collection.as_str())
            .execute(&mut *tx)
            .await?;
        for entity in &entities {
            let data = Self::serialize_json(&entity.data)?;
            sqlx::query(
                r#"
                INSERT INTO cached_entities (collection, entity_id, data, fetched_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(collection.as_str())
            .bind(entity.id.as_str())
            .bind(&data)
            .bind(entity.fetched_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &EntityId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM cached_entities WHERE collection = ?1 AND entity_id = ?2")
            .bind(collection.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cached_entities")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sync_queue").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sync_metadata")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn enqueue(&self, draft: QueuedOperationDraft) -> Result<QueuedOperation, AppError> {
        let enqueued_at = Utc::now();
        let payload = Self::serialize_json(draft.payload.as_json())?;

        let result = sqlx::query(
            r#"
            INSERT INTO sync_queue (kind, collection, entity_id, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(draft.kind.as_str())
        .bind(draft.collection.as_str())
        .bind(draft.entity_id.as_str())
        .bind(&payload)
        .bind(enqueued_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let sequence_id =
            SequenceId::new(result.last_insert_rowid()).map_err(AppError::ValidationError)?;
        Ok(QueuedOperation::new(sequence_id, draft, enqueued_at))
    }

    async fn list_queue(&self) -> Result<Vec<QueuedOperation>, AppError> {
        let rows = sqlx::query_as::<_, QueuedOperationRow>(
            r#"
            SELECT id, kind, collection, entity_id, payload, created_at
            FROM sync_queue
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(queued_operation_from_row).collect()
    }

    async fn queue_len(&self) -> Result<u32, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue")
            .fetch_one(&self.pool)
            .await?;
        u32::try_from(count)
            .map_err(|_| AppError::Storage("queue length out of range".to_string()))
    }

    async fn dequeue(&self, sequence_id: SequenceId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
            .bind(sequence_id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM sync_metadata WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set_metadata(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (key, value)
            VALUES (?1, ?2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
