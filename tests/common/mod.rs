use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use syncdeck::infrastructure::database::SqliteLocalStore;
use syncdeck::{
    AssetDescriptor, BlobMetadata, CachedEntity, Collection, QueuedOperation, RemoteError,
    RemoteGateway,
};

pub async fn memory_store() -> Arc<SqliteLocalStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    Arc::new(SqliteLocalStore::new(pool))
}

/// Remote gateway double: `apply` pops scripted outcomes in call order
/// (default success) and records every operation it is shown; `fetch_all`
/// serves configured snapshots or scripted failures.
#[derive(Default)]
pub struct MockRemoteGateway {
    apply_outcomes: Mutex<VecDeque<Result<(), RemoteError>>>,
    applied: Mutex<Vec<QueuedOperation>>,
    snapshots: Mutex<HashMap<Collection, Vec<CachedEntity>>>,
    fetch_failures: Mutex<VecDeque<RemoteError>>,
    apply_delay: Mutex<Option<Duration>>,
}

impl MockRemoteGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_apply(&self, outcomes: Vec<Result<(), RemoteError>>) {
        *self.apply_outcomes.lock().expect("outcomes") = outcomes.into();
    }

    pub fn set_snapshot(&self, collection: Collection, entities: Vec<CachedEntity>) {
        self.snapshots
            .lock()
            .expect("snapshots")
            .insert(collection, entities);
    }

    pub fn fail_next_fetch(&self, error: RemoteError) {
        self.fetch_failures.lock().expect("failures").push_back(error);
    }

    /// Slows every `apply` call down so tests can observe mid-pass status.
    pub fn set_apply_delay(&self, delay: Duration) {
        *self.apply_delay.lock().expect("delay") = Some(delay);
    }

    pub fn applied(&self) -> Vec<QueuedOperation> {
        self.applied.lock().expect("applied").clone()
    }

    pub fn applied_entity_ids(&self) -> Vec<String> {
        self.applied()
            .iter()
            .map(|op| op.entity_id.to_string())
            .collect()
    }
}

#[async_trait]
impl RemoteGateway for MockRemoteGateway {
    async fn apply(&self, operation: &QueuedOperation) -> Result<(), RemoteError> {
        let delay = *self.apply_delay.lock().expect("delay");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.applied
            .lock()
            .expect("applied")
            .push(operation.clone());
        self.apply_outcomes
            .lock()
            .expect("outcomes")
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<CachedEntity>, RemoteError> {
        if let Some(error) = self.fetch_failures.lock().expect("failures").pop_front() {
            return Err(error);
        }
        Ok(self
            .snapshots
            .lock()
            .expect("snapshots")
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn upload_blob(
        &self,
        _bytes: Bytes,
        metadata: BlobMetadata,
    ) -> Result<AssetDescriptor, RemoteError> {
        Ok(AssetDescriptor {
            id: "mock-asset".to_string(),
            filename: Some(metadata.filename),
            url: None,
        })
    }
}
