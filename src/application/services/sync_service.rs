use crate::application::ports::connectivity::ConnectivityMonitor;
use crate::application::ports::local_store::LocalStore;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::services::mutation_queue::MutationQueue;
use crate::application::services::status_publisher::{StatusPublisher, SyncStatus};
use crate::domain::entities::SyncFailure;
use crate::domain::value_objects::Collection;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Metadata key holding the epoch-millisecond timestamp of the last
/// successful drain-and-refresh cycle.
pub const LAST_SYNC_KEY: &str = "last_sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Draining,
    Refreshing,
}

struct PassState {
    state: SyncState,
    /// A trigger arrived while a pass was running; run another pass once
    /// the current one finishes instead of spawning a concurrent one.
    rerun: bool,
}

/// Orchestrates replay of the mutation queue against the remote gateway
/// and keeps the local cache fresh.
///
/// Drain semantics: operations replay strictly in enqueue order. A
/// transient failure halts the pass (the queue past the failure point is
/// untouched and retried on the next trigger); a permanent failure drops
/// only the failed operation and continues. After every drain pass the
/// coordinator refreshes each collection from the authoritative remote
/// snapshot, wholesale-replacing the cached set.
///
/// Only one pass runs at a time: `Idle` is the only state a pass starts
/// from, and triggers arriving mid-pass coalesce into a follow-up pass.
pub struct SyncService {
    store: Arc<dyn LocalStore>,
    queue: MutationQueue,
    gateway: Arc<dyn RemoteGateway>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    publisher: Arc<StatusPublisher>,
    // Held only for synchronous transitions, never across an await.
    pass: Mutex<PassState>,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        publisher: Arc<StatusPublisher>,
    ) -> Self {
        Self {
            queue: MutationQueue::new(store.clone()),
            store,
            gateway,
            connectivity,
            publisher,
            pass: Mutex::new(PassState {
                state: SyncState::Idle,
                rerun: false,
            }),
        }
    }

    pub fn state(&self) -> SyncState {
        self.lock_pass().state
    }

    pub fn is_syncing(&self) -> bool {
        self.state() != SyncState::Idle
    }

    /// Entry point for every trigger: startup, offline-to-online edge,
    /// enqueue-while-online, manual refresh, background wake. Returns once
    /// the cycle (including coalesced reruns) has wound down; callers that
    /// must not wait spawn this.
    pub async fn sync_pending(&self) -> Result<(), AppError> {
        if !self.connectivity.is_online() {
            return Ok(());
        }
        if !self.begin_pass() {
            return Ok(());
        }
        self.publish_status().await;

        loop {
            if let Err(err) = self.run_pass().await {
                error!("Sync pass aborted: {}", err);
                self.force_idle();
                self.publish_status().await;
                return Err(err);
            }
            if !self.finish_pass() {
                break;
            }
            self.publish_status().await;
        }
        self.publish_status().await;
        Ok(())
    }

    /// Recomputes and publishes the observable status. Called by the engine
    /// after an enqueue so pending counts stay honest while offline.
    pub async fn publish_status(&self) {
        let pending = match self.queue.len().await {
            Ok(len) => len,
            Err(err) => {
                warn!("Failed to read queue length: {}", err);
                return;
            }
        };
        let status = SyncStatus {
            is_syncing: self.is_syncing(),
            pending_operations: pending,
            last_sync: self.last_sync().await,
        };
        self.publisher.publish(status);
    }

    pub async fn last_sync(&self) -> i64 {
        match self.store.get_metadata(LAST_SYNC_KEY).await {
            Ok(Some(value)) => value.parse::<i64>().unwrap_or(0),
            Ok(None) => 0,
            Err(err) => {
                warn!("Failed to read last_sync metadata: {}", err);
                0
            }
        }
    }

    /// Periodic trigger. The caller owns the returned handle.
    pub fn schedule_sync(self: &Arc<Self>, interval_secs: u64) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = service.sync_pending().await {
                    error!("Scheduled sync error: {}", e);
                }
            }
        })
    }

    async fn run_pass(&self) -> Result<(), AppError> {
        // Snapshot the queue once per pass; operations enqueued after this
        // point ride the coalesced rerun.
        let operations = self.queue.list().await?;
        debug!(count = operations.len(), "Drain pass started");

        for operation in operations {
            // Connectivity loss: the in-flight call already finished or
            // failed on its own; nothing new starts.
            if !self.connectivity.is_online() {
                info!("Connectivity lost, halting drain pass");
                break;
            }
            match self.gateway.apply(&operation).await {
                Ok(()) => {
                    self.queue.ack(operation.sequence_id).await?;
                    self.publish_status().await;
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        sequence_id = %operation.sequence_id,
                        "Transient failure, drain halted: {}", err
                    );
                    // Head-of-line: skipping ahead would apply a later
                    // operation before a retried earlier one.
                    break;
                }
                Err(err) => {
                    warn!(
                        sequence_id = %operation.sequence_id,
                        "Permanent failure, dropping operation: {}", err
                    );
                    self.queue.ack(operation.sequence_id).await?;
                    self.publisher.report_failure(SyncFailure {
                        sequence_id: operation.sequence_id,
                        kind: operation.kind,
                        collection: operation.collection,
                        entity_id: operation.entity_id.clone(),
                        message: err.to_string(),
                        failed_at: Utc::now(),
                    });
                    self.publish_status().await;
                }
            }
        }

        // Refresh runs even when nothing drained; it reconciles server-side
        // changes made by other clients.
        self.enter_refresh();
        self.publish_status().await;
        if self.connectivity.is_online() {
            match self.refresh().await {
                Ok(()) => {
                    let now = Utc::now().timestamp_millis();
                    self.store
                        .set_metadata(LAST_SYNC_KEY, &now.to_string())
                        .await?;
                }
                Err(err) => {
                    // Last-known-good cache stays; drained operations are
                    // not rolled back.
                    warn!("Refresh failed: {}", err);
                }
            }
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<(), AppError> {
        for collection in Collection::ALL {
            let entities = self.gateway.fetch_all(collection).await?;
            self.store.replace_collection(collection, entities).await?;
        }
        Ok(())
    }

    fn begin_pass(&self) -> bool {
        let mut pass = self.lock_pass();
        if pass.state == SyncState::Idle {
            pass.state = SyncState::Draining;
            true
        } else {
            pass.rerun = true;
            false
        }
    }

    /// Returns true when a coalesced trigger asks for another pass.
    fn finish_pass(&self) -> bool {
        let mut pass = self.lock_pass();
        if pass.rerun && self.connectivity.is_online() {
            pass.rerun = false;
            pass.state = SyncState::Draining;
            true
        } else {
            pass.rerun = false;
            pass.state = SyncState::Idle;
            false
        }
    }

    fn enter_refresh(&self) {
        self.lock_pass().state = SyncState::Refreshing;
    }

    fn force_idle(&self) {
        let mut pass = self.lock_pass();
        pass.rerun = false;
        pass.state = SyncState::Idle;
    }

    fn lock_pass(&self) -> MutexGuard<'_, PassState> {
        self.pass.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::remote_gateway::{
        AssetDescriptor, BlobMetadata, RemoteError, RemoteGateway,
    };
    use crate::domain::entities::{CachedEntity, QueuedOperation, QueuedOperationDraft};
    use crate::domain::value_objects::{EntityId, OperationKind, OperationPayload};
    use crate::infrastructure::database::sqlite_store::SqliteLocalStore;
    use crate::infrastructure::platform::connectivity::ChannelConnectivity;
    use async_trait::async_trait;
    use bytes::Bytes;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Gateway whose `apply` pops scripted outcomes in call order and
    /// records every operation it was shown.
    struct ScriptedGateway {
        outcomes: StdMutex<VecDeque<Result<(), RemoteError>>>,
        applied: StdMutex<Vec<QueuedOperation>>,
        snapshots: StdMutex<Vec<CachedEntity>>,
    }

    impl ScriptedGateway {
        fn new(outcomes: Vec<Result<(), RemoteError>>) -> Self {
            Self {
                outcomes: StdMutex::new(outcomes.into()),
                applied: StdMutex::new(Vec::new()),
                snapshots: StdMutex::new(Vec::new()),
            }
        }

        fn applied_ids(&self) -> Vec<String> {
            self.applied
                .lock()
                .expect("applied")
                .iter()
                .map(|op| op.entity_id.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl RemoteGateway for ScriptedGateway {
        async fn apply(&self, operation: &QueuedOperation) -> Result<(), RemoteError> {
            self.applied
                .lock()
                .expect("applied")
                .push(operation.clone());
            self.outcomes
                .lock()
                .expect("outcomes")
                .pop_front()
                .unwrap_or(Ok(()))
        }

        async fn fetch_all(&self, _collection: Collection) -> Result<Vec<CachedEntity>, RemoteError> {
            Ok(self.snapshots.lock().expect("snapshots").clone())
        }

        async fn upload_blob(
            &self,
            _bytes: Bytes,
            _metadata: BlobMetadata,
        ) -> Result<AssetDescriptor, RemoteError> {
            Err(RemoteError::Permanent("not scripted".into()))
        }
    }

    async fn setup(
        outcomes: Vec<Result<(), RemoteError>>,
    ) -> (Arc<SyncService>, Arc<ScriptedGateway>, Arc<SqliteLocalStore>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");

        let store = Arc::new(SqliteLocalStore::new(pool));
        let gateway = Arc::new(ScriptedGateway::new(outcomes));
        let connectivity = Arc::new(ChannelConnectivity::new(true));
        let publisher = Arc::new(StatusPublisher::new());
        let service = Arc::new(SyncService::new(
            store.clone(),
            gateway.clone(),
            connectivity,
            publisher,
        ));
        (service, gateway, store)
    }

    fn update_draft(id: &str) -> QueuedOperationDraft {
        QueuedOperationDraft::new(
            OperationKind::Update,
            Collection::Projects,
            EntityId::new(id.into()).expect("entity id"),
            OperationPayload::from_json_str(r#"{"status":"done"}"#).expect("payload"),
        )
    }

    #[tokio::test]
    async fn drains_in_enqueue_order() {
        let (service, gateway, store) = setup(vec![Ok(()), Ok(()), Ok(())]).await;
        for id in ["p1", "p2", "p3"] {
            store.enqueue(update_draft(id)).await.expect("enqueue");
        }

        service.sync_pending().await.expect("sync");

        assert_eq!(gateway.applied_ids(), vec!["p1", "p2", "p3"]);
        assert_eq!(store.queue_len().await.expect("len"), 0);
        assert!(!service.is_syncing());
    }

    #[tokio::test]
    async fn transient_failure_halts_pass_and_keeps_tail() {
        let (service, gateway, store) = setup(vec![
            Ok(()),
            Err(RemoteError::Transient("503".into())),
            Ok(()),
        ])
        .await;
        for id in ["p1", "p2", "p3"] {
            store.enqueue(update_draft(id)).await.expect("enqueue");
        }

        service.sync_pending().await.expect("sync");

        // p3 never attempted this pass; p2 and p3 still queued in order.
        assert_eq!(gateway.applied_ids(), vec!["p1", "p2"]);
        let remaining = store.list_queue().await.expect("queue");
        let ids: Vec<&str> = remaining.iter().map(|op| op.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p3"]);
    }

    #[tokio::test]
    async fn permanent_failure_drops_only_the_failed_operation() {
        let (service, gateway, store) = setup(vec![
            Err(RemoteError::Permanent("422".into())),
            Ok(()),
        ])
        .await;
        let mut failures = service.publisher.failures();
        store.enqueue(update_draft("p1")).await.expect("enqueue");
        store.enqueue(update_draft("p2")).await.expect("enqueue");

        service.sync_pending().await.expect("sync");

        assert_eq!(gateway.applied_ids(), vec!["p1", "p2"]);
        assert_eq!(store.queue_len().await.expect("len"), 0);
        let failure = failures.try_recv().expect("failure record");
        assert_eq!(failure.entity_id.as_str(), "p1");
    }

    #[tokio::test]
    async fn refresh_replaces_cache_and_stamps_last_sync() {
        let (service, gateway, store) = setup(vec![]).await;
        // A stale local-only record the snapshot no longer contains.
        store
            .put(
                Collection::Owners,
                CachedEntity::from_remote(serde_json::json!({"id": "stale"}), Utc::now())
                    .expect("entity"),
            )
            .await
            .expect("put");
        *gateway.snapshots.lock().expect("snapshots") = vec![CachedEntity::from_remote(
            serde_json::json!({"id": "o1", "name": "Alice"}),
            Utc::now(),
        )
        .expect("entity")];

        let before = Utc::now().timestamp_millis();
        service.sync_pending().await.expect("sync");

        let owners = store.get_all(Collection::Owners).await.expect("owners");
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].id.as_str(), "o1");
        assert!(service.last_sync().await >= before);
    }

    #[tokio::test]
    async fn offline_trigger_is_a_no_op() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        let store = Arc::new(SqliteLocalStore::new(pool));
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let connectivity = Arc::new(ChannelConnectivity::new(false));
        let publisher = Arc::new(StatusPublisher::new());
        let service = SyncService::new(store.clone(), gateway.clone(), connectivity, publisher);

        store.enqueue(update_draft("p1")).await.expect("enqueue");
        service.sync_pending().await.expect("sync");

        assert!(gateway.applied_ids().is_empty());
        assert_eq!(store.queue_len().await.expect("len"), 1);
        assert_eq!(service.last_sync().await, 0);
    }
}
