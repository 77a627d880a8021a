use crate::application::ports::connectivity::{BackgroundWake, ConnectivityMonitor, WakeTrigger};
use crate::application::ports::local_store::LocalStore;
use crate::application::ports::remote_gateway::{
    AssetDescriptor, BlobMetadata, RemoteGateway,
};
use crate::application::services::status_publisher::{
    StatusPublisher, SubscriptionHandle, SyncStatus,
};
use crate::application::services::sync_service::SyncService;
use crate::domain::entities::{CachedEntity, QueuedOperation, QueuedOperationDraft, SyncFailure};
use crate::domain::value_objects::{Collection, EntityId};
use crate::infrastructure::database::{Database, SqliteLocalStore};
use crate::infrastructure::platform::{ChannelConnectivity, NoopBackgroundWake};
use crate::infrastructure::remote::HttpRemoteGateway;
use crate::shared::config::{AppConfig, SyncConfig};
use crate::shared::error::{AppError, Result};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

/// Composition root of the sync layer. Owned by the application's
/// top-level setup and passed by handle to the UI layer; there is exactly
/// one instance per local store, but nothing here is a hidden singleton.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    gateway: Arc<dyn RemoteGateway>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    background_wake: Arc<dyn BackgroundWake>,
    publisher: Arc<StatusPublisher>,
    sync: Arc<SyncService>,
    sync_config: SyncConfig,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        background_wake: Arc<dyn BackgroundWake>,
        sync_config: SyncConfig,
    ) -> Self {
        let publisher = Arc::new(StatusPublisher::new());
        let sync = Arc::new(SyncService::new(
            store.clone(),
            gateway.clone(),
            connectivity.clone(),
            publisher.clone(),
        ));
        Self {
            store,
            gateway,
            connectivity,
            background_wake,
            publisher,
            sync,
            sync_config,
        }
    }

    /// Builds the production wiring: SQLite store, HTTP gateway, and a
    /// channel-backed connectivity feed the host connects to its platform's
    /// network observer. The engine starts offline until the host reports
    /// otherwise.
    pub async fn from_config(config: &AppConfig) -> Result<(Self, ChannelConnectivity)> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let pool = Database::initialize(&config.database).await?;
        let store: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::new(pool));
        let gateway: Arc<dyn RemoteGateway> = Arc::new(HttpRemoteGateway::new(&config.remote)?);
        let connectivity = ChannelConnectivity::new(false);

        let engine = Self::new(
            store,
            gateway,
            Arc::new(connectivity.clone()),
            Arc::new(NoopBackgroundWake),
            config.sync.clone(),
        );
        Ok((engine, connectivity))
    }

    /// Wires the runtime pieces: publishes the initial status, watches
    /// connectivity transitions, registers the background wake hook when
    /// the platform has one, schedules the periodic trigger, and kicks off
    /// a startup sync if already online.
    pub async fn start(&self) {
        self.sync.publish_status().await;
        self.spawn_connectivity_watcher();

        if self.background_wake.is_available() {
            let sync = self.sync.clone();
            let trigger: WakeTrigger = Arc::new(move || {
                let sync = sync.clone();
                tokio::spawn(async move {
                    if let Err(e) = sync.sync_pending().await {
                        warn!("Background sync error: {}", e);
                    }
                });
            });
            if let Err(e) = self.background_wake.register(trigger).await {
                warn!("Failed to register background wake: {}", e);
            }
        }

        if self.sync_config.auto_sync {
            self.sync.schedule_sync(self.sync_config.sync_interval);
        }

        if self.connectivity.is_online() {
            let sync = self.sync.clone();
            tokio::spawn(async move {
                if let Err(e) = sync.sync_pending().await {
                    warn!("Startup sync failed: {}", e);
                }
            });
        }
    }

    /// Appends a mutation to the queue. Returns once the operation is
    /// durably recorded — an error here means the action failed outright,
    /// not that it is pending. Remote replay happens in the background when
    /// online.
    pub async fn queue_operation(&self, draft: QueuedOperationDraft) -> Result<QueuedOperation> {
        let operation = self.store.enqueue(draft).await?;
        self.sync.publish_status().await;

        if self.connectivity.is_online() {
            let sync = self.sync.clone();
            tokio::spawn(async move {
                if let Err(e) = sync.sync_pending().await {
                    warn!("Sync after enqueue failed: {}", e);
                }
            });
        }
        Ok(operation)
    }

    /// Manual drain+refresh (pull-to-refresh). Waits for the cycle to wind
    /// down.
    pub async fn trigger_sync(&self) -> Result<()> {
        self.sync.sync_pending().await
    }

    pub fn subscribe_status<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(SyncStatus) + Send + 'static,
    {
        self.publisher.subscribe(callback)
    }

    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.publisher.watch()
    }

    pub fn current_status(&self) -> SyncStatus {
        self.publisher.current()
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<SyncFailure> {
        self.publisher.failures()
    }

    pub async fn get_all(&self, collection: Collection) -> Result<Vec<CachedEntity>> {
        self.store.get_all(collection).await
    }

    pub async fn get(&self, collection: Collection, id: &EntityId) -> Result<Option<CachedEntity>> {
        self.store.get(collection, id).await
    }

    /// Store handle for the UI's optimistic writes. Business logic patches
    /// the cached record here before queueing the matching operation.
    pub fn store(&self) -> Arc<dyn LocalStore> {
        self.store.clone()
    }

    /// Wipes cache, queue, and metadata. Full logout/reset only.
    pub async fn clear_local_data(&self) -> Result<()> {
        info!("Clearing all local sync data");
        self.store.clear_all().await?;
        self.sync.publish_status().await;
        Ok(())
    }

    pub async fn upload_blob(
        &self,
        bytes: Bytes,
        metadata: BlobMetadata,
    ) -> Result<AssetDescriptor> {
        self.gateway
            .upload_blob(bytes, metadata)
            .await
            .map_err(AppError::from)
    }

    fn spawn_connectivity_watcher(&self) {
        let mut rx = self.connectivity.subscribe();
        let sync = self.sync.clone();
        tokio::spawn(async move {
            let mut was_online = *rx.borrow_and_update();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online && !was_online {
                    info!("Back online, starting sync");
                    if let Err(e) = sync.sync_pending().await {
                        warn!("Sync after reconnect failed: {}", e);
                    }
                } else if !online && was_online {
                    info!("Connectivity lost");
                    sync.publish_status().await;
                }
                was_online = online;
            }
        });
    }
}
