//! Offline-first synchronization engine for the owners/projects dashboard.
//!
//! Mutations commit to a durable local queue first and replay against the
//! remote content API in enqueue order once connectivity allows; cached
//! collections refresh wholesale from authoritative snapshots after every
//! drain pass. The UI observes progress through a last-value-wins status
//! feed.

pub mod application;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    AssetDescriptor, BackgroundWake, BlobMetadata, ConnectivityMonitor, LocalStore, RemoteError,
    RemoteGateway, WakeTrigger,
};
pub use application::services::{StatusPublisher, SubscriptionHandle, SyncState, SyncStatus};
pub use domain::entities::{CachedEntity, QueuedOperation, QueuedOperationDraft, SyncFailure};
pub use domain::value_objects::{Collection, EntityId, OperationKind, OperationPayload, SequenceId};
pub use engine::SyncEngine;
pub use infrastructure::platform::{ChannelConnectivity, NoopBackgroundWake};
pub use shared::config::AppConfig;
pub use shared::error::{AppError, Result};

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syncdeck=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
