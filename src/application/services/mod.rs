pub mod mutation_queue;
pub mod status_publisher;
pub mod sync_service;

pub use mutation_queue::MutationQueue;
pub use status_publisher::{StatusPublisher, SubscriptionHandle, SyncStatus};
pub use sync_service::{SyncService, SyncState, LAST_SYNC_KEY};
