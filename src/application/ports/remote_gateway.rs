use crate::domain::entities::{CachedEntity, QueuedOperation};
use crate::domain::value_objects::Collection;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote failure classification the coordinator keys retry behavior off.
///
/// Transient covers anything that may succeed on an unchanged retry
/// (network, timeout, server-side failure). Permanent covers failures that
/// can never succeed by retrying unchanged (validation, conflict); the
/// operation is dropped from the queue after one attempt.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transient remote failure: {0}")]
    Transient(String),

    #[error("permanent remote failure: {0}")]
    Permanent(String),
}

impl RemoteError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }
}

/// Descriptor for a file stored through the remote asset endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetDescriptor {
    pub id: String,
    pub filename: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlobMetadata {
    pub filename: String,
    pub content_type: Option<String>,
    pub title: Option<String>,
}

/// Stateless adapter translating queued operations and snapshot fetches
/// into authoritative remote calls. Makes no local-cache decisions and
/// holds no state; timeouts are its responsibility and surface as
/// transient failures.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Performs exactly one remote call for one queued operation.
    async fn apply(&self, operation: &QueuedOperation) -> Result<(), RemoteError>;

    /// Fetches the full authoritative snapshot for a collection.
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<CachedEntity>, RemoteError>;

    /// Uploads a binary asset and returns its descriptor.
    async fn upload_blob(
        &self,
        bytes: Bytes,
        metadata: BlobMetadata,
    ) -> Result<AssetDescriptor, RemoteError>;
}
