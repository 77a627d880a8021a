use crate::application::ports::remote_gateway::{
    AssetDescriptor, BlobMetadata, RemoteError, RemoteGateway,
};
use crate::domain::entities::{CachedEntity, QueuedOperation};
use crate::domain::value_objects::{Collection, EntityId, OperationKind};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{multipart, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Response envelope the content API wraps every document in.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// REST adapter for a Directus-style headless-content API:
/// `POST/PATCH/DELETE /items/{collection}` for writes,
/// `GET /items/{collection}` for snapshots, `POST /files` for assets.
///
/// Stateless: one remote call per invocation, no local-cache decisions.
/// The client-level timeout is what keeps a dead connection from wedging a
/// drain pass; it surfaces as [`RemoteError::Transient`].
pub struct HttpRemoteGateway {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpRemoteGateway {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    fn items_url(&self, collection: Collection) -> String {
        format!("{}/items/{}", self.base_url, collection.as_str())
    }

    fn item_url(&self, collection: Collection, id: &EntityId) -> String {
        format!("{}/items/{}/{}", self.base_url, collection.as_str(), id)
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = request.send().await.map_err(classify_request_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

#[async_trait]
impl RemoteGateway for HttpRemoteGateway {
    async fn apply(&self, operation: &QueuedOperation) -> Result<(), RemoteError> {
        debug!(
            kind = operation.kind.as_str(),
            collection = operation.collection.as_str(),
            entity_id = %operation.entity_id,
            "Applying queued operation"
        );
        let request = match operation.kind {
            OperationKind::Create => self
                .client
                .post(self.items_url(operation.collection))
                .json(operation.payload.as_json()),
            OperationKind::Update => self
                .client
                .patch(self.item_url(operation.collection, &operation.entity_id))
                .json(operation.payload.as_json()),
            // DELETE returns 204 No Content.
            OperationKind::Delete => self
                .client
                .delete(self.item_url(operation.collection, &operation.entity_id)),
        };
        self.execute(self.authorize(request)).await?;
        Ok(())
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<CachedEntity>, RemoteError> {
        let request = self.authorize(self.client.get(self.items_url(collection)));
        let response = self.execute(request).await?;
        let envelope: DataEnvelope<Vec<Value>> = response
            .json()
            .await
            .map_err(|err| RemoteError::Permanent(format!("malformed snapshot: {err}")))?;

        let fetched_at = Utc::now();
        envelope
            .data
            .into_iter()
            .map(|document| {
                CachedEntity::from_remote(document, fetched_at).map_err(RemoteError::Permanent)
            })
            .collect()
    }

    async fn upload_blob(
        &self,
        bytes: Bytes,
        metadata: BlobMetadata,
    ) -> Result<AssetDescriptor, RemoteError> {
        let mut part = multipart::Part::bytes(bytes.to_vec()).file_name(metadata.filename.clone());
        if let Some(content_type) = &metadata.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|err| RemoteError::Permanent(format!("invalid content type: {err}")))?;
        }
        let mut form = multipart::Form::new();
        if let Some(title) = &metadata.title {
            form = form.text("title", title.clone());
        }
        form = form.part("file", part);

        let request = self.authorize(self.client.post(self.files_url()).multipart(form));
        let response = self.execute(request).await?;
        let envelope: DataEnvelope<Value> = response
            .json()
            .await
            .map_err(|err| RemoteError::Permanent(format!("malformed asset response: {err}")))?;

        let file = envelope.data;
        let id = file
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Permanent("asset response missing id".to_string()))?;
        Ok(AssetDescriptor {
            id,
            filename: file
                .get("filename_download")
                .and_then(Value::as_str)
                .map(str::to_string),
            url: file.get("url").and_then(Value::as_str).map(str::to_string),
        })
    }
}

fn classify_request_error(err: reqwest::Error) -> RemoteError {
    // A request that never produced a response is network-level trouble
    // unless we built it wrong.
    if err.is_builder() {
        RemoteError::Permanent(err.to_string())
    } else {
        RemoteError::Transient(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        RemoteError::Transient(detail)
    } else {
        RemoteError::Permanent(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, "").is_transient());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(classify_status(StatusCode::REQUEST_TIMEOUT, "").is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!classify_status(StatusCode::BAD_REQUEST, "validation failed").is_transient());
        assert!(!classify_status(StatusCode::NOT_FOUND, "").is_transient());
        assert!(!classify_status(StatusCode::CONFLICT, "").is_transient());
    }
}
