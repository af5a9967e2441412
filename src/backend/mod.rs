//! Client for the downstream backend that receives generated metadata.
//!
//! The backend expects a multipart request on `/modules/input` with a `json`
//! part carrying the metadata and a `file` part carrying the original upload.
//! A forwarding failure fails the whole request; the caller never receives
//! metadata the backend did not accept.

use crate::config::get_config;
use crate::pipeline::{DocumentMetadata, DocumentUpload};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the forwarding round-trip.
const FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced while forwarding results to the backend service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend could not be reached at the transport level.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),
    /// Backend answered with an error status.
    #[error("Backend rejected the forwarded document ({status}): {body}")]
    Rejected {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Response body captured for diagnostics.
        body: String,
    },
}

/// Interface implemented by metadata-forwarding backends.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Deliver the metadata together with the original upload.
    async fn forward(
        &self,
        metadata: &DocumentMetadata,
        upload: &DocumentUpload,
    ) -> Result<(), BackendError>;
}

/// Build the backend client configured for this process.
pub fn get_backend_client() -> Box<dyn BackendClient + Send + Sync> {
    Box::new(HttpBackendClient::new(
        get_config().backend_base_url.clone(),
    ))
}

/// [`BackendClient`] that posts multipart requests over HTTP.
pub struct HttpBackendClient {
    http: Client,
    base_url: String,
}

impl HttpBackendClient {
    /// Construct a client for the given backend base URL.
    pub fn new(base_url: String) -> Self {
        let http = Client::builder()
            .user_agent("docgist/0.1")
            .timeout(FORWARD_TIMEOUT)
            .build()
            .expect("Failed to construct reqwest::Client for backend");
        Self { http, base_url }
    }

    fn endpoint(&self) -> String {
        format!("{}/modules/input", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn forward(
        &self,
        metadata: &DocumentMetadata,
        upload: &DocumentUpload,
    ) -> Result<(), BackendError> {
        // Field names follow the backend contract, not our own schema.
        let payload = json!({
            "title": metadata.title,
            "tags": metadata.tags,
            "short": metadata.short_summary,
            "transcription": metadata.summary,
        });

        let json_part = Part::text(payload.to_string())
            .mime_str("application/json")
            .expect("static mime type parses");
        let file_part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.filename.clone())
            .mime_str(upload.content_type.as_deref().unwrap_or("application/pdf"))
            .map_err(|error| BackendError::Unreachable(format!("invalid content type: {error}")))?;
        let form = Form::new().part("json", json_part).part("file", file_part);

        let response = self
            .http
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|error| {
                BackendError::Unreachable(format!(
                    "failed to reach backend at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected { status, body });
        }

        tracing::debug!(filename = %upload.filename, "Forwarded metadata to backend");
        Ok(())
    }
}
