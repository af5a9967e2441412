//! HTTP surface for docgist.
//!
//! This module exposes a compact Axum router with three endpoints:
//!
//! - `POST /input` – Accept a PDF upload, run the document pipeline, forward the
//!   generated metadata to the backend, and return the metadata to the caller.
//! - `GET /health` – Report API liveness together with LLM provider reachability.
//! - `GET /metrics` – Observe processing counters.
//!
//! All pipeline failures are mapped to HTTP statuses here and nowhere else:
//! invalid uploads are 400, unreadable documents are 422, provider timeouts are
//! 504, and other upstream failures are 502.

use crate::llm::LlmError;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{DocumentMetadata, DocumentUpload, PipelineError, ProcessingApi};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Upper bound on the accepted request body; PDFs above this are rejected early.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build the HTTP router exposing the document processing surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/input", post(process_input::<S>))
        .route("/health", get(health_check::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Overall service status: `ok` or `degraded`.
    status: &'static str,
    /// LLM provider reachability: `reachable` or `unreachable`.
    llm: &'static str,
    /// Diagnostic captured from a failed provider probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    llm_error: Option<String>,
}

/// Report service health including LLM provider reachability.
///
/// Always answers 200; a provider outage is expressed through the `degraded`
/// status rather than a 5xx, so orchestrators keep the service itself alive.
async fn health_check<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: ProcessingApi,
{
    let snapshot = service.llm_health().await;
    if snapshot.reachable {
        Json(HealthResponse {
            status: "ok",
            llm: "reachable",
            llm_error: None,
        })
    } else {
        Json(HealthResponse {
            status: "degraded",
            llm: "unreachable",
            llm_error: snapshot.error,
        })
    }
}

/// Accept a PDF upload, run it through the pipeline, and return the metadata.
async fn process_input<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<DocumentMetadata>, AppError>
where
    S: ProcessingApi,
{
    let upload = read_upload(multipart).await?;
    let metadata = service.process_document(upload).await?;
    Ok(Json(metadata))
}

/// Pull the `file` part out of the multipart body and validate it.
async fn read_upload(mut multipart: Multipart) -> Result<DocumentUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::InvalidUpload(format!("malformed multipart body: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidUpload("file part is missing a filename".into()))?;
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AppError::InvalidUpload(
                "only PDF files are supported".into(),
            ));
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::InvalidUpload(format!("failed to read upload: {error}")))?;
        if bytes.is_empty() {
            return Err(AppError::InvalidUpload("uploaded file is empty".into()));
        }

        return Ok(DocumentUpload {
            filename,
            content_type,
            bytes,
        });
    }

    Err(AppError::InvalidUpload(
        "multipart body is missing a 'file' part".into(),
    ))
}

/// Return a concise metrics snapshot with processing counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

enum AppError {
    InvalidUpload(String),
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidUpload(message) => (StatusCode::BAD_REQUEST, message),
            Self::Pipeline(error) => (status_for_pipeline_error(&error), error.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn status_for_pipeline_error(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::UnreadablePdf(_) | PipelineError::EmptyDocument => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::Chunking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::Llm(LlmError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Llm(_) | PipelineError::Backend(_) => StatusCode::BAD_GATEWAY,
    }
}
