//! Processing service coordinating extraction, segmentation, generation, and forwarding.

use crate::{
    backend::{BackendClient, get_backend_client},
    config::get_config,
    llm::{LlmProvider, get_llm_provider},
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        chunking::{chunk_text, determine_segment_size},
        extract::extract_text,
        prompts,
        types::{DocumentMetadata, DocumentUpload, PipelineError},
    },
};
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinates the full document pipeline: PDF text extraction, segmentation,
/// LLM metadata synthesis, and backend forwarding.
///
/// The service owns long-lived handles to the LLM provider, the backend client,
/// and the metrics registry. Construct it once near process start and share it
/// through an `Arc`.
pub struct ProcessingService {
    llm: Box<dyn LlmProvider + Send + Sync>,
    backend: Box<dyn BackendClient + Send + Sync>,
    metrics: Arc<PipelineMetrics>,
}

/// Reachability snapshot for the LLM provider surfaced by `/health`.
#[derive(Debug, Clone)]
pub struct LlmHealthSnapshot {
    /// Indicates whether the provider answered the connectivity probe.
    pub reachable: bool,
    /// Optional diagnostic string captured when the provider is unreachable.
    pub error: Option<String>,
}

/// Abstraction over the document pipeline used by the HTTP surface.
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Run one uploaded document through the pipeline and forward the result.
    async fn process_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<DocumentMetadata, PipelineError>;

    /// Probe the LLM provider for the health endpoint.
    async fn llm_health(&self) -> LlmHealthSnapshot;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build a processing service wired to the configured Ollama runtime and backend.
    pub fn new() -> Self {
        Self::with_clients(get_llm_provider(), get_backend_client())
    }

    /// Build a processing service from explicit clients.
    pub fn with_clients(
        llm: Box<dyn LlmProvider + Send + Sync>,
        backend: Box<dyn BackendClient + Send + Sync>,
    ) -> Self {
        Self {
            llm,
            backend,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Extract, segment, synthesize metadata, and forward one document.
    ///
    /// Exactly one metadata result is produced per document regardless of how
    /// many segments the text splits into. A backend forwarding failure fails
    /// the request; the caller never sees metadata the backend rejected.
    pub async fn process_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<DocumentMetadata, PipelineError> {
        let result = self.run_pipeline(&upload).await;
        if result.is_err() {
            self.metrics.record_failure();
        }
        result
    }

    async fn run_pipeline(
        &self,
        upload: &DocumentUpload,
    ) -> Result<DocumentMetadata, PipelineError> {
        tracing::info!(
            filename = %upload.filename,
            size = upload.bytes.len(),
            "Processing document"
        );

        let text = extract_text(&upload.bytes)?;

        let config = get_config();
        let segment_size =
            determine_segment_size(config.text_splitter_chunk_size, &config.ollama_model);
        let overlap = config.text_splitter_chunk_overlap.unwrap_or(0);
        let segments = chunk_text(&text, segment_size, overlap, &config.ollama_model)?;
        if segments.is_empty() {
            return Err(PipelineError::EmptyDocument);
        }
        tracing::debug!(
            segments = segments.len(),
            segment_size,
            overlap,
            "Segmented document"
        );

        let title = self
            .llm
            .generate(&prompts::title_prompt(&prompts::excerpt(
                &segments,
                prompts::TITLE_SEGMENTS,
            )))
            .await?;
        let summary = self
            .llm
            .generate(&prompts::summary_prompt(&prompts::excerpt(
                &segments,
                prompts::SUMMARY_SEGMENTS,
            )))
            .await?;
        let short_summary = self
            .llm
            .generate(&prompts::short_summary_prompt(&prompts::excerpt(
                &segments,
                prompts::SHORT_SUMMARY_SEGMENTS,
            )))
            .await?;
        let tags = prompts::parse_tags(
            &self
                .llm
                .generate(&prompts::tags_prompt(&prompts::excerpt(
                    &segments,
                    prompts::TAG_SEGMENTS,
                )))
                .await?,
        );

        let metadata = DocumentMetadata {
            title,
            summary,
            short_summary,
            tags,
        };

        self.backend.forward(&metadata, upload).await?;

        self.metrics.record_document(segments.len() as u64);
        tracing::info!(
            filename = %upload.filename,
            segments = segments.len(),
            tags = metadata.tags.len(),
            "Document processed"
        );

        Ok(metadata)
    }

    /// Probe the LLM provider and surface a health snapshot.
    pub async fn llm_health(&self) -> LlmHealthSnapshot {
        match self.llm.check_connection().await {
            Ok(()) => LlmHealthSnapshot {
                reachable: true,
                error: None,
            },
            Err(error) => {
                tracing::warn!(error = %error, "LLM health probe failed");
                LlmHealthSnapshot {
                    reachable: false,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    /// Return the current processing metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn process_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<DocumentMetadata, PipelineError> {
        ProcessingService::process_document(self, upload).await
    }

    async fn llm_health(&self) -> LlmHealthSnapshot {
        ProcessingService::llm_health(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}
