//! Core data types and error definitions for the processing pipeline.

use crate::backend::BackendError;
use crate::llm::LlmError;
use anyhow::Error as TokenizerError;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured metadata synthesized for a single document.
///
/// Built once per request after all LLM round-trips complete, returned to the
/// caller, and forwarded to the backend. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Concise document title.
    pub title: String,
    /// Detailed summary of the document contents.
    pub summary: String,
    /// Two-to-three sentence condensation of the key statements.
    pub short_summary: String,
    /// Keywords describing topics, contents, and document type, in the order
    /// the provider produced them.
    pub tags: Vec<String>,
}

/// One uploaded document; exists only for the duration of a single request.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Filename supplied by the client.
    pub filename: String,
    /// Content type supplied by the client, if any.
    pub content_type: Option<String>,
    /// Raw PDF bytes.
    pub bytes: Bytes,
}

/// Errors produced while turning extracted text into bounded segments.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Segmentation was configured with an impossible token budget.
    #[error("segment size must be greater than zero")]
    InvalidSegmentSize,
    /// Tokenizer resources were unavailable.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Model whose tokenizer we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors emitted by the document processing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Uploaded bytes could not be parsed as a PDF.
    #[error("Failed to read PDF: {0}")]
    UnreadablePdf(String),
    /// The PDF parsed but yielded no extractable text.
    #[error("Document contains no extractable text")]
    EmptyDocument,
    /// Segmentation step failed.
    #[error("Failed to segment document: {0}")]
    Chunking(#[from] ChunkingError),
    /// A metadata generation round-trip failed.
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
    /// Forwarding the result to the backend failed.
    #[error("Backend forwarding failed: {0}")]
    Backend(#[from] BackendError),
}
