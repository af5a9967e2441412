//! Document processing pipeline: PDF extraction, segmentation, and metadata synthesis.

mod chunking;
mod extract;
mod prompts;
mod service;
pub mod types;

pub use service::{LlmHealthSnapshot, ProcessingApi, ProcessingService};
pub use types::{ChunkingError, DocumentMetadata, DocumentUpload, PipelineError};
