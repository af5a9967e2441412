#![deny(missing_docs)]

//! Core library for the docgist document metadata service.

/// HTTP routing and REST handlers.
pub mod api;
/// Client for the downstream backend that receives generated metadata.
pub mod backend;
/// Environment-driven configuration management.
pub mod config;
/// LLM provider abstraction and the Ollama adapter.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Processing metrics helpers.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod pipeline;
