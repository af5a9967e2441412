//! Abstractions for generating document metadata via a local LLM provider.
//!
//! The pipeline talks to the provider through the [`LlmProvider`] trait so that
//! tests can substitute doubles. The Ollama-backed adapter issues HTTP requests
//! directly to the runtime; no retries or backoff are attempted, failures are
//! surfaced to the caller as-is.

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on a single generation round-trip.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
/// Upper bound on the connectivity probe issued by `/health`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced while talking to the LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider could not be reached at the transport level.
    #[error("LLM provider unreachable: {0}")]
    Unreachable(String),
    /// Provider did not answer within the fixed request timeout.
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
    /// Provider returned an error response.
    #[error("LLM generation failed: {0}")]
    Generation(String),
    /// Provider response could not be parsed.
    #[error("Malformed LLM response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by metadata-generation providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a single prompt through the configured model and return the completion.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Issue a lightweight request to verify the provider is reachable.
    async fn check_connection(&self) -> Result<(), LlmError>;
}

/// Build the LLM provider configured for this process.
pub fn get_llm_provider() -> Box<dyn LlmProvider + Send + Sync> {
    let config = get_config();
    Box::new(OllamaProvider::new(
        config.ollama_base_url.clone(),
        config.ollama_model.clone(),
    ))
}

/// [`LlmProvider`] backed by the Ollama HTTP API.
pub struct OllamaProvider {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Construct a provider for the given Ollama base URL and model identifier.
    pub fn new(base_url: String, model: String) -> Self {
        let http = Client::builder()
            .user_agent("docgist/0.1")
            .timeout(GENERATE_TIMEOUT)
            .build()
            .expect("Failed to construct reqwest::Client for Ollama");
        Self {
            http,
            base_url,
            model,
        }
    }

    fn generate_endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn tags_endpoint(&self) -> String {
        format!("{}/api/tags", self.base_url.trim_end_matches('/'))
    }

    fn map_transport_error(error: reqwest::Error, base_url: &str) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(GENERATE_TIMEOUT)
        } else {
            LlmError::Unreachable(format!("failed to reach Ollama at {base_url}: {error}"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                // Lower temperature for stable titles and tags.
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.generate_endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| Self::map_transport_error(error, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Generation(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaGenerateResponse = response.json().await.map_err(|error| {
            LlmError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(LlmError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        let completion = body.response.trim().to_string();
        if completion.is_empty() {
            return Err(LlmError::InvalidResponse(
                "Ollama returned an empty completion".into(),
            ));
        }

        Ok(completion)
    }

    async fn check_connection(&self) -> Result<(), LlmError> {
        let response = self
            .http
            .get(self.tags_endpoint())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|error| Self::map_transport_error(error, &self.base_url))?;

        if !response.status().is_success() {
            return Err(LlmError::Generation(format!(
                "Ollama probe returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Method::POST, MockServer};

    fn provider_for(server: &MockServer) -> OllamaProvider {
        OllamaProvider::new(server.base_url(), "llama3.1".into())
    }

    #[tokio::test]
    async fn generate_returns_trimmed_completion() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "  A Concise Title \n",
                    "done": true
                }));
            })
            .await;

        let completion = provider_for(&server)
            .generate("Generate a title")
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(completion, "A Concise Title");
    }

    #[tokio::test]
    async fn generate_surfaces_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = provider_for(&server)
            .generate("Generate a title")
            .await
            .expect_err("error response");

        assert!(matches!(error, LlmError::Generation(message) if message.contains("500")));
    }

    #[tokio::test]
    async fn generate_rejects_incomplete_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "partial",
                    "done": false
                }));
            })
            .await;

        let error = provider_for(&server)
            .generate("Generate a title")
            .await
            .expect_err("incomplete response");

        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn generate_rejects_empty_completion() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "   ",
                    "done": true
                }));
            })
            .await;

        let error = provider_for(&server)
            .generate("Generate a title")
            .await
            .expect_err("empty completion");

        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn check_connection_succeeds_against_tags_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200).json_body(json!({ "models": [] }));
            })
            .await;

        provider_for(&server)
            .check_connection()
            .await
            .expect("probe succeeds");
        mock.assert();
    }

    #[tokio::test]
    async fn check_connection_reports_unreachable_provider() {
        // Port 1 is reserved and nothing listens on it.
        let provider = OllamaProvider::new("http://127.0.0.1:1".into(), "llama3.1".into());
        let error = provider
            .check_connection()
            .await
            .expect_err("unreachable provider");
        assert!(matches!(
            error,
            LlmError::Unreachable(_) | LlmError::Timeout(_)
        ));
    }
}
