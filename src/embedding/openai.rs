//! `OpenAI` embeddings client.

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::llm::{LlmHttpConfig, build_http_client, error_kind};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Embedder backed by the `OpenAI` embeddings API.
pub struct OpenAiEmbedder {
    /// API key.
    api_key: Option<SecretString>,
    /// API endpoint.
    endpoint: String,
    /// Embedding model.
    model: String,
    /// Requested output dimensions.
    dimensions: usize,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiEmbedder {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default embedding model.
    pub const DEFAULT_MODEL: &'static str = "text-embedding-3-small";

    /// Creates an embedder with no API key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: None,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the output dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets HTTP client timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    fn validate(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))
    }

    fn request(&self, input: &[&str]) -> Result<Vec<Vec<f32>>> {
        let api_key = self.validate()?;

        tracing::debug!(
            provider = "openai",
            model = %self.model,
            inputs = input.len(),
            "Requesting embeddings"
        );

        let request = EmbeddingRequest {
            model: &self.model,
            input,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| {
                let kind = error_kind(&e);
                tracing::error!(
                    provider = "openai",
                    model = %self.model,
                    error = %e,
                    error_kind = kind,
                    "Embedding request failed"
                );
                Error::OperationFailed {
                    operation: "openai_embeddings".to_string(),
                    cause: format!("{kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = "openai",
                model = %self.model,
                status = %status,
                "Embedding API returned error status"
            );
            return Err(Error::OperationFailed {
                operation: "openai_embeddings".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let mut response: EmbeddingResponse =
            response.json().map_err(|e| Error::OperationFailed {
                operation: "openai_embeddings_response".to_string(),
                cause: e.to_string(),
            })?;

        if response.data.len() != input.len() {
            return Err(Error::OperationFailed {
                operation: "openai_embeddings_response".to_string(),
                cause: format!(
                    "expected {} embeddings, got {}",
                    input.len(),
                    response.data.len()
                ),
            });
        }

        response.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(Error::InvalidInput(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                bad.len()
            )));
        }
        Ok(vectors)
    }
}

impl Default for OpenAiEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::OperationFailed {
                operation: "openai_embeddings_response".to_string(),
                cause: "No embedding in response".to_string(),
            })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }
}

/// Request to the embeddings API.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

/// Response from the embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_defaults() {
        let embedder = OpenAiEmbedder::new();
        assert_eq!(embedder.dimensions(), 1024);
        assert_eq!(embedder.model, "text-embedding-3-small");
        assert_eq!(embedder.endpoint, "https://api.openai.com/v1");
    }

    #[test]
    fn test_embed_without_key_fails_before_network() {
        let embedder = OpenAiEmbedder::new().with_endpoint("http://127.0.0.1:9");
        assert!(matches!(embedder.embed("hello"), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_batch_skips_request() {
        let embedder = OpenAiEmbedder::new();
        let result = embedder.embed_batch(&[]);
        assert!(matches!(result, Ok(ref v) if v.is_empty()));
    }

    #[test]
    fn test_request_serialization() {
        let input = ["a", "b"];
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: 1024,
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(json["input"][1], "b");
        assert_eq!(json["dimensions"], 1024);
    }
}
