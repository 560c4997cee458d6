//! LLM client factory functions for CLI commands.
//!
//! Provides builders for creating LLM clients from configuration.

use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::Result;
use crate::config::{LlmConfig, LlmProvider as Provider};
use crate::llm::{AnthropicClient, LlmHttpConfig, LlmProvider, OllamaClient, OpenAiClient};
use crate::services::SEED_TEMPERATURE;

/// Builds HTTP configuration from LLM config.
#[must_use]
pub fn build_http_config(llm_config: &LlmConfig) -> LlmHttpConfig {
    LlmHttpConfig::from_config(llm_config)
}

/// Builds an `OpenAI` client from configuration.
#[must_use]
pub fn build_openai_client(llm_config: &LlmConfig) -> OpenAiClient {
    let mut client = OpenAiClient::new().with_temperature(llm_config.temperature);
    if let Some(ref api_key) = llm_config.api_key {
        client = client.with_api_key(api_key.expose_secret());
    }
    if let Some(ref model) = llm_config.model {
        client = client.with_model(model);
    }
    if let Some(ref base_url) = llm_config.base_url {
        client = client.with_endpoint(base_url);
    }
    client.with_http_config(build_http_config(llm_config))
}

/// Builds an Anthropic client from configuration.
#[must_use]
pub fn build_anthropic_client(llm_config: &LlmConfig) -> AnthropicClient {
    let mut client = AnthropicClient::new().with_temperature(llm_config.temperature);
    if let Some(ref api_key) = llm_config.api_key {
        client = client.with_api_key(api_key.expose_secret());
    }
    if let Some(ref model) = llm_config.model {
        client = client.with_model(model);
    }
    if let Some(ref base_url) = llm_config.base_url {
        client = client.with_endpoint(base_url);
    }
    client.with_http_config(build_http_config(llm_config))
}

/// Builds an Ollama client from configuration.
#[must_use]
pub fn build_ollama_client(llm_config: &LlmConfig) -> OllamaClient {
    let mut client = OllamaClient::new().with_temperature(llm_config.temperature);
    if let Some(ref model) = llm_config.model {
        client = client.with_model(model);
    }
    if let Some(ref base_url) = llm_config.base_url {
        client = client.with_endpoint(base_url);
    }
    client.with_http_config(build_http_config(llm_config))
}

/// Builds the configured LLM provider.
///
/// Hosted providers must have a usable API key before any stage runs.
///
/// # Errors
///
/// Returns [`Error::Config`](crate::Error::Config) if the selected provider
/// needs an API key and none (or a malformed one) is configured.
pub fn build_llm_provider(llm_config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    tracing::debug!(provider = ?llm_config.provider, model = ?llm_config.model, "Building LLM provider");
    Ok(match llm_config.provider {
        Provider::OpenAi => {
            let client = build_openai_client(llm_config);
            client.validate()?;
            Arc::new(client)
        },
        Provider::Anthropic => {
            let client = build_anthropic_client(llm_config);
            client.validate()?;
            Arc::new(client)
        },
        Provider::Ollama => Arc::new(build_ollama_client(llm_config)),
    })
}

/// Returns `llm_config` adjusted for generating starter cases.
#[must_use]
pub fn seeding_config(llm_config: &LlmConfig) -> LlmConfig {
    LlmConfig {
        temperature: SEED_TEMPERATURE,
        ..llm_config.clone()
    }
}
