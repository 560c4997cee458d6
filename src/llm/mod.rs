//! LLM client abstraction.
//!
//! Every pipeline stage talks to a model through [`LlmProvider`] only, so a
//! deterministic stub can stand in for a real provider in tests.

mod anthropic;
mod ollama;
mod openai;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::Result;
use std::time::Duration;

/// Trait for LLM providers.
pub trait LlmProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion with a system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    ///
    /// Default implementation concatenates system and user prompts.
    /// Providers should override this to use native system prompt support.
    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        let combined = format!("{system}\n\n---\n\nUser message:\n{user}");
        self.complete(&combined)
    }
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from config settings.
    #[must_use]
    pub fn from_config(config: &crate::config::LlmConfig) -> Self {
        let mut settings = Self::default();
        if let Some(timeout_ms) = config.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = config.connect_timeout_ms {
            settings.connect_timeout_ms = connect_timeout_ms;
        }
        settings
    }
}

/// Builds a blocking HTTP client with configured timeouts.
///
/// Shared by the LLM, embedding, and Pinecone clients.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Classifies a transport error for logging.
pub(crate) fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else if e.is_decode() {
        "decode"
    } else {
        "unknown"
    }
}

/// Extracts the payload of a fenced code block from model output.
///
/// If the text contains a ```` ``` ```` fence (labeled `json` or not), the
/// first block's inner text is returned trimmed. A missing closing fence
/// takes everything after the opening one. Without a fence the whole
/// input is returned trimmed.
#[must_use]
pub fn extract_fenced_block(response: &str) -> &str {
    const FENCE: &str = "```";

    let trimmed = response.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let after = &trimmed[open + FENCE.len()..];
    let body = match after.find('\n') {
        Some(newline) if is_info_string(&after[..newline]) => &after[newline + 1..],
        _ => strip_json_label(after),
    };

    body.find(FENCE).map_or(body, |end| &body[..end]).trim()
}

/// Returns true for a fence info string such as `json` or `JSON`.
fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Drops a leading `json` label from a single-line fenced block.
fn strip_json_label(s: &str) -> &str {
    match s.get(..4) {
        Some(label) if label.eq_ignore_ascii_case("json") => &s[4..],
        _ => s,
    }
}
