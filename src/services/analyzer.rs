//! Structuring stage.

use super::{excerpt, stage_error};
use crate::llm::prompts::{STRUCTURING_SYSTEM_PROMPT, structuring_prompt};
use crate::llm::{LlmProvider, extract_fenced_block};
use crate::models::StructuredError;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Turns raw error text into a [`StructuredError`].
///
/// Holds no state between calls, so a deterministic model yields identical
/// output for identical input.
pub struct Analyzer {
    llm: Arc<dyn LlmProvider>,
}

impl Analyzer {
    /// Creates an analyzer backed by `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Structures the error text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Analysis`] if the model call fails or its output is
    /// not a JSON object. A configuration error from the model client is
    /// returned unchanged.
    #[instrument(skip(self, error_text), fields(operation = "analyze", input_len = error_text.len()))]
    pub fn analyze(&self, error_text: &str) -> Result<StructuredError> {
        let response = self
            .llm
            .complete_with_system(STRUCTURING_SYSTEM_PROMPT, &structuring_prompt(error_text))
            .map_err(stage_error(Error::Analysis))?;

        let structured = parse_structured(&response)?;
        tracing::info!(
            error_type = %structured.error_type,
            language = %structured.language,
            "Structured error"
        );
        Ok(structured)
    }
}

fn parse_structured(response: &str) -> Result<StructuredError> {
    let json = extract_fenced_block(response);
    serde_json::from_str(json).map_err(|e| {
        Error::Analysis(format!(
            "model output is not a structured error ({e}): {}",
            excerpt(response)
        ))
    })
}
