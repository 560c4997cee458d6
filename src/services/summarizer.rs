//! Query-synthesis stage.

use super::{excerpt, stage_error};
use super::scrub::scrub_search_query;
use crate::llm::prompts::{QUERY_SYNTHESIS_SYSTEM_PROMPT, query_synthesis_prompt};
use crate::llm::{LlmProvider, extract_fenced_block};
use crate::models::{StructuredError, SynthesizedQuery};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Produces a cause explanation, draft summary and abstract search query.
pub struct Summarizer {
    llm: Arc<dyn LlmProvider>,
}

impl Summarizer {
    /// Creates a summarizer backed by `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Synthesizes the query for a structured error.
    ///
    /// The model's `search_query` is scrubbed of identifiers taken from
    /// `structured`, falling back to the error type or `unknown error`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Summarization`] if the model call fails or its
    /// output cannot be parsed.
    #[instrument(skip(self, structured), fields(operation = "summarize", error_type = %structured.error_type))]
    pub fn summarize(&self, structured: &StructuredError) -> Result<SynthesizedQuery> {
        let analysis = serde_json::to_string_pretty(structured)
            .map_err(|e| Error::Summarization(e.to_string()))?;

        let response = self
            .llm
            .complete_with_system(QUERY_SYNTHESIS_SYSTEM_PROMPT, &query_synthesis_prompt(&analysis))
            .map_err(stage_error(Error::Summarization))?;

        let mut query: SynthesizedQuery = serde_json::from_str(extract_fenced_block(&response))
            .map_err(|e| {
                Error::Summarization(format!(
                    "model output is not a synthesized query ({e}): {}",
                    excerpt(&response)
                ))
            })?;

        let scrubbed = scrub_search_query(&query.search_query, structured);
        if scrubbed != query.search_query {
            tracing::debug!(
                proposed = %query.search_query,
                scrubbed = %scrubbed,
                "Scrubbed identifiers from search query"
            );
        }
        query.search_query = scrubbed;

        tracing::info!(search_query = %query.search_query, "Synthesized search query");
        Ok(query)
    }
}
