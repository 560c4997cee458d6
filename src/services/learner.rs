//! Learning stage.

use crate::llm::LlmProvider;
use crate::llm::prompts::{CASE_DELIMITER, LEARNING_SYSTEM_PROMPT, learning_prompt};
use crate::models::{CaseRecord, Feedback, FinalReport};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Turns a confirmed report into a `success_case` record.
pub struct Learner {
    llm: Arc<dyn LlmProvider>,
}

impl Learner {
    /// Creates a learner backed by `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Builds a learning record from a report the user confirmed.
    ///
    /// Returns `Ok(None)` without calling the model unless `feedback` is
    /// affirmative.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or returns nothing.
    #[instrument(skip(self, report), fields(operation = "create_learning_data", feedback = %feedback))]
    pub fn create_learning_data(
        &self,
        report: &FinalReport,
        feedback: Feedback,
    ) -> Result<Option<CaseRecord>> {
        if !feedback.is_affirmative() {
            tracing::debug!("No confirmation, skipping learning");
            return Ok(None);
        }

        let response = self
            .llm
            .complete_with_system(LEARNING_SYSTEM_PROMPT, &learning_prompt(report))?;
        let content = response.trim();
        if content.is_empty() {
            return Err(Error::OperationFailed {
                operation: "create_learning_data".to_string(),
                cause: "model returned an empty case description".to_string(),
            });
        }

        let content = if content.starts_with(CASE_DELIMITER) {
            content.to_string()
        } else {
            format!("{CASE_DELIMITER}\n{content}")
        };
        Ok(Some(CaseRecord::success_case(content)))
    }
}
