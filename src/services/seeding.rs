//! Knowledge-base seeding.
//!
//! A fresh index has nothing to retrieve. Seeding inserts one hand-written
//! case and, optionally, a batch of model-generated starter cases.

use crate::llm::LlmProvider;
use crate::llm::prompts::{CASE_DELIMITER, SEED_SYSTEM_PROMPT, seed_prompt};
use crate::models::{CaseRecord, CaseType};
use crate::storage::KnowledgeStore;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Default number of generated starter cases.
pub const DEFAULT_SEED_COUNT: usize = 5;

/// Sampling temperature for generated starter cases.
pub const SEED_TEMPERATURE: f32 = 0.7;

/// The built-in "command not found" case.
pub const MANUAL_TEST_CASE: &str = "Error resolution case:
Error: zsh: command not found: yyy
Cause: The command 'yyy' is not installed, or its install location is not on PATH.
Solution:
1. Check the command name for typos.
2. Check whether the tool is installed (for example with `brew list`).
3. If it is missing, install it with a package manager such as brew, apt, or pip.";

/// Upserts [`MANUAL_TEST_CASE`] as a `manual_test_case` record.
///
/// # Errors
///
/// Returns the store's error if the write fails.
#[instrument(skip(store), fields(operation = "seed_manual_case", store = store.name()))]
pub fn seed_manual_case(store: &dyn KnowledgeStore) -> Result<CaseRecord> {
    let record = CaseRecord::new(MANUAL_TEST_CASE, CaseType::ManualTestCase);
    store.upsert(std::slice::from_ref(&record))?;
    tracing::info!("Inserted manual test case");
    Ok(record)
}

/// Splits generated text into delimiter-prefixed case descriptions.
///
/// Text before the first delimiter (a model preamble such as "Here are
/// five cases:") and blank pieces are dropped.
#[must_use]
pub fn split_cases(text: &str) -> Vec<String> {
    text.split(CASE_DELIMITER)
        .skip(1)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| format!("{CASE_DELIMITER}\n{piece}"))
        .collect()
}

/// Generates starter cases with the model.
pub struct Seeder {
    llm: Arc<dyn LlmProvider>,
}

impl Seeder {
    /// Creates a seeder backed by `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Asks the model for `count` common errors with cause and fix.
    ///
    /// The model may return a different number of cases than requested;
    /// every delimited piece it returns is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or yields no cases.
    #[instrument(skip(self), fields(operation = "generate_initial_cases"))]
    pub fn generate_initial_cases(&self, count: usize) -> Result<Vec<CaseRecord>> {
        let response = self
            .llm
            .complete_with_system(SEED_SYSTEM_PROMPT, &seed_prompt(count))?;

        let cases: Vec<CaseRecord> = split_cases(&response)
            .into_iter()
            .map(|content| CaseRecord::new(content, CaseType::InitialData))
            .collect();

        if cases.is_empty() {
            return Err(Error::OperationFailed {
                operation: "generate_initial_cases".to_string(),
                cause: format!("model output contained no '{CASE_DELIMITER}' entries"),
            });
        }
        if cases.len() != count {
            tracing::debug!(requested = count, generated = cases.len(), "Case count differs");
        }
        Ok(cases)
    }

    /// Generates starter cases and upserts them.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if generation or the store write fails.
    pub fn seed_initial_data(&self, store: &dyn KnowledgeStore, count: usize) -> Result<usize> {
        let cases = self.generate_initial_cases(count)?;
        let written = store.upsert(&cases)?;
        tracing::info!(written, store = store.name(), "Inserted initial cases");
        Ok(written)
    }
}
