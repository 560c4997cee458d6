//! Knowledge-base case records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a knowledge-base entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    /// Hand-authored case inserted by `seed-case`.
    ManualTestCase,
    /// Model-generated starter case inserted by `seed-generate`.
    #[default]
    InitialData,
    /// Resolution confirmed by a user through the feedback prompt.
    SuccessCase,
}

impl CaseType {
    /// Returns all case types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ManualTestCase, Self::InitialData, Self::SuccessCase]
    }

    /// Returns the type as it is stored in index metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ManualTestCase => "manual_test_case",
            Self::InitialData => "initial_data",
            Self::SuccessCase => "success_case",
        }
    }

    /// Parses a stored type string.
    ///
    /// Returns `None` for anything outside the three known values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual_test_case" => Some(Self::ManualTestCase),
            "initial_data" => Some(Self::InitialData),
            "success_case" => Some(Self::SuccessCase),
            _ => None,
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata stored alongside a case's embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// Where the case came from.
    #[serde(rename = "type")]
    pub case_type: CaseType,
}

/// A stored unit of prior error/resolution knowledge.
///
/// The embedding is owned by the store; callers only ever see the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Free-text case description.
    pub content: String,
    /// Case metadata.
    pub metadata: CaseMetadata,
}

impl CaseRecord {
    /// Creates a case record.
    #[must_use]
    pub fn new(content: impl Into<String>, case_type: CaseType) -> Self {
        Self {
            content: content.into(),
            metadata: CaseMetadata { case_type },
        }
    }

    /// Creates a record for a user-confirmed resolution.
    #[must_use]
    pub fn success_case(content: impl Into<String>) -> Self {
        Self::new(content, CaseType::SuccessCase)
    }

    /// Returns the case type.
    #[must_use]
    pub const fn case_type(&self) -> CaseType {
        self.metadata.case_type
    }
}

/// Ranked output of one knowledge-base query.
///
/// At most `k` records, most similar first. Empty is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalResult {
    records: Vec<CaseRecord>,
}

impl RetrievalResult {
    /// Separator placed between record contents in the audit context.
    pub const CONTEXT_SEPARATOR: &'static str = "\n\n";

    /// Wraps ranked records.
    #[must_use]
    pub const fn new(records: Vec<CaseRecord>) -> Self {
        Self { records }
    }

    /// Returns an empty result.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Returns the ranked records.
    #[must_use]
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was retrieved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Concatenates record contents into the audit context.
    ///
    /// An empty result yields an empty string.
    #[must_use]
    pub fn context(&self) -> String {
        self.records
            .iter()
            .map(|r| r.content.trim())
            .collect::<Vec<_>>()
            .join(Self::CONTEXT_SEPARATOR)
    }

    /// Consumes the result, returning the records.
    #[must_use]
    pub fn into_records(self) -> Vec<CaseRecord> {
        self.records
    }
}
