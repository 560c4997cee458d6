//! Triage pipeline stages.
//!
//! Each stage owns one model interaction and maps its failures to a
//! stage-specific error variant. [`TriagePipeline`] sequences them.
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | [`Analyzer`] | raw error text | [`StructuredError`](crate::models::StructuredError) |
//! | [`Summarizer`] | structured error | [`SynthesizedQuery`](crate::models::SynthesizedQuery) |
//! | [`Retriever`] | search query | [`RetrievalResult`](crate::models::RetrievalResult) |
//! | [`Auditor`] | draft + context | [`FinalReport`](crate::models::FinalReport) |
//! | [`Learner`] | report + feedback | optional [`CaseRecord`](crate::models::CaseRecord) |

mod analyzer;
mod auditor;
mod learner;
mod pipeline;
mod retrieval;
mod scrub;
mod seeding;
mod summarizer;

pub use analyzer::Analyzer;
pub use auditor::Auditor;
pub use learner::Learner;
pub use pipeline::{TriagePipeline, TriageSession};
pub use retrieval::{DEFAULT_TOP_K, Retriever};
pub use scrub::{FALLBACK_QUERY, IdentifierSet, scrub_search_query};
pub use seeding::{
    DEFAULT_SEED_COUNT, MANUAL_TEST_CASE, SEED_TEMPERATURE, Seeder, seed_manual_case, split_cases,
};
pub use summarizer::Summarizer;

use crate::Error;

/// Wraps a model failure in a stage error.
///
/// Configuration errors pass through unchanged so a missing credential is
/// reported as such.
fn stage_error(wrap: fn(String) -> Error) -> impl Fn(Error) -> Error {
    move |e| match e {
        Error::Config(_) => e,
        other => wrap(other.to_string()),
    }
}

/// Maximum characters of model output quoted in an error message.
const EXCERPT_LEN: usize = 200;

/// Shortens model output for inclusion in an error message.
fn excerpt(response: &str) -> String {
    let trimmed = response.trim();
    if trimmed.chars().count() <= EXCERPT_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(EXCERPT_LEN).collect();
    format!("{cut}...")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("  short  "), "short");
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), EXCERPT_LEN + 3);
    }
}
