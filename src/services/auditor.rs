//! Synthesis-audit stage.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use super::{excerpt, stage_error};
use crate::llm::LlmProvider;
use crate::llm::prompts::{AUDIT_SYSTEM_PROMPT, audit_prompt};
use crate::models::{FinalReport, RetrievalResult, SynthesizedQuery};
use crate::{Error, Result};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::instrument;

/// A `## [n] ...` section heading, any heading level.
static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*\[([1-4])\][^\n]*$").expect("static regex: section heading")
});

/// Merges the draft explanation with retrieved cases into a [`FinalReport`].
///
/// The retrieved context is the only source the model may cite. When the
/// context is empty the reference section is dropped whatever the model
/// returns. Never touches the store.
pub struct Auditor {
    llm: Arc<dyn LlmProvider>,
}

impl Auditor {
    /// Creates an auditor backed by `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produces the final report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audit`] if the model call fails, returns nothing, or
    /// omits one of the first three sections.
    #[instrument(skip(self, draft, context), fields(operation = "audit", context_cases = context.len()))]
    pub fn audit(&self, draft: &SynthesizedQuery, context: &RetrievalResult) -> Result<FinalReport> {
        let draft_json =
            serde_json::to_string_pretty(draft).map_err(|e| Error::Audit(e.to_string()))?;

        let response = self
            .llm
            .complete_with_system(AUDIT_SYSTEM_PROMPT, &audit_prompt(&draft_json, &context.context()))
            .map_err(stage_error(Error::Audit))?;

        let mut report = parse_report(&response)?;
        if context.is_empty() && report.references.take().is_some() {
            tracing::debug!("Dropped reference section for empty context");
        }

        tracing::info!(has_references = report.has_references(), "Audited report");
        Ok(report)
    }
}

/// Splits model output into the four report sections.
fn parse_report(response: &str) -> Result<FinalReport> {
    if response.trim().is_empty() {
        return Err(Error::Audit("model returned an empty report".to_string()));
    }

    let headings: Vec<(usize, usize, usize)> = SECTION_HEADING
        .captures_iter(response)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((number, whole.start(), whole.end()))
        })
        .collect();

    let mut sections: [Option<String>; 4] = Default::default();
    for (i, &(number, _, body_start)) in headings.iter().enumerate() {
        let body_end = headings.get(i + 1).map_or(response.len(), |next| next.1);
        let body = response[body_start..body_end].trim();
        let slot = &mut sections[number - 1];
        if slot.is_none() && !body.is_empty() {
            *slot = Some(body.to_string());
        }
    }

    let [overview, technical_detail, remediation, references] = sections;
    let require = |section: Option<String>, heading: &str| {
        section.ok_or_else(|| {
            Error::Audit(format!(
                "report is missing section '{heading}': {}",
                excerpt(response)
            ))
        })
    };

    Ok(FinalReport {
        overview: require(overview, FinalReport::OVERVIEW_HEADING)?,
        technical_detail: require(technical_detail, FinalReport::TECHNICAL_HEADING)?,
        remediation: require(remediation, FinalReport::REMEDIATION_HEADING)?,
        references,
    })
}
