//! Command implementations.
//!
//! Each command writes its result to `out` and status lines to `status`, so
//! tests can capture both streams.

use std::io::Write;

use crate::models::{CaseRecord, ErrorReport};
use crate::services::{Seeder, TriagePipeline, seed_manual_case};
use crate::storage::KnowledgeStore;
use crate::{Error, Result};

use super::feedback::FeedbackSource;

/// Result of one `errtriage [FILE]` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageOutcome {
    /// The learning record written, if the user confirmed the fix.
    pub learned: Option<CaseRecord>,
}

fn io_error(operation: &str) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// Triages `report`, prints the final report, then asks for feedback.
///
/// Nothing is written to `out` unless every stage succeeds.
///
/// # Errors
///
/// Returns the first pipeline error, or an error if the output streams
/// cannot be written.
pub fn run_triage<O, S, F>(
    pipeline: &TriagePipeline,
    report: &ErrorReport,
    feedback: &mut F,
    out: &mut O,
    status: &mut S,
) -> Result<TriageOutcome>
where
    O: Write,
    S: Write,
    F: FeedbackSource + ?Sized,
{
    writeln!(status, "Analyzing error from {}...", report.origin()).map_err(io_error("write_status"))?;
    let session = pipeline.run(report)?;

    if session.retrieval().is_empty() {
        writeln!(status, "No similar cases found in the knowledge base.")
            .map_err(io_error("write_status"))?;
    } else {
        writeln!(status, "Found {} similar case(s).", session.retrieval().len())
            .map_err(io_error("write_status"))?;
    }

    write!(out, "{}", session.report().render()).map_err(io_error("write_report"))?;
    out.flush().map_err(io_error("write_report"))?;

    if !feedback.is_interactive() {
        tracing::debug!("Non-interactive run, skipping feedback");
        return Ok(TriageOutcome { learned: None });
    }

    let answer = feedback.ask();
    let learned = session.learn(answer)?;
    if learned.is_some() {
        writeln!(status, "Saved the resolution to the knowledge base.")
            .map_err(io_error("write_status"))?;
    }
    Ok(TriageOutcome { learned })
}

/// Inserts the built-in manual test case.
///
/// # Errors
///
/// Returns an error if the store write fails.
pub fn run_seed_case<S: Write>(store: &dyn KnowledgeStore, status: &mut S) -> Result<()> {
    seed_manual_case(store)?;
    writeln!(status, "Inserted the manual test case into the {} store.", store.name())
        .map_err(io_error("write_status"))
}

/// Generates `count` starter cases and inserts them.
///
/// # Errors
///
/// Returns an error if generation or the store write fails.
pub fn run_seed_generate<S: Write>(
    seeder: &Seeder,
    store: &dyn KnowledgeStore,
    count: usize,
    status: &mut S,
) -> Result<usize> {
    writeln!(status, "Generating {count} starter case(s)...").map_err(io_error("write_status"))?;
    let written = seeder.seed_initial_data(store, count)?;
    writeln!(status, "Inserted {written} case(s) into the {} store.", store.name())
        .map_err(io_error("write_status"))?;
    Ok(written)
}

/// Prints the raw top-`limit` matches for `query`.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub fn run_search<O: Write>(
    store: &dyn KnowledgeStore,
    query: &str,
    limit: usize,
    out: &mut O,
) -> Result<usize> {
    let hits = store.query(query, limit)?;
    if hits.is_empty() {
        writeln!(out, "No matching cases.").map_err(io_error("write_results"))?;
        return Ok(0);
    }
    for (rank, record) in hits.iter().enumerate() {
        writeln!(out, "{}. [{}]\n{}\n", rank + 1, record.case_type(), record.content.trim())
            .map_err(io_error("write_results"))?;
    }
    Ok(hits.len())
}
