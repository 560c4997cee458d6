//! Stage sequencing and the per-run session.

use super::{Analyzer, Auditor, Learner, Retriever, Summarizer};
use crate::Result;
use crate::llm::LlmProvider;
use crate::models::{
    CaseRecord, ErrorReport, Feedback, FinalReport, RetrievalResult, StructuredError,
    SynthesizedQuery,
};
use crate::storage::KnowledgeStore;
use std::sync::Arc;
use tracing::instrument;

/// Runs structuring, query synthesis, retrieval, and audit in order.
///
/// The pipeline holds no per-run state. Each [`run`](Self::run) yields a
/// fresh [`TriageSession`].
pub struct TriagePipeline {
    analyzer: Analyzer,
    summarizer: Summarizer,
    retriever: Retriever,
    auditor: Auditor,
    learner: Learner,
    store: Arc<dyn KnowledgeStore>,
}

impl TriagePipeline {
    /// Wires every stage to the same model and store.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, store: Arc<dyn KnowledgeStore>, top_k: usize) -> Self {
        Self {
            analyzer: Analyzer::new(Arc::clone(&llm)),
            summarizer: Summarizer::new(Arc::clone(&llm)),
            retriever: Retriever::new(Arc::clone(&store), top_k),
            auditor: Auditor::new(Arc::clone(&llm)),
            learner: Learner::new(llm),
            store,
        }
    }

    /// Triages one error report.
    ///
    /// A failing stage aborts the run; no report is produced.
    ///
    /// # Errors
    ///
    /// Returns the first stage error encountered.
    #[instrument(skip(self, report), fields(operation = "triage", origin = %report.origin()))]
    pub fn run(&self, report: &ErrorReport) -> Result<TriageSession<'_>> {
        tracing::info!("Structuring error");
        let structured = self.analyzer.analyze(report.text())?;

        tracing::info!("Synthesizing search query");
        let query = self.summarizer.summarize(&structured)?;

        tracing::info!("Searching knowledge base");
        let retrieval = self.retriever.retrieve(&query)?;

        tracing::info!("Auditing report");
        let final_report = self.auditor.audit(&query, &retrieval)?;

        Ok(TriageSession {
            pipeline: self,
            structured,
            query,
            retrieval,
            report: final_report,
        })
    }
}

/// Outcome of one pipeline run.
///
/// [`learn`](Self::learn) consumes the session, so a run writes at most one
/// learning record.
pub struct TriageSession<'a> {
    pipeline: &'a TriagePipeline,
    structured: StructuredError,
    query: SynthesizedQuery,
    retrieval: RetrievalResult,
    report: FinalReport,
}

impl TriageSession<'_> {
    /// The structured error.
    #[must_use]
    pub const fn structured(&self) -> &StructuredError {
        &self.structured
    }

    /// The synthesized query.
    #[must_use]
    pub const fn query(&self) -> &SynthesizedQuery {
        &self.query
    }

    /// The retrieved cases.
    #[must_use]
    pub const fn retrieval(&self) -> &RetrievalResult {
        &self.retrieval
    }

    /// The final report.
    #[must_use]
    pub const fn report(&self) -> &FinalReport {
        &self.report
    }

    /// Records the resolution when `feedback` is affirmative.
    ///
    /// Returns the stored record, or `None` when nothing was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the learning stage or the store write fails.
    #[instrument(skip(self), fields(operation = "learn"))]
    pub fn learn(self, feedback: Feedback) -> Result<Option<CaseRecord>> {
        let Some(record) = self
            .pipeline
            .learner
            .create_learning_data(&self.report, feedback)?
        else {
            return Ok(None);
        };

        self.pipeline
            .store
            .upsert(std::slice::from_ref(&record))?;
        tracing::info!(store = self.pipeline.store.name(), "Recorded resolution");
        Ok(Some(record))
    }
}
