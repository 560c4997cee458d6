//! # errtriage
//!
//! Retrieval-augmented error triage for the command line.
//!
//! errtriage takes raw error output, asks a language model to structure it,
//! searches a vector-indexed knowledge base of past error/solution cases, and
//! has the model merge what it found into a beginner-friendly report. When a
//! user confirms the fix worked, the resolution is written back to the
//! knowledge base so the next search can find it.
//!
//! ## Pipeline
//!
//! | Stage | Type | Output |
//! |-------|------|--------|
//! | Structuring | [`services::Analyzer`] | [`StructuredError`] |
//! | Query synthesis | [`services::Summarizer`] | [`SynthesizedQuery`] |
//! | Retrieval | [`services::Retriever`] | [`RetrievalResult`] |
//! | Synthesis audit | [`services::Auditor`] | [`FinalReport`] |
//! | Learning | [`services::Learner`] | optional [`CaseRecord`] |
//!
//! ## Example
//!
//! ```rust,ignore
//! use errtriage::{ErrorReport, InputOrigin, TriagePipeline};
//!
//! let pipeline = TriagePipeline::new(llm, store, 3);
//! let report = ErrorReport::new("zsh: command not found: yyy", InputOrigin::Stdin)?;
//! let session = pipeline.run(&report)?;
//! println!("{}", session.report().render());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::TriageConfig;
pub use embedding::Embedder;
pub use llm::LlmProvider;
pub use models::{
    CaseRecord, CaseType, ErrorReport, Feedback, FinalReport, InputOrigin, RetrievalResult,
    StructuredError, SynthesizedQuery,
};
pub use services::{TriagePipeline, TriageSession};
pub use storage::KnowledgeStore;

/// Error type for errtriage operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Config` | Missing API keys or index name, unreadable config file |
/// | `Analysis` | Structuring output is not the expected JSON object |
/// | `Summarization` | Query-synthesis output is not the expected JSON object |
/// | `Audit` | Audit output is empty or lacks the required report sections |
/// | `InvalidInput` | Empty error text, embedding dimension mismatch |
/// | `OperationFailed` | HTTP transport, file I/O, or vector store failures |
///
/// An empty retrieval result is never an error.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Required configuration is missing or malformed.
    ///
    /// Raised when:
    /// - `PINECONE_API_KEY` or `PINECONE_INDEX_NAME` is absent
    /// - A provider that needs an API key has none
    /// - The TOML config file cannot be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// The structuring stage could not produce a [`StructuredError`].
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// The query-synthesis stage could not produce a [`SynthesizedQuery`].
    #[error("summarization failed: {0}")]
    Summarization(String),

    /// The synthesis-audit stage could not produce a [`FinalReport`].
    #[error("audit failed: {0}")]
    Audit(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - An HTTP request fails or returns a non-success status
    /// - A response body cannot be decoded
    /// - The local store file cannot be read or written
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for errtriage operations.
pub type Result<T> = std::result::Result<T, Error>;
