//! CLI command implementations.
//!
//! This module provides the command-line interface for errtriage. The binary
//! parses arguments with `clap` and delegates here.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `errtriage [FILE]` | Triage error text from stdin or `FILE` |
//! | `seed-case` | Insert the built-in manual test case |
//! | `seed-generate` | Generate and insert starter cases |
//! | `search` | Query the knowledge base directly |
//!
//! # Example Usage
//!
//! ```bash
//! # Triage piped output
//! python app.py 2>&1 | errtriage
//!
//! # Triage a saved log and answer the feedback prompt
//! errtriage error.log
//!
//! # Inspect what the knowledge base returns
//! errtriage search "command not found" --limit 5
//! ```
//!
//! # Factories
//!
//! The `llm_factory` and `store_factory` submodules build the model client
//! and knowledge store from [`TriageConfig`](crate::config::TriageConfig).

mod feedback;
mod input;
mod llm_factory;
mod store_factory;
mod triage;

pub use feedback::{FEEDBACK_QUESTION, FeedbackSource, LineFeedback, NoFeedback, TerminalFeedback};
pub use input::{InputChoice, read_error_report};
pub use llm_factory::{
    build_anthropic_client, build_http_config, build_llm_provider, build_ollama_client,
    build_openai_client, seeding_config,
};
pub use store_factory::{build_openai_embedder, build_store};
pub use triage::{TriageOutcome, run_search, run_seed_case, run_seed_generate, run_triage};
