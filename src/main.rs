//! Binary entry point for errtriage.
//!
//! This binary provides the CLI interface for the errtriage assistant.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use errtriage::cli::{
    FeedbackSource, InputChoice, NoFeedback, TerminalFeedback, build_llm_provider, build_store,
    read_error_report, run_search, run_seed_case, run_seed_generate, run_triage, seeding_config,
};
use errtriage::config::{StoreBackend, TriageConfig};
use errtriage::observability;
use errtriage::services::{DEFAULT_SEED_COUNT, Seeder, TriagePipeline};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

/// errtriage - Retrieval-augmented error triage.
#[derive(Parser)]
#[command(name = "errtriage")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Knowledge store backend: pinecone or local.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Number of similar cases to retrieve.
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Skip the feedback prompt.
    #[arg(long)]
    no_feedback: bool,

    /// File containing the error text (ignored when stdin is redirected).
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Insert the built-in manual test case.
    SeedCase,

    /// Generate starter cases with the model and insert them.
    SeedGenerate {
        /// Number of cases to request.
        #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
        count: usize,
    },

    /// Query the knowledge base directly.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of results.
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to read .env: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration and applies command-line overrides.
fn load_config(cli: &Cli) -> errtriage::Result<TriageConfig> {
    let mut config = TriageConfig::load(cli.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(ref backend) = cli.backend {
        config = config.with_backend(StoreBackend::parse(backend)?);
    }
    if let Some(top_k) = cli.top_k {
        config = config.with_top_k(top_k);
    }
    Ok(config)
}

/// Runs the selected command.
fn run_command(cli: Cli, config: TriageConfig) -> errtriage::Result<()> {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();

    match cli.command {
        Some(Commands::SeedCase) => {
            let store = build_store(&config)?;
            run_seed_case(store.as_ref(), &mut stderr)
        },
        Some(Commands::SeedGenerate { count }) => {
            let seeder = Seeder::new(build_llm_provider(&seeding_config(&config.llm))?);
            let store = build_store(&config)?;
            run_seed_generate(&seeder, store.as_ref(), count, &mut stderr).map(|_| ())
        },
        Some(Commands::Search { query, limit }) => {
            let store = build_store(&config)?;
            run_search(store.as_ref(), &query, limit, &mut stdout).map(|_| ())
        },
        None => {
            let choice = InputChoice::select(cli.file.as_deref(), io::stdin().is_terminal());
            if choice == InputChoice::Missing {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "no error text: pipe it on stdin or pass a FILE",
                    )
                    .exit();
            }
            let report = read_error_report(choice, io::stdin().lock())?;

            let llm = build_llm_provider(&config.llm)?;
            let store = build_store(&config)?;
            let pipeline = TriagePipeline::new(llm, store, config.top_k);

            let mut feedback: Box<dyn FeedbackSource> = if choice.is_interactive() && !cli.no_feedback {
                Box::new(TerminalFeedback)
            } else {
                Box::new(NoFeedback)
            };
            run_triage(&pipeline, &report, feedback.as_mut(), &mut stdout, &mut stderr).map(|_| ())
        },
    }
}
