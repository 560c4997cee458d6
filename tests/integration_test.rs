//! Integration tests for errtriage.
#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use errtriage::cli::{build_store, run_search, run_seed_case};
use errtriage::config::{CONFIG_PATH_ENV, LlmProvider, StoreBackend, TriageConfig};
use errtriage::observability::LogFormat;
use errtriage::{CaseType, Error, ErrorReport, InputOrigin};
use tempfile::{NamedTempFile, TempDir};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("empty error text".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("empty error text"));

    let err = Error::OperationFailed {
        operation: "pinecone_query".to_string(),
        cause: "timeout".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("pinecone_query"));
    assert!(display.contains("timeout"));

    let err = Error::Audit("report is missing section '## [2] Technical Details'".to_string());
    assert!(format!("{err}").starts_with("audit failed"));
}

#[test]
fn test_config_from_file() {
    let file = config_file(
        r#"
top_k = 5

[llm]
provider = "anthropic"
model = "claude-3-5-sonnet-latest"
temperature = 0.2

[store]
backend = "local"
path = "/tmp/errtriage-test/index.json"
min_score = 0.1

[logging]
format = "json"
"#,
    );

    let config = TriageConfig::load(Some(file.path()), env(&[])).unwrap();

    assert_eq!(config.top_k, 5);
    assert_eq!(config.llm.provider, LlmProvider::Anthropic);
    assert_eq!(config.llm.model.as_deref(), Some("claude-3-5-sonnet-latest"));
    assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.store.backend, StoreBackend::Local);
    assert_eq!(config.store.min_score, Some(0.1));
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_environment_overrides_file() {
    let file = config_file("top_k = 5\n[store]\nbackend = \"local\"\n");
    let lookup = env(&[
        ("ERRTRIAGE_TOP_K", "7"),
        ("ERRTRIAGE_STORE_BACKEND", "pinecone"),
        ("PINECONE_INDEX_NAME", "errors"),
        ("PINECONE_ENV", "eu-west-1"),
    ]);

    let config = TriageConfig::load(Some(file.path()), lookup).unwrap();

    assert_eq!(config.top_k, 7);
    assert_eq!(config.store.backend, StoreBackend::Pinecone);
    assert_eq!(config.store.index_name.as_deref(), Some("errors"));
    assert_eq!(config.store.region(), "eu-west-1");
}

#[test]
fn test_config_path_from_environment() {
    let file = config_file("top_k = 9\n");
    let path = file.path().to_string_lossy().into_owned();

    let config = TriageConfig::load(None, env(&[(CONFIG_PATH_ENV, path.as_str())])).unwrap();
    assert_eq!(config.top_k, 9);
}

#[test]
fn test_invalid_config_is_rejected() {
    let unknown_key = config_file("retries = 3\n");
    assert!(matches!(
        TriageConfig::load(Some(unknown_key.path()), env(&[])),
        Err(Error::Config(_))
    ));

    let bad_provider = env(&[("ERRTRIAGE_LLM_PROVIDER", "gemini")]);
    let file = config_file("");
    assert!(matches!(
        TriageConfig::load(Some(file.path()), bad_provider),
        Err(Error::Config(_))
    ));

    let bad_number = env(&[("ERRTRIAGE_TOP_K", "three")]);
    assert!(matches!(
        TriageConfig::load(Some(file.path()), bad_number),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        TriageConfig::load(Some(&missing), env(&[])),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_error_report_rejects_blank_input() {
    assert!(matches!(
        ErrorReport::new("  \n\t", InputOrigin::Stdin),
        Err(Error::InvalidInput(_))
    ));
    let report = ErrorReport::new("KeyError: 'name'\n", InputOrigin::Stdin).unwrap();
    assert!(report.text().contains("KeyError"));
}

#[test]
fn test_local_store_persists_across_builds() {
    let dir = TempDir::new().unwrap();
    let mut config = TriageConfig::default().with_backend(StoreBackend::Local);
    config.store.path = Some(dir.path().join("index.json"));

    let store = build_store(&config).unwrap();
    run_seed_case(store.as_ref(), &mut Vec::new()).unwrap();
    drop(store);

    let reopened = build_store(&config).unwrap();
    let mut out = Vec::new();
    let hits = run_search(reopened.as_ref(), "zsh command not found", 3, &mut out).unwrap();

    assert_eq!(hits, 1);
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains(CaseType::ManualTestCase.as_str()));
}

#[test]
fn test_store_handles_are_shareable() {
    let dir = TempDir::new().unwrap();
    let mut config = TriageConfig::default().with_backend(StoreBackend::Local);
    config.store.path = Some(dir.path().join("index.json"));

    let store = build_store(&config).unwrap();
    let clone = Arc::clone(&store);
    run_seed_case(clone.as_ref(), &mut Vec::new()).unwrap();
    assert_eq!(store.query("command not found", 1).unwrap().len(), 1);
}
