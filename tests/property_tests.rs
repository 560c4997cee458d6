//! Property-based tests for query scrubbing and retrieval.
//!
//! Uses proptest to verify invariants across random inputs:
//! - A synthesized query never carries identifiers from the input
//! - Scrubbing is idempotent
//! - A stored case is retrievable by its own text

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{ScriptedLlm, Stage};
use errtriage::embedding::{Embedder, HashEmbedder};
use errtriage::models::{CaseRecord, CaseType, StructuredError, UNKNOWN};
use errtriage::services::{FALLBACK_QUERY, Summarizer, scrub_search_query};
use errtriage::storage::{KnowledgeStore, LocalStore};
use proptest::prelude::*;
use std::sync::Arc;

const GENERIC_WORDS: &[&str] = &[
    "keyerror", "lookup", "failed", "missing", "dictionary", "key", "python", "runtime",
];

/// Identifiers carry a `qx` prefix so they never collide with generic words.
fn identifier() -> impl Strategy<Value = String> {
    "qx[a-z]{3,6}"
}

fn structured(dir: &str, stem: &str, func: &str, key: &str) -> StructuredError {
    let path = format!("/srv/{dir}/{stem}.py");
    StructuredError {
        language: "python".to_string(),
        os: UNKNOWN.to_string(),
        error_type: "KeyError".to_string(),
        file_path: Some(path.clone()),
        line_number: Some(42),
        error_message: format!("KeyError: '{key}'"),
        stack_trace: format!("File \"{path}\", line 42, in {func}_handler\n    row[\"{key}\"]"),
    }
}

fn echoing_query(dir: &str, stem: &str, func: &str, key: &str, words: &[&str]) -> String {
    let mut tokens: Vec<String> = words.iter().map(|w| (*w).to_string()).collect();
    tokens.insert(0, format!("{stem}.py"));
    tokens.push(format!("{func}_handler()"));
    tokens.push(format!("'{key}'"));
    tokens.push(format!("/srv/{dir}"));
    tokens.join(" ")
}

proptest! {
    /// Property: identifiers echoed back by the model are scrubbed.
    #[test]
    fn prop_search_query_has_no_input_identifiers(
        dir in identifier(),
        stem in identifier(),
        func in identifier(),
        key in identifier(),
        words in proptest::sample::subsequence(GENERIC_WORDS, 0..GENERIC_WORDS.len()),
    ) {
        let input = structured(&dir, &stem, &func, &key);
        let proposed = echoing_query(&dir, &stem, &func, &key, &words);
        let reply = serde_json::json!({
            "technical_cause": "The key is absent.",
            "search_query": proposed,
            "draft_summary": "Check the key.",
        })
        .to_string();
        let llm = Arc::new(ScriptedLlm::default().with(Stage::QuerySynthesis, reply));

        let query = Summarizer::new(llm).summarize(&input).unwrap();
        let lower = query.search_query.to_lowercase();
        for ident in [&dir, &stem, &func, &key] {
            prop_assert!(!lower.contains(ident.as_str()), "{ident} leaked into {lower}");
        }
        prop_assert!(!lower.contains('/'));
        prop_assert!(!query.search_query.trim().is_empty());
    }

    /// Property: scrubbing an already scrubbed query changes nothing.
    #[test]
    fn prop_scrub_is_idempotent(
        dir in identifier(),
        stem in identifier(),
        func in identifier(),
        key in identifier(),
        words in proptest::sample::subsequence(GENERIC_WORDS, 0..GENERIC_WORDS.len()),
    ) {
        let input = structured(&dir, &stem, &func, &key);
        let once = scrub_search_query(&echoing_query(&dir, &stem, &func, &key, &words), &input);
        let twice = scrub_search_query(&once, &input);
        prop_assert_eq!(once, twice);
    }

    /// Property: surviving words keep their order and single spacing.
    #[test]
    fn prop_scrub_keeps_generic_words_in_order(
        key in identifier(),
        words in proptest::sample::subsequence(GENERIC_WORDS, 1..GENERIC_WORDS.len()),
    ) {
        let input = structured("app", "main", "load", &key);
        let proposed = format!("{}   {key}", words.join("  "));
        let scrubbed = scrub_search_query(&proposed, &input);
        prop_assert_eq!(scrubbed, words.join(" "));
    }

    /// Property: a stored case is found by its own text.
    #[test]
    fn prop_upsert_then_query_own_text(
        texts in proptest::collection::hash_set("[a-z]{3,8}( [a-z]{3,8}){2,6}", 1..8),
        pick in any::<proptest::sample::Index>(),
    ) {
        let texts: Vec<String> = texts.into_iter().collect();
        let store = LocalStore::in_memory(Arc::new(HashEmbedder::new(256)));
        let records: Vec<CaseRecord> = texts
            .iter()
            .map(|t| CaseRecord::new(t.clone(), CaseType::InitialData))
            .collect();
        prop_assert_eq!(store.upsert(&records).unwrap(), records.len());

        let target = pick.get(&texts);
        let hits = store.query(target, 3).unwrap();
        prop_assert!(hits.len() <= 3);
        prop_assert!(hits.iter().any(|r| &r.content == target));
    }

    /// Property: hash embeddings of non-empty text are unit length.
    #[test]
    fn prop_hash_embedding_is_normalized(text in "[a-zA-Z]{1,10}( [a-zA-Z0-9]{1,10}){0,10}") {
        let vector = HashEmbedder::new(128).embed(&text).unwrap();
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        prop_assert!((norm - 1.0).abs() < 1e-4);
    }
}

#[test]
fn fallback_query_is_generic() {
    let input = structured("app", "main", "load", "qxid");
    assert_eq!(scrub_search_query("qxid", &input), "KeyError");

    let mut unknown = input;
    unknown.error_type = UNKNOWN.to_string();
    assert_eq!(scrub_search_query("qxid", &unknown), FALLBACK_QUERY);
}
