//! Identifier scrubbing for search queries.
//!
//! A search query must name a failure class, not one occurrence of it.
//! Identifiers are harvested from the structured error (path components,
//! quoted names, code-like tokens, trailing subjects such as the `yyy` in
//! `command not found: yyy`) and any query token that carries one is dropped.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use crate::models::{StructuredError, UNKNOWN};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Query used when nothing meaningful survives scrubbing.
pub const FALLBACK_QUERY: &str = "unknown error";

/// Identifiers shorter than this are only removed on an exact token match.
const MIN_SUBSTRING_LEN: usize = 3;

/// Text inside single quotes, double quotes, or backticks.
static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'([^'\s]+)'|"([^"\s]+)"|`([^`\s]+)`"#).expect("static regex: quoted token")
});

/// A word character directly followed by a call or index bracket.
static CALL_OR_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w[(\[<]").expect("static regex: call or index"));

/// An exception or error class name, optionally namespace-qualified.
static FAILURE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Za-z_]\w*(?:\.|::))*([A-Z][A-Za-z0-9]*(?:Error|Exception))\b")
        .expect("static regex: failure class")
});

/// Characters stripped from both ends of a token before comparison.
const WRAPPING: &[char] = &[
    '\'', '"', '`', '(', ')', '[', ']', '{', '}', '<', '>', ',', ';', ':', '!', '?',
];

/// Case-specific identifiers taken from one structured error.
///
/// Stored lowercased; matching is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    items: BTreeSet<String>,
}

impl IdentifierSet {
    /// Collects identifiers from the file path, stack trace and message.
    ///
    /// Failure class names are kept out of the set: the error type (and its
    /// last `.` or `::` segment) and any `...Error`/`...Exception` class named
    /// in the text describe the failure class the query is supposed to name.
    #[must_use]
    pub fn from_structured(structured: &StructuredError) -> Self {
        let mut set = Self::default();
        let mut classes = BTreeSet::new();

        if let Some(path) = &structured.file_path {
            set.add_path(path);
        }
        for text in [&structured.stack_trace, &structured.error_message] {
            if !StructuredError::is_unknown(text) {
                set.add_text(text);
                classes.extend(
                    FAILURE_CLASS
                        .captures_iter(text)
                        .filter_map(|c| c.get(1))
                        .map(|m| m.as_str().to_lowercase()),
                );
            }
        }

        let error_type = structured.error_type.trim().to_lowercase();
        if let Some(last) = error_type.rsplit(['.', ':']).find(|s| !s.is_empty()) {
            classes.insert(last.to_string());
        }
        classes.insert(error_type);

        set.items.retain(|ident| !classes.contains(ident));
        set
    }

    /// Returns true if no identifiers were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the lowercased identifiers.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Returns true if `token` carries any identifier.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        let bare = lower.trim_matches(WRAPPING).trim_end_matches('.');
        self.items.iter().any(|ident| {
            bare == ident.as_str()
                || (ident.chars().count() >= MIN_SUBSTRING_LEN && lower.contains(ident.as_str()))
        })
    }

    /// Drops every token carrying an identifier and collapses whitespace.
    #[must_use]
    pub fn scrub(&self, query: &str) -> String {
        query
            .split_whitespace()
            .filter(|token| !self.matches(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn insert(&mut self, candidate: &str) {
        let ident = candidate
            .trim()
            .trim_matches(WRAPPING)
            .trim_end_matches('.')
            .to_lowercase();
        if ident.is_empty() || ident == UNKNOWN || !ident.chars().any(char::is_alphanumeric) {
            return;
        }
        self.items.insert(ident);
    }

    fn add_path(&mut self, path: &str) {
        let components: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .collect();

        for component in &components {
            for word in component.split_whitespace() {
                self.insert(word);
            }
        }

        if let Some(last) = components.last()
            && let Some((stem, _)) = last.rsplit_once('.')
        {
            for word in stem.split_whitespace() {
                self.insert(word);
            }
        }
    }

    fn add_text(&mut self, text: &str) {
        for captures in QUOTED.captures_iter(text) {
            if let Some(m) = captures.iter().skip(1).flatten().next() {
                self.insert(m.as_str());
            }
        }

        for raw in text.split_whitespace() {
            let raw = raw.trim_end_matches(['.', ',', ';', ':']);
            if is_code_like(raw) {
                self.insert(raw);
                for piece in raw.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
                    self.insert(piece);
                }
            }
        }

        for line in text.lines() {
            if let Some((_, subject)) = line.rsplit_once(": ") {
                let subject = subject.trim();
                if !subject.is_empty() && !subject.contains(char::is_whitespace) {
                    self.insert(subject);
                }
            }
        }
    }
}

/// Returns true for tokens that look like code rather than prose.
fn is_code_like(raw: &str) -> bool {
    let core = raw.trim_matches(WRAPPING);
    if core.is_empty() {
        return false;
    }

    core.contains(['/', '\\', '.', '_'])
        || core.contains("::")
        || core.chars().any(|c| c.is_ascii_digit())
        || has_internal_capital(core)
        || CALL_OR_INDEX.is_match(raw)
}

/// Detects camelCase-style humps such as `fooBar` or `NotFoundError`.
fn has_internal_capital(token: &str) -> bool {
    token
        .chars()
        .zip(token.chars().skip(1))
        .any(|(prev, next)| prev.is_lowercase() && next.is_uppercase())
}

/// Scrubs identifiers from a model-proposed search query.
///
/// When nothing survives, falls back to the error type if it is known and
/// identifier-free, else to [`FALLBACK_QUERY`].
#[must_use]
pub fn scrub_search_query(query: &str, structured: &StructuredError) -> String {
    let identifiers = IdentifierSet::from_structured(structured);
    let scrubbed = identifiers.scrub(query);
    if !scrubbed.is_empty() {
        return scrubbed;
    }

    let error_type = structured.error_type.trim();
    if !StructuredError::is_unknown(error_type) && !error_type.is_empty() {
        let fallback = identifiers.scrub(error_type);
        if fallback.split_whitespace().eq(error_type.split_whitespace()) {
            return fallback;
        }
    }
    FALLBACK_QUERY.to_string()
}
