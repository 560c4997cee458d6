//! Structured error records and synthesized queries.
//!
//! Both types are parsed from model output, so deserialization is lenient:
//! nulls, numbers, and arrays are coerced into the field's shape instead of
//! failing the whole parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel for a field the model could not resolve.
pub const UNKNOWN: &str = "unknown";

/// Error text broken into named fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
    /// Programming language, or `unknown`.
    #[serde(default = "unknown", deserialize_with = "string_or_unknown")]
    pub language: String,
    /// Operating system, or `unknown`.
    #[serde(default = "unknown", deserialize_with = "string_or_unknown")]
    pub os: String,
    /// Error kind or exception name, or `unknown`.
    #[serde(default = "unknown", deserialize_with = "string_or_unknown")]
    pub error_type: String,
    /// File where the error occurred, if any.
    #[serde(default, deserialize_with = "optional_path")]
    pub file_path: Option<String>,
    /// Line where the error occurred, if any.
    #[serde(default, deserialize_with = "optional_line")]
    pub line_number: Option<u32>,
    /// The concrete error message, or `unknown`.
    #[serde(default = "unknown", deserialize_with = "string_or_unknown")]
    pub error_message: String,
    /// The significant part of the stack trace, or `unknown`.
    #[serde(default = "unknown", deserialize_with = "string_or_unknown")]
    pub stack_trace: String,
}

impl StructuredError {
    /// Returns true if a field value is the `unknown` sentinel.
    #[must_use]
    pub fn is_unknown(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case(UNKNOWN)
    }
}

/// Cause explanation plus a retrieval query for one structured error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedQuery {
    /// Technical explanation of the failure.
    #[serde(deserialize_with = "lenient_string")]
    pub technical_cause: String,
    /// Abstract failure class used for similarity search.
    ///
    /// Never contains file paths, variable names, or other identifiers
    /// specific to this one occurrence.
    #[serde(default, deserialize_with = "lenient_string")]
    pub search_query: String,
    /// First-draft explanation handed to the auditor.
    #[serde(default, deserialize_with = "lenient_string")]
    pub draft_summary: String,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Renders any JSON value as text. Arrays become one element per line.
fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value).trim().to_string())
}

fn string_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    if text.is_empty() {
        Ok(unknown())
    } else {
        Ok(text)
    }
}

fn optional_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    let absent = text.is_empty()
        || StructuredError::is_unknown(&text)
        || matches!(text.to_lowercase().as_str(), "none" | "n/a" | "null");
    Ok(if absent { None } else { Some(text) })
}

fn optional_line<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StructuredError {
        serde_json::from_str(json).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_full_record() {
        let record = parse(
            r#"{
                "language": "Python",
                "os": "macOS",
                "error_type": "ModuleNotFoundError",
                "file_path": "app/main.py",
                "line_number": 12,
                "error_message": "No module named 'requests'",
                "stack_trace": "File \"app/main.py\", line 12"
            }"#,
        );
        assert_eq!(record.language, "Python");
        assert_eq!(record.file_path.as_deref(), Some("app/main.py"));
        assert_eq!(record.line_number, Some(12));
    }

    #[test]
    fn test_missing_fields_become_unknown() {
        let record = parse(r#"{"error_message": "zsh: command not found: yyy"}"#);
        assert_eq!(record.language, UNKNOWN);
        assert_eq!(record.os, UNKNOWN);
        assert_eq!(record.error_type, UNKNOWN);
        assert_eq!(record.stack_trace, UNKNOWN);
        assert_eq!(record.file_path, None);
        assert_eq!(record.line_number, None);
    }

    #[test]
    fn test_lenient_shapes() {
        let record = parse(
            r#"{
                "language": null,
                "file_path": "unknown",
                "line_number": "42",
                "stack_trace": ["frame one", "frame two"]
            }"#,
        );
        assert_eq!(record.language, UNKNOWN);
        assert_eq!(record.file_path, None);
        assert_eq!(record.line_number, Some(42));
        assert_eq!(record.stack_trace, "frame one\nframe two");
    }

    #[test]
    fn test_non_numeric_line_is_none() {
        let record = parse(r#"{"line_number": "near the top"}"#);
        assert_eq!(record.line_number, None);
    }

    #[test]
    fn test_synthesized_query_requires_cause() {
        let missing: Result<SynthesizedQuery, _> =
            serde_json::from_str(r#"{"search_query": "command not found"}"#);
        assert!(missing.is_err());

        let query: SynthesizedQuery =
            serde_json::from_str(r#"{"technical_cause": "binary not on PATH"}"#)
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(query.search_query, "");
        assert_eq!(query.draft_summary, "");
    }
}
