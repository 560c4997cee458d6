//! Shared test doubles.
#![allow(dead_code, clippy::unwrap_used)]

use errtriage::llm::LlmProvider;
use errtriage::llm::prompts::{
    AUDIT_SYSTEM_PROMPT, LEARNING_SYSTEM_PROMPT, QUERY_SYNTHESIS_SYSTEM_PROMPT, SEED_SYSTEM_PROMPT,
    STRUCTURING_SYSTEM_PROMPT,
};
use errtriage::{Error, Result};
use std::sync::Mutex;

/// Pipeline stage a prompt belongs to, identified by its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Structuring,
    QuerySynthesis,
    Audit,
    Learning,
    Seed,
}

impl Stage {
    fn from_system(system: &str) -> Option<Self> {
        match system {
            STRUCTURING_SYSTEM_PROMPT => Some(Self::Structuring),
            QUERY_SYNTHESIS_SYSTEM_PROMPT => Some(Self::QuerySynthesis),
            AUDIT_SYSTEM_PROMPT => Some(Self::Audit),
            LEARNING_SYSTEM_PROMPT => Some(Self::Learning),
            SEED_SYSTEM_PROMPT => Some(Self::Seed),
            _ => None,
        }
    }
}

/// Deterministic model that answers each stage with a fixed reply.
#[derive(Default)]
pub struct ScriptedLlm {
    structuring: String,
    query_synthesis: String,
    audit: String,
    learning: String,
    seed: String,
    calls: Mutex<Vec<(Stage, String)>>,
}

impl ScriptedLlm {
    /// The "command not found: yyy" script used by most scenarios.
    pub fn command_not_found() -> Self {
        Self::default()
            .with(
                Stage::Structuring,
                r#"```json
{"language": "shell", "os": "macOS", "error_type": "CommandNotFound",
 "file_path": null, "line_number": null,
 "error_message": "zsh: command not found: yyy", "stack_trace": "unknown"}
```"#,
            )
            .with(
                Stage::QuerySynthesis,
                r#"{"technical_cause": "The shell found no executable named yyy on PATH.",
                    "search_query": "zsh command not found yyy",
                    "draft_summary": "The command is not installed or is misspelled."}"#,
            )
            .with(
                Stage::Audit,
                "# Error Report\n\n\
                 ## [1] Overview\nThe shell could not find the command you typed.\n\n\
                 ## [2] Technical Details\n- Error type: CommandNotFound\n- Location: shell\n\n\
                 ## [3] Remediation Steps\n- Step 1: Check the spelling.\n- Step 2: Install the tool.\n\n\
                 ## [4] Reference Cases\nA past case where a command was not installed.\n",
            )
            .with(
                Stage::Learning,
                "Error resolution case:\nError: zsh: command not found\nCause: the tool is not installed\nSolution:\n1. Install it.",
            )
    }

    /// Replaces the reply for one stage.
    pub fn with(mut self, stage: Stage, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        match stage {
            Stage::Structuring => self.structuring = reply,
            Stage::QuerySynthesis => self.query_synthesis = reply,
            Stage::Audit => self.audit = reply,
            Stage::Learning => self.learning = reply,
            Stage::Seed => self.seed = reply,
        }
        self
    }

    /// Number of calls made for `stage`.
    pub fn calls_for(&self, stage: Stage) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stage)
            .count()
    }

    /// User prompts sent for `stage`, in order.
    pub fn prompts_for(&self, stage: Stage) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, user)| user.clone())
            .collect()
    }
}

impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::OperationFailed {
            operation: "scripted_complete".to_string(),
            cause: "stages must send a system prompt".to_string(),
        })
    }

    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        let stage = Stage::from_system(system).ok_or_else(|| Error::OperationFailed {
            operation: "scripted_complete".to_string(),
            cause: "unrecognized system prompt".to_string(),
        })?;
        self.calls.lock().unwrap().push((stage, user.to_string()));
        let reply = match stage {
            Stage::Structuring => &self.structuring,
            Stage::QuerySynthesis => &self.query_synthesis,
            Stage::Audit => &self.audit,
            Stage::Learning => &self.learning,
            Stage::Seed => &self.seed,
        };
        Ok(reply.clone())
    }
}
