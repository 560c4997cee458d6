//! Error text input.
//!
//! Redirected standard input takes precedence over the `FILE` argument.
//! With neither, the command has nothing to triage.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::models::{ErrorReport, InputOrigin};
use crate::{Error, Result};

/// Where the CLI should read error text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputChoice<'a> {
    /// Read redirected standard input.
    Stdin,
    /// Read the named file.
    File(&'a Path),
    /// No input available: a usage error.
    Missing,
}

impl<'a> InputChoice<'a> {
    /// Picks the input source.
    #[must_use]
    pub const fn select(file: Option<&'a Path>, stdin_is_terminal: bool) -> Self {
        if !stdin_is_terminal {
            return Self::Stdin;
        }
        match file {
            Some(path) => Self::File(path),
            None => Self::Missing,
        }
    }

    /// Returns true when the feedback prompt can be shown.
    ///
    /// Redirected input means no live terminal to answer on.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        !matches!(self, Self::Stdin)
    }
}

/// Reads the error report from the chosen source.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for [`InputChoice::Missing`] or blank
/// text, and [`Error::OperationFailed`] if reading fails.
pub fn read_error_report<R: Read>(choice: InputChoice<'_>, mut stdin: R) -> Result<ErrorReport> {
    match choice {
        InputChoice::Stdin => {
            let mut text = String::new();
            stdin
                .read_to_string(&mut text)
                .map_err(|e| Error::OperationFailed {
                    operation: "read_stdin".to_string(),
                    cause: e.to_string(),
                })?;
            ErrorReport::new(text, InputOrigin::Stdin)
        },
        InputChoice::File(path) => {
            let text = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
                operation: "read_input_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
            ErrorReport::new(text, InputOrigin::File(path.to_path_buf()))
        },
        InputChoice::Missing => Err(Error::InvalidInput(
            "no error text: pipe it on stdin or pass a FILE".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_select_prefers_redirected_stdin() {
        let path = Path::new("err.txt");
        assert_eq!(InputChoice::select(Some(path), false), InputChoice::Stdin);
        assert_eq!(InputChoice::select(Some(path), true), InputChoice::File(path));
        assert_eq!(InputChoice::select(None, true), InputChoice::Missing);
    }

    #[test]
    fn test_only_redirected_input_is_non_interactive() {
        assert!(!InputChoice::Stdin.is_interactive());
        assert!(InputChoice::File(Path::new("x")).is_interactive());
    }

    #[test]
    fn test_read_stdin() {
        let report = read_error_report(InputChoice::Stdin, Cursor::new("zsh: command not found: yyy\n"));
        assert!(report.is_ok_and(|r| r.text().starts_with("zsh") && *r.origin() == InputOrigin::Stdin));
    }

    #[test]
    fn test_read_blank_stdin_is_invalid() {
        let report = read_error_report(InputChoice::Stdin, Cursor::new("  \n"));
        assert!(matches!(report, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_read_file() {
        let Ok(dir) = tempfile::tempdir() else { return };
        let path = dir.path().join("error.log");
        assert!(fs::write(&path, "KeyError: 'id'").is_ok());

        let report = read_error_report(InputChoice::File(&path), Cursor::new(""));
        assert!(report.is_ok_and(|r| r.text() == "KeyError: 'id'"));
    }

    #[test]
    fn test_read_missing_file() {
        let report = read_error_report(
            InputChoice::File(Path::new("/nonexistent/error.log")),
            Cursor::new(""),
        );
        assert!(matches!(report, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_missing_input() {
        let report = read_error_report(InputChoice::Missing, Cursor::new("ignored"));
        assert!(matches!(report, Err(Error::InvalidInput(_))));
    }
}
