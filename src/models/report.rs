//! Pipeline input and output documents.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Where the raw error text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOrigin {
    /// Redirected standard input.
    Stdin,
    /// A file named on the command line.
    File(PathBuf),
}

impl fmt::Display for InputOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Raw, unstructured error text as read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    text: String,
    origin: InputOrigin,
}

impl ErrorReport {
    /// Creates a report from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text is empty or whitespace.
    pub fn new(text: impl Into<String>, origin: InputOrigin) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::InvalidInput(format!("no error text provided on {origin}")));
        }
        Ok(Self { text, origin })
    }

    /// Returns the raw text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns where the text came from.
    #[must_use]
    pub const fn origin(&self) -> &InputOrigin {
        &self.origin
    }
}

/// The four-section explanation produced by the audit stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    /// Plain-language overview for beginners.
    pub overview: String,
    /// Error type, location, and technical cause.
    pub technical_detail: String,
    /// Step-by-step remediation.
    pub remediation: String,
    /// Similar prior cases drawn from retrieved context.
    ///
    /// `None` when nothing was retrieved.
    pub references: Option<String>,
}

impl FinalReport {
    /// Report title line.
    pub const TITLE: &'static str = "# Error Report";
    /// Heading of section 1.
    pub const OVERVIEW_HEADING: &'static str = "## [1] Overview";
    /// Heading of section 2.
    pub const TECHNICAL_HEADING: &'static str = "## [2] Technical Details";
    /// Heading of section 3.
    pub const REMEDIATION_HEADING: &'static str = "## [3] Remediation Steps";
    /// Heading of section 4.
    pub const REFERENCES_HEADING: &'static str = "## [4] Reference Cases";

    /// Returns true if the report cites at least one prior case.
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.references
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }

    /// Renders the report as Markdown.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}\n\n{}\n{}\n\n{}\n{}\n\n{}\n{}\n",
            Self::TITLE,
            Self::OVERVIEW_HEADING,
            self.overview.trim(),
            Self::TECHNICAL_HEADING,
            self.technical_detail.trim(),
            Self::REMEDIATION_HEADING,
            self.remediation.trim(),
        );
        if let Some(references) = self.references.as_deref().filter(|r| !r.trim().is_empty()) {
            out.push_str(&format!(
                "\n{}\n{}\n",
                Self::REFERENCES_HEADING,
                references.trim()
            ));
        }
        out
    }
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(references: Option<&str>) -> FinalReport {
        FinalReport {
            overview: "The shell could not find the command.".to_string(),
            technical_detail: "- Type: CommandNotFound".to_string(),
            remediation: "- Step 1: check spelling".to_string(),
            references: references.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_report_rejected() {
        assert!(ErrorReport::new("  \n", InputOrigin::Stdin).is_err());
        let ok = ErrorReport::new("boom", InputOrigin::File(PathBuf::from("err.txt")));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_render_with_references() {
        let rendered = report(Some("command not found: xxx")).render();
        assert!(rendered.starts_with(FinalReport::TITLE));
        assert!(rendered.contains(FinalReport::OVERVIEW_HEADING));
        assert!(rendered.contains(FinalReport::REFERENCES_HEADING));
        assert!(rendered.contains("command not found: xxx"));
    }

    #[test]
    fn test_render_without_references() {
        let report = report(None);
        assert!(!report.has_references());
        assert!(!report.render().contains(FinalReport::REFERENCES_HEADING));

        let blank = FinalReport {
            references: Some("   ".to_string()),
            ..report
        };
        assert!(!blank.has_references());
        assert!(!blank.render().contains(FinalReport::REFERENCES_HEADING));
    }
}
