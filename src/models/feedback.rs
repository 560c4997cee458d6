//! User feedback on a final report.

use std::fmt;

/// Answer to "did the suggested steps fix the error?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feedback {
    /// The user confirmed the fix.
    Yes,
    /// Anything other than an explicit confirmation.
    #[default]
    No,
}

impl Feedback {
    /// Parses a typed answer.
    ///
    /// Only `y` or `yes` (any case, surrounding whitespace ignored) count as
    /// affirmative. Everything else, including empty input, is `No`.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Yes,
            _ => Self::No,
        }
    }

    /// Returns true for an explicit confirmation.
    #[must_use]
    pub const fn is_affirmative(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("y", Feedback::Yes ; "lower y")]
    #[test_case("Y", Feedback::Yes ; "upper y")]
    #[test_case(" yes\n", Feedback::Yes ; "yes with whitespace")]
    #[test_case("YES", Feedback::Yes ; "upper yes")]
    #[test_case("n", Feedback::No ; "lower n")]
    #[test_case("", Feedback::No ; "empty")]
    #[test_case("yeah", Feedback::No ; "informal")]
    #[test_case("y es", Feedback::No ; "split")]
    fn test_parse(input: &str, expected: Feedback) {
        assert_eq!(Feedback::parse(input), expected);
    }

    #[test]
    fn test_default_is_no() {
        assert!(!Feedback::default().is_affirmative());
        assert!(Feedback::Yes.is_affirmative());
    }
}
