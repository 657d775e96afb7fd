//! Structured reply protocol
//!
//! The model is instructed to answer with three labeled fields:
//!
//! ```text
//! COMMAND: git reset --soft HEAD~1
//! SAFETY: CAUTION
//! EXPLANATION: Undoes the last commit but keeps the changes staged.
//! ```
//!
//! Fields may appear in any order. A field's value runs from its label to the
//! next all-caps `LABEL:` token or the end of the text, across line breaks.
//! Label matching is case-insensitive; the terminating label is not.

use crate::error::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Risk verdict for a generated command.
///
/// `Unknown` is reserved for replies whose `SAFETY:` field is absent or
/// unrecognized; the risk classifier itself never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// No risk of data loss
    Safe,
    /// Side effects possible, understand before running
    Caution,
    /// Can cause permanent data loss
    Dangerous,
    /// Could not be determined
    #[default]
    Unknown,
}

impl Verdict {
    /// Map a `SAFETY:` field value to a verdict. Anything unrecognized
    /// (including empty) is `Unknown`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "SAFE" => Self::Safe,
            "CAUTION" => Self::Caution,
            "DANGEROUS" => Self::Dangerous,
            _ => Self::Unknown,
        }
    }

    /// A command is approved unless its verdict is `Dangerous`.
    #[must_use]
    pub fn approved(self) -> bool {
        !matches!(self, Self::Dangerous)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Safe => "SAFE",
            Self::Caution => "CAUTION",
            Self::Dangerous => "DANGEROUS",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A successfully parsed structured reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredReply {
    /// The `COMMAND:` field value
    pub command: String,
    /// The verdict mapped from the `SAFETY:` field
    pub verdict: Verdict,
    /// The `EXPLANATION:` field value (empty if absent)
    pub explanation: String,
}

/// Protocol parse failure.
#[derive(Debug, ThisError)]
pub enum ParseError {
    /// The `COMMAND:` field is absent or empty
    #[error("reply has no COMMAND field")]
    MissingCommand,
}

/// Parser for the structured reply protocol.
///
/// Regexes are compiled once at construction; the generation stage holds one
/// parser for its lifetime.
#[derive(Debug)]
pub struct ReplyParser {
    command: Regex,
    safety: Regex,
    explanation: Regex,
    /// Terminator: a newline followed by an all-caps label
    next_label: Regex,
}

impl ReplyParser {
    /// Create a parser for the three-field protocol.
    #[must_use]
    pub fn new() -> Self {
        Self {
            command: field_regex("COMMAND"),
            safety: field_regex("SAFETY"),
            explanation: field_regex("EXPLANATION"),
            next_label: Regex::new(r"\n[A-Z_]+:").expect("static regex"),
        }
    }

    /// Parse a raw model reply into its labeled fields.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingCommand`] if no non-empty `COMMAND:` field
    /// is present. Missing `SAFETY:` or `EXPLANATION:` fields are not errors;
    /// they yield `Verdict::Unknown` and an empty explanation respectively.
    pub fn parse(&self, text: &str) -> std::result::Result<StructuredReply, ParseError> {
        let command = self
            .extract(text, &self.command)
            .filter(|c| !c.is_empty())
            .ok_or(ParseError::MissingCommand)?;

        let safety = self.extract(text, &self.safety).unwrap_or_default();
        let explanation = self.extract(text, &self.explanation).unwrap_or_default();

        Ok(StructuredReply {
            command,
            verdict: Verdict::parse(&safety),
            explanation,
        })
    }

    /// Extract one field value: everything after the label up to the next
    /// all-caps label or end of text, trimmed.
    fn extract(&self, text: &str, label: &Regex) -> Option<String> {
        let m = label.find(text)?;
        let rest = &text[m.end()..];
        let value = match self.next_label.find(rest) {
            Some(next) => &rest[..next.start()],
            None => rest,
        };
        Some(value.trim().to_string())
    }
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

fn field_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?i){name}\s*:")).expect("static regex")
}

/// Convenience As-From for transport layers that want a crate error.
impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> std::result::Result<StructuredReply, ParseError> {
        ReplyParser::new().parse(text)
    }

    #[test]
    fn test_parse_canonical_reply() {
        let reply = parse(
            "COMMAND: git status\nSAFETY: SAFE\nEXPLANATION: Shows working tree state.",
        )
        .unwrap();

        assert_eq!(reply.command, "git status");
        assert_eq!(reply.verdict, Verdict::Safe);
        assert_eq!(reply.explanation, "Shows working tree state.");
    }

    #[test]
    fn test_parse_fields_in_any_order() {
        let reply = parse(
            "EXPLANATION: Force push warning.\nSAFETY: DANGEROUS\nCOMMAND: git push --force",
        )
        .unwrap();

        assert_eq!(reply.command, "git push --force");
        assert_eq!(reply.verdict, Verdict::Dangerous);
        assert_eq!(reply.explanation, "Force push warning.");
    }

    #[test]
    fn test_parse_labels_case_insensitive() {
        let reply = parse("command: git log\nsafety: safe\nexplanation: Lists commits.").unwrap();

        assert_eq!(reply.command, "git log");
        assert_eq!(reply.verdict, Verdict::Safe);
    }

    #[test]
    fn test_value_spans_line_breaks_until_next_label() {
        let reply = parse(
            "COMMAND: git rebase <branch>\nSAFETY: CAUTION\nEXPLANATION: Moves commits onto\nanother branch.\nNever rebase shared history.",
        )
        .unwrap();

        assert_eq!(
            reply.explanation,
            "Moves commits onto\nanother branch.\nNever rebase shared history."
        );
    }

    #[test]
    fn test_missing_safety_maps_to_unknown() {
        let reply = parse("COMMAND: git fetch\nEXPLANATION: Downloads refs.").unwrap();

        assert_eq!(reply.verdict, Verdict::Unknown);
        assert_eq!(reply.explanation, "Downloads refs.");
    }

    #[test]
    fn test_missing_command_is_parse_error() {
        let err = parse("SAFETY: SAFE\nEXPLANATION: no command here").unwrap_err();
        assert!(matches!(err, ParseError::MissingCommand));
    }

    #[test]
    fn test_empty_command_is_parse_error() {
        let err = parse("COMMAND:\nSAFETY: SAFE").unwrap_err();
        assert!(matches!(err, ParseError::MissingCommand));
    }

    #[test]
    fn test_freeform_text_is_parse_error() {
        assert!(parse("Sure! You probably want to run git status here.").is_err());
    }

    #[test]
    fn test_verdict_mapping() {
        assert_eq!(Verdict::parse("SAFE"), Verdict::Safe);
        assert_eq!(Verdict::parse(" caution "), Verdict::Caution);
        assert_eq!(Verdict::parse("Dangerous"), Verdict::Dangerous);
        assert_eq!(Verdict::parse("MOSTLY_FINE"), Verdict::Unknown);
        assert_eq!(Verdict::parse(""), Verdict::Unknown);
    }

    #[test]
    fn test_approved_only_blocks_dangerous() {
        assert!(Verdict::Safe.approved());
        assert!(Verdict::Caution.approved());
        assert!(Verdict::Unknown.approved());
        assert!(!Verdict::Dangerous.approved());
    }
}
