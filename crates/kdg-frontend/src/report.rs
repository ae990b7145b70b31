//! Recoverable-problem collection for the front ends.
//!
//! Parsing never aborts on a bad field or a dangling reference; the
//! offending entry is repaired or dropped and a warning is recorded
//! here so callers can surface it in verbose mode.

use std::fmt;

use serde::Serialize;

use crate::numeric::parse_float;

/// One recoverable problem noticed while reading a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParseWarning {
    /// A numeric field did not parse; the default was substituted.
    MalformedNumericField {
        field: String,
        text: String,
        substituted: f64,
    },
    /// An edge or weight referred to a node that does not exist; the
    /// entry was dropped.
    UnresolvedReference { reference: String },
    /// An entry could not be interpreted at all and was skipped.
    MalformedEntry { entry: String, reason: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MalformedNumericField {
                field,
                text,
                substituted,
            } => write!(
                f,
                "malformed numeric field {field}: {text:?} (substituted {substituted})"
            ),
            ParseWarning::UnresolvedReference { reference } => {
                write!(f, "unresolved reference {reference}: entry dropped")
            }
            ParseWarning::MalformedEntry { entry, reason } => {
                write!(f, "malformed entry {entry:?}: {reason}")
            }
        }
    }
}

/// The warnings accumulated over one parse.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ParseReport {
    warnings: Vec<ParseWarning>,
}

impl ParseReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub(crate) fn unresolved(&mut self, reference: impl Into<String>) {
        self.push(ParseWarning::UnresolvedReference {
            reference: reference.into(),
        });
    }

    pub(crate) fn malformed(&mut self, entry: impl Into<String>, reason: impl Into<String>) {
        self.push(ParseWarning::MalformedEntry {
            entry: entry.into(),
            reason: reason.into(),
        });
    }

    /// Parse a float field, substituting `default` and recording a
    /// warning when the text is malformed.
    pub(crate) fn float_or(&mut self, field: &str, text: &str, default: f64) -> f64 {
        match parse_float(text) {
            Ok(value) => value,
            Err(_) => {
                self.push(ParseWarning::MalformedNumericField {
                    field: field.to_string(),
                    text: text.to_string(),
                    substituted: default,
                });
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_float_substitutes_default_and_warns() {
        let mut report = ParseReport::new();
        assert_eq!(report.float_or("cost", "1.5", 0.0), 1.5);
        assert!(report.is_empty());

        assert_eq!(report.float_or("cost", "fast", 0.0), 0.0);
        assert_eq!(report.warnings().len(), 1);
        let text = report.warnings()[0].to_string();
        assert!(text.contains("cost"));
        assert!(text.contains("fast"));
    }
}
