use std::fmt;

use thiserror::Error;

/// Everything that can go wrong while turning journal text into a ledger.
///
/// Only [`LedgerError::MissingPriorTransaction`] is fatal to a parse run, the
/// rest are recorded as [`Diagnostic`]s and scanning carries on.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("failed to parse `{text}': {reason}")]
    Syntax { text: String, reason: String },

    #[error("invalid amount `{text}': {reason}")]
    AmountParse { text: String, reason: String },

    #[error("no conversion rate from {from} to {to}")]
    NoConversionRate { from: String, to: String },

    #[error("failed to balance the following entry, ending on line {ending_line}:\n{entry}")]
    Unbalanced { ending_line: usize, entry: String },

    #[error("posting to `{account}' has no amount and no prior posting to infer it from")]
    MissingPriorTransaction { account: String },
}

impl LedgerError {
    pub fn syntax(text: &str, reason: impl Into<String>) -> Self {
        LedgerError::Syntax {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    pub fn amount(text: &str, reason: impl Into<String>) -> Self {
        LedgerError::AmountParse {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    /// Point a syntax error at `raw` instead of the text it was raised on.
    pub(crate) fn with_text(self, raw: &str) -> Self {
        match self {
            LedgerError::Syntax { reason, .. } => LedgerError::Syntax {
                text: raw.to_string(),
                reason,
            },
            other => other,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::MissingPriorTransaction { .. })
    }
}

/// A problem found on a given input line (1-based).
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub error: LedgerError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Returned when a parse run aborts. Carries whatever was diagnosed before
/// the fatal line, the fatal diagnostic included.
#[derive(Debug, Error)]
#[error("parse aborted on line {line}: {error}")]
pub struct ParseFailure {
    pub line: usize,
    pub error: LedgerError,
    pub diagnostics: Vec<Diagnostic>,
}
