//! Rule configuration and resolution errors.

use thiserror::Error;

/// A configured rule could not be turned into a [`RuleSpec`](super::RuleSpec).
///
/// Raised while building a [`RuleSet`](super::RuleSet). Always fatal at startup.
#[derive(Debug, Error)]
pub enum RuleConfigError {
    /// A mandatory field is absent.
    #[error("rule #{index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// A mandatory field is present but empty.
    #[error("rule #{index}: field `{field}` must not be empty")]
    EmptyField { index: usize, field: &'static str },

    /// Two synonymous fields were both given (`redirect`/`target`, `status`/`method`).
    #[error("rule #{index}: `{first}` and `{second}` are synonyms, set only one")]
    DuplicateField {
        index: usize,
        first: &'static str,
        second: &'static str,
    },

    /// The status is not a usable HTTP status code.
    #[error("rule #{index}: invalid HTTP status code {status}")]
    InvalidStatus { index: usize, status: u16 },

    /// A delimited pattern carries a modifier we cannot express.
    #[error("rule #{index}: unsupported pattern modifier `{modifier}` in `{pattern}`")]
    UnsupportedModifier {
        index: usize,
        pattern: String,
        modifier: char,
    },

    /// The pattern is not a valid regular expression.
    #[error("rule #{index}: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RuleConfigError {
    /// Position of the offending rule in configuration order.
    pub fn index(&self) -> usize {
        match self {
            RuleConfigError::MissingField { index, .. }
            | RuleConfigError::EmptyField { index, .. }
            | RuleConfigError::DuplicateField { index, .. }
            | RuleConfigError::InvalidStatus { index, .. }
            | RuleConfigError::UnsupportedModifier { index, .. }
            | RuleConfigError::InvalidPattern { index, .. } => *index,
        }
    }
}

/// No configured rule matched the request URI.
///
/// The expected outcome for most requests; callers leave the original
/// not-found response in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Redirection rule not found for {uri}")]
pub struct RuleNotFoundError {
    /// The URI that was matched against every rule.
    pub uri: String,
}
