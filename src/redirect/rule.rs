//! A single configured redirect rule.
//!
//! # Responsibilities
//! - Define the raw on-disk record ([`RuleRecord`])
//! - Normalize a record into an immutable [`RuleSpec`]
//! - Compile the rule pattern once, at construction
//!
//! # Design Decisions
//! - Patterns are searched, not anchored: a substring match counts
//! - Delimited patterns (`/.*old/i`) are accepted for compatibility with
//!   configurations written for PCRE; bare patterns work as-is
//! - Nothing here depends on the request; per-request values are derived by the resolver

use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::redirect::error::RuleConfigError;

/// Characters accepted as PCRE-style pattern delimiters.
const DELIMITERS: &[char] = &['/', '#', '~', '!', '@', '%', ';', ',', '`', '{'];

/// Every modifier letter PCRE knows. A trailing run of these after the
/// closing delimiter marks the pattern as delimited.
const PCRE_MODIFIERS: &str = "imsxuADSUXJn";

/// One rule as written in configuration.
///
/// Every field is optional at this level so that missing mandatory fields
/// are reported as [`RuleConfigError`]s with the rule's position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleRecord {
    /// Regular expression matched against the full request URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Redirect destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    /// Synonym for `redirect`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Append the original path and query to the destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarding: Option<bool>,

    /// Redirect status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Synonym for `status`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<u16>,

    /// Scheme override, e.g. `"https://"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Whether the destination already carries a host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute: Option<bool>,
}

impl RuleRecord {
    /// Record with the two mandatory fields set.
    pub fn new(pattern: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            redirect: Some(redirect.into()),
            ..Self::default()
        }
    }

    pub fn with_forwarding(mut self, forwarding: bool) -> Self {
        self.forwarding = Some(forwarding);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_absolute(mut self, absolute: bool) -> Self {
        self.absolute = Some(absolute);
        self
    }
}

/// A normalized, compiled redirect rule.
///
/// Immutable once built; shared read-only by every request.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pattern: String,
    regex: Regex,
    target: String,
    forwarding: bool,
    status: StatusCode,
    protocol: Option<String>,
    absolute: Option<bool>,
}

impl RuleSpec {
    /// Build a rule from its configuration record.
    ///
    /// `index` is the rule's position in configuration order and only feeds
    /// error messages.
    pub fn from_record(index: usize, record: &RuleRecord) -> Result<Self, RuleConfigError> {
        let pattern = required(index, "pattern", record.pattern.as_deref())?;

        let target = match (record.redirect.as_deref(), record.target.as_deref()) {
            (Some(_), Some(_)) => {
                return Err(RuleConfigError::DuplicateField {
                    index,
                    first: "redirect",
                    second: "target",
                })
            }
            (redirect, target) => required(index, "redirect", redirect.or(target))?,
        };

        let status = match (record.status, record.method) {
            (Some(_), Some(_)) => {
                return Err(RuleConfigError::DuplicateField {
                    index,
                    first: "status",
                    second: "method",
                })
            }
            (None, None) => StatusCode::MOVED_PERMANENTLY,
            (status, method) => {
                let code = status.or(method).unwrap_or_default();
                StatusCode::from_u16(code)
                    .map_err(|_| RuleConfigError::InvalidStatus { index, status: code })?
            }
        };

        let regex = compile_pattern(index, pattern)?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            target: target.to_string(),
            forwarding: record.forwarding.unwrap_or(false),
            status,
            protocol: record.protocol.clone(),
            absolute: record.absolute,
        })
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn forwarding(&self) -> bool {
        self.forwarding
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn absolute(&self) -> Option<bool> {
        self.absolute
    }

    /// Returns true if the pattern occurs anywhere in `uri`.
    pub fn is_match(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }
}

fn required<'a>(
    index: usize,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, RuleConfigError> {
    match value {
        None => Err(RuleConfigError::MissingField { index, field }),
        Some("") => Err(RuleConfigError::EmptyField { index, field }),
        Some(v) => Ok(v),
    }
}

/// Compile a configured pattern, honouring PCRE-style delimiters and modifiers.
fn compile_pattern(index: usize, pattern: &str) -> Result<Regex, RuleConfigError> {
    let (body, modifiers) = split_delimited(pattern).unwrap_or((pattern, ""));

    let mut flags = String::new();
    for modifier in modifiers.chars() {
        match modifier {
            'i' | 'm' | 's' | 'x' | 'U' => flags.push(modifier),
            // Patterns are always Unicode-aware.
            'u' => {}
            other => {
                return Err(RuleConfigError::UnsupportedModifier {
                    index,
                    pattern: pattern.to_string(),
                    modifier: other,
                })
            }
        }
    }

    let source = if flags.is_empty() {
        body.to_string()
    } else {
        format!("(?{flags}){body}")
    };

    Regex::new(&source).map_err(|source| RuleConfigError::InvalidPattern {
        index,
        pattern: pattern.to_string(),
        source,
    })
}

/// Split `/body/flags` into `("body", "flags")`.
///
/// Returns `None` when the pattern is not delimited, in which case it is used
/// verbatim.
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let open = pattern.chars().next()?;
    if !DELIMITERS.contains(&open) {
        return None;
    }
    let close = if open == '{' { '}' } else { open };

    let rest = &pattern[open.len_utf8()..];
    let end = rest.rfind(close)?;
    let modifiers = &rest[end + close.len_utf8()..];

    if modifiers.chars().all(|c| PCRE_MODIFIERS.contains(c)) {
        Some((&rest[..end], modifiers))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = "/.*some-matching-path/";
    const DOMAIN: &str = "domain.com/the-redirect";

    #[test]
    fn test_defaults() {
        let rule = RuleSpec::from_record(0, &RuleRecord::new(PATTERN, DOMAIN)).unwrap();

        assert_eq!(rule.pattern(), PATTERN);
        assert_eq!(rule.target(), DOMAIN);
        assert_eq!(rule.status(), StatusCode::MOVED_PERMANENTLY);
        assert!(!rule.forwarding());
        assert_eq!(rule.protocol(), None);
        assert_eq!(rule.absolute(), None);
    }

    #[test]
    fn test_explicit_fields() {
        let record = RuleRecord::new(PATTERN, DOMAIN)
            .with_status(307)
            .with_forwarding(true)
            .with_protocol("https://")
            .with_absolute(false);
        let rule = RuleSpec::from_record(0, &record).unwrap();

        assert_eq!(rule.status(), StatusCode::TEMPORARY_REDIRECT);
        assert!(rule.forwarding());
        assert_eq!(rule.protocol(), Some("https://"));
        assert_eq!(rule.absolute(), Some(false));
    }

    #[test]
    fn test_synonyms() {
        let record = RuleRecord {
            pattern: Some(PATTERN.into()),
            target: Some(DOMAIN.into()),
            method: Some(302),
            ..RuleRecord::default()
        };
        let rule = RuleSpec::from_record(0, &record).unwrap();

        assert_eq!(rule.target(), DOMAIN);
        assert_eq!(rule.status(), StatusCode::FOUND);
    }

    #[test]
    fn test_duplicate_synonyms_rejected() {
        let record = RuleRecord {
            target: Some("other.com".into()),
            ..RuleRecord::new(PATTERN, DOMAIN)
        };
        assert!(matches!(
            RuleSpec::from_record(0, &record),
            Err(RuleConfigError::DuplicateField { first: "redirect", .. })
        ));

        let record = RuleRecord {
            method: Some(302),
            ..RuleRecord::new(PATTERN, DOMAIN).with_status(301)
        };
        assert!(matches!(
            RuleSpec::from_record(0, &record),
            Err(RuleConfigError::DuplicateField { first: "status", .. })
        ));
    }

    #[test]
    fn test_missing_and_empty_fields() {
        let record = RuleRecord {
            redirect: Some(DOMAIN.into()),
            ..RuleRecord::default()
        };
        assert!(matches!(
            RuleSpec::from_record(3, &record),
            Err(RuleConfigError::MissingField { index: 3, field: "pattern" })
        ));

        let record = RuleRecord {
            pattern: Some(PATTERN.into()),
            ..RuleRecord::default()
        };
        assert!(matches!(
            RuleSpec::from_record(0, &record),
            Err(RuleConfigError::MissingField { field: "redirect", .. })
        ));

        assert!(matches!(
            RuleSpec::from_record(0, &RuleRecord::new("", DOMAIN)),
            Err(RuleConfigError::EmptyField { field: "pattern", .. })
        ));
    }

    #[test]
    fn test_invalid_status() {
        let record = RuleRecord::new(PATTERN, DOMAIN).with_status(42);
        assert!(matches!(
            RuleSpec::from_record(0, &record),
            Err(RuleConfigError::InvalidStatus { status: 42, .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RuleSpec::from_record(5, &RuleRecord::new("/(unclosed/", DOMAIN)).unwrap_err();
        assert!(matches!(err, RuleConfigError::InvalidPattern { index: 5, .. }));
        assert_eq!(err.index(), 5);
    }

    #[test]
    fn test_delimited_pattern_is_unwrapped() {
        let rule = RuleSpec::from_record(
            0,
            &RuleRecord::new(r"/.*some-matching-path\/something-else/", DOMAIN),
        )
        .unwrap();

        // No trailing slash in the URI: the delimiters must not be part of the regex.
        assert!(rule.is_match("http://domain.com/some-matching-path/something-else"));
    }

    #[test]
    fn test_modifiers() {
        let rule = RuleSpec::from_record(0, &RuleRecord::new("#/OLD-page#i", DOMAIN)).unwrap();
        assert!(rule.is_match("http://domain.com/old-page"));

        let err = RuleSpec::from_record(0, &RuleRecord::new("/old/D", DOMAIN)).unwrap_err();
        assert!(matches!(err, RuleConfigError::UnsupportedModifier { modifier: 'D', .. }));
    }

    #[test]
    fn test_bare_pattern() {
        let rule = RuleSpec::from_record(0, &RuleRecord::new("some-matching-path", DOMAIN)).unwrap();
        assert!(rule.is_match("http://domain.com/a/some-matching-path/b"));
        assert!(!rule.is_match("http://domain.com/other"));

        // Trailing text that is not a modifier run: used verbatim.
        let rule = RuleSpec::from_record(0, &RuleRecord::new("/blog/post", DOMAIN)).unwrap();
        assert!(rule.is_match("http://domain.com/blog/post-1"));
    }

    #[test]
    fn test_split_delimited() {
        assert_eq!(split_delimited("/abc/"), Some(("abc", "")));
        assert_eq!(split_delimited("{abc}is"), Some(("abc", "is")));
        assert_eq!(split_delimited("/a/b/c"), None);
        assert_eq!(split_delimited("^/abc"), None);
        assert_eq!(split_delimited("/"), None);
    }
}
