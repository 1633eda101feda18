//! Redirect resolution.
//!
//! # Responsibilities
//! - Find the first rule matching the request URI
//! - Build the destination URL from the rule and the request
//! - Report an explicit no-match instead of a silent default
//!
//! # Design Decisions
//! - Pure function of (request, rules); no I/O and no mutation
//! - The resolver holds the current rule set behind `ArcSwap` so a reload
//!   swaps the whole set atomically; in-flight requests keep their snapshot

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::StatusCode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::redirect::error::RuleNotFoundError;
use crate::redirect::rule::RuleSpec;
use crate::redirect::rule_set::RuleSet;

/// Conservative "starts with a domain name" check for targets without an
/// explicit `absolute` flag.
static TARGET_HAS_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([a-z0-9]([-a-z0-9]*[a-z0-9]+)?){1,63}\.)+[a-z]{2,11}")
        .expect("host detection regex is valid")
});

/// The facts about an inbound request needed to match and build a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Full URI: scheme, host, path and query.
    pub uri: String,
    /// Path component only.
    pub path: String,
    /// Whether the request arrived over TLS.
    pub secure: bool,
    /// Host name, without port.
    pub host: String,
    /// Path plus query string, as requested.
    pub request_uri: String,
}

impl RequestContext {
    pub fn new(
        uri: impl Into<String>,
        path: impl Into<String>,
        secure: bool,
        host: impl Into<String>,
        request_uri: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            path: path.into(),
            secure,
            host: host.into(),
            request_uri: request_uri.into(),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectDecision {
    /// Value for the `Location` header.
    pub url: String,
    /// Redirect status.
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

/// Resolve `context` against `rules`.
pub fn resolve(context: &RequestContext, rules: &RuleSet) -> Result<RedirectDecision, RuleNotFoundError> {
    let rule = rules.find_match(&context.uri).ok_or_else(|| RuleNotFoundError {
        uri: context.uri.clone(),
    })?;

    let url = format!(
        "{}{}{}",
        scheme(rule, context),
        authority_and_path(rule, context),
        forwarded_path(rule, context)
    );

    Ok(RedirectDecision {
        url,
        status: rule.status(),
    })
}

fn scheme<'a>(rule: &'a RuleSpec, context: &RequestContext) -> &'a str {
    match rule.protocol() {
        Some(protocol) => protocol,
        None if context.secure => "https://",
        None => "http://",
    }
}

fn authority_and_path(rule: &RuleSpec, context: &RequestContext) -> String {
    let absolute = rule
        .absolute()
        .unwrap_or_else(|| target_has_host(rule.target()));

    if absolute {
        rule.target().to_string()
    } else {
        format!("{}{}", context.host, rule.target())
    }
}

fn forwarded_path<'a>(rule: &RuleSpec, context: &'a RequestContext) -> &'a str {
    if rule.forwarding() {
        &context.request_uri
    } else {
        ""
    }
}

/// Returns true if `target` looks like it starts with a host name.
pub fn target_has_host(target: &str) -> bool {
    TARGET_HAS_HOST.is_match(target)
}

/// Resolver bound to a live, replaceable rule set.
#[derive(Debug)]
pub struct RedirectResolver {
    rules: ArcSwap<RuleSet>,
}

impl RedirectResolver {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: ArcSwap::from_pointee(rules),
        }
    }

    /// Resolve against the rule set current at call time.
    pub fn resolve(&self, context: &RequestContext) -> Result<RedirectDecision, RuleNotFoundError> {
        resolve(context, &self.rules.load())
    }

    /// Snapshot of the current rule set.
    pub fn rules(&self) -> Arc<RuleSet> {
        self.rules.load_full()
    }

    /// Atomically replace the rule set.
    pub fn replace_rules(&self, rules: RuleSet) {
        self.rules.store(Arc::new(rules));
    }
}
