//! Redirect rule engine.
//!
//! # Data Flow
//! ```text
//! Rule Compilation (at startup / reload):
//!     RulesConfig (list or pattern-keyed map)
//!     → RulesConfig::records (one canonical shape)
//!     → RuleSpec::from_record (defaults, compile pattern)
//!     → Freeze as immutable RuleSet
//!
//! Per request:
//!     RequestContext (uri, host, secure, request uri)
//!     → RuleSet::find_match (first match wins)
//!     → resolver.rs (scheme + target + forwarded path)
//!     → RedirectDecision or RuleNotFoundError
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same rule
//! - First match wins, in configuration order

pub mod error;
pub mod resolver;
pub mod rule;
pub mod rule_set;

pub use error::{RuleConfigError, RuleNotFoundError};
pub use resolver::{resolve, RedirectDecision, RedirectResolver, RequestContext};
pub use rule::{RuleRecord, RuleSpec};
pub use rule_set::{RuleSet, RulesConfig};
