//! Ordered rule collection and first-match lookup.
//!
//! # Responsibilities
//! - Accept both configuration shapes (list of records, map keyed by pattern)
//! - Normalize them into one ordered list of [`RuleSpec`]
//! - Look up the first rule whose pattern matches a URI
//!
//! # Design Decisions
//! - Configuration order is preserved exactly; no sorting or deduplication
//! - All patterns are compiled up front so a bad rule fails startup, not a request
//! - Immutable after construction (thread-safe without locks)

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::redirect::error::RuleConfigError;
use crate::redirect::rule::{RuleRecord, RuleSpec};

/// Rules as they appear in configuration.
///
/// ```toml
/// [[redirect.rules]]
/// pattern = "/.*old-path/"
/// redirect = "domain.com/new-path"
/// ```
///
/// or, keyed by pattern:
///
/// ```toml
/// [redirect.rules."/.*old-path/"]
/// redirect = "domain.com/new-path"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesConfig {
    /// A list of records, each carrying its own `pattern`.
    List(Vec<RuleRecord>),
    /// Records keyed by pattern, in document order.
    Keyed(Vec<(String, RuleRecord)>),
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig::List(Vec::new())
    }
}

impl RulesConfig {
    /// Normalize either shape into records that each carry their pattern.
    ///
    /// For the keyed shape the map key is the pattern, overriding any
    /// `pattern` field inside the entry.
    pub fn records(&self) -> Vec<RuleRecord> {
        match self {
            RulesConfig::List(records) => records.clone(),
            RulesConfig::Keyed(entries) => entries
                .iter()
                .map(|(pattern, record)| RuleRecord {
                    pattern: Some(pattern.clone()),
                    ..record.clone()
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RulesConfig::List(records) => records.len(),
            RulesConfig::Keyed(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'de> Deserialize<'de> for RulesConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = RulesConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of redirect rules or a table of rules keyed by pattern")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut records = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(record) = seq.next_element::<RuleRecord>()? {
                    records.push(record);
                }
                Ok(RulesConfig::List(records))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((pattern, record)) = map.next_entry::<String, RuleRecord>()? {
                    entries.push((pattern, record));
                }
                Ok(RulesConfig::Keyed(entries))
            }
        }

        deserializer.deserialize_any(RulesVisitor)
    }
}

impl Serialize for RulesConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.records())
    }
}

/// The compiled, ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RuleSpec>,
}

impl RuleSet {
    /// Wrap already-built rules, keeping their order.
    pub fn new(rules: Vec<RuleSpec>) -> Self {
        Self { rules }
    }

    /// Build the rule set from configuration, failing on the first bad rule.
    pub fn from_config(config: &RulesConfig) -> Result<Self, RuleConfigError> {
        Self::from_records(&config.records())
    }

    /// Build from raw records. Rules with a non-3xx status are kept and
    /// logged once here.
    pub fn from_records(records: &[RuleRecord]) -> Result<Self, RuleConfigError> {
        let rules = records
            .iter()
            .enumerate()
            .map(|(index, record)| RuleSpec::from_record(index, record))
            .collect::<Result<Vec<_>, _>>()?;

        for (index, rule) in rules.iter().enumerate() {
            if !rule.status().is_redirection() {
                tracing::warn!(
                    rule = index,
                    pattern = %rule.pattern(),
                    status = rule.status().as_u16(),
                    "Redirect rule uses a non-3xx status"
                );
            }
        }

        Ok(Self { rules })
    }

    /// First rule, in configuration order, whose pattern matches `uri`.
    pub fn find_match(&self, uri: &str) -> Option<&RuleSpec> {
        self.rules.iter().find(|rule| rule.is_match(uri))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSpec> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
