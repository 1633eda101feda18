use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::redirect::RuleSpec;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub rules: usize,
}

/// Rule as exposed by the admin API, in matching order.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RuleSummary {
    pub index: usize,
    pub pattern: String,
    pub target: String,
    pub forwarding: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute: Option<bool>,
}

impl RuleSummary {
    fn new(index: usize, rule: &RuleSpec) -> Self {
        Self {
            index,
            pattern: rule.pattern().to_string(),
            target: rule.target().to_string(),
            forwarding: rule.forwarding(),
            status: rule.status().as_u16(),
            protocol: rule.protocol().map(str::to_string),
            absolute: rule.absolute(),
        }
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        rules: state.resolver.rules().len(),
    })
}

pub async fn get_rules(State(state): State<AdminState>) -> Json<Vec<RuleSummary>> {
    let rules = state.resolver.rules();
    Json(
        rules
            .iter()
            .enumerate()
            .map(|(index, rule)| RuleSummary::new(index, rule))
            .collect(),
    )
}
