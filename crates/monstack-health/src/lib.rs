//! monstack-health — API-level verification of a running stack.
//!
//! Unlike a container status listing, these checks ask each service to do
//! real work: the dashboard server lists dashboards, the metrics store
//! answers a query, every datasource is probed through the dashboard server.

pub mod checker;
pub mod report;

use serde::Serialize;

pub use checker::{check_stack, StackProbes};
pub use report::{format_table, HealthReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl CheckStatus {
    /// Two-character marker used in the report table.
    pub fn marker(self) -> &'static str {
        match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "!!",
            CheckStatus::Fail => "XX",
        }
    }
}

/// Outcome of one check against one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub component: String,
    pub check: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    pub fn new(
        component: &str,
        check: &str,
        status: CheckStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            component: component.to_string(),
            check: check.to_string(),
            status,
            detail: detail.into(),
        }
    }
}
