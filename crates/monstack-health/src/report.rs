//! Report table formatting.

use serde::Serialize;

use crate::{CheckResult, CheckStatus};

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub results: Vec<CheckResult>,
}

impl HealthReport {
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status == CheckStatus::Fail)
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

pub fn format_table(report: &HealthReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<14} {:<20} {:<6} {}\n", "COMPONENT", "CHECK", "STATUS", "DETAIL"));
    out.push_str(&"-".repeat(80));
    out.push('\n');
    for r in &report.results {
        out.push_str(&format!(
            "{:<14} {:<20} [{}]   {}\n",
            r.component,
            r.check,
            r.status.marker(),
            r.detail
        ));
    }
    out
}
