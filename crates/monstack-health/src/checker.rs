//! The individual checks. Each returns one or more results and never fails;
//! a broken service shows up as a `fail` or `warn` row.

use monstack_client::{AlertRouterApi, DashboardApi, MetricsApi};
use monstack_core::AlertState;
use tracing::debug;

use crate::report::HealthReport;
use crate::{CheckResult, CheckStatus};

const GRAFANA: &str = "Grafana";
const PROMETHEUS: &str = "Prometheus";
const ALERTMANAGER: &str = "AlertManager";
const DATASOURCE: &str = "Datasource";

/// Path queried through the datasource proxy when a prometheus datasource's
/// own health endpoint fails.
const PROXY_FALLBACK_PATH: &str = "api/v1/query?query=up";

/// The three services of one stack, with the URLs shown on success.
pub struct StackProbes<'a> {
    pub dashboard: &'a dyn DashboardApi,
    pub dashboard_url: &'a str,
    pub metrics: &'a dyn MetricsApi,
    pub metrics_url: &'a str,
    pub alert_router: &'a dyn AlertRouterApi,
    pub alert_router_url: &'a str,
}

pub fn check_stack(probes: &StackProbes<'_>) -> HealthReport {
    let mut results = Vec::new();
    results.extend(check_dashboard_server(probes.dashboard, probes.dashboard_url));
    results.extend(check_metrics_store(probes.metrics, probes.metrics_url));
    results.push(check_alert_router(probes.alert_router, probes.alert_router_url));
    results.extend(check_datasources(probes.dashboard));
    results.extend(check_alerts(probes.metrics));
    HealthReport { results }
}

pub fn check_dashboard_server(api: &dyn DashboardApi, url: &str) -> Vec<CheckResult> {
    if let Err(e) = api.health() {
        return vec![CheckResult::new(GRAFANA, "API Health", CheckStatus::Fail, e.to_string())];
    }
    let mut results = vec![CheckResult::new(GRAFANA, "API Health", CheckStatus::Ok, url)];

    results.push(match api.search_dashboards() {
        Err(e) => CheckResult::new(
            GRAFANA,
            "Dashboards",
            CheckStatus::Warn,
            format!("could not list dashboards: {e}"),
        ),
        Ok(found) if found.is_empty() => {
            CheckResult::new(GRAFANA, "Dashboards", CheckStatus::Warn, "no dashboards found")
        }
        Ok(found) => CheckResult::new(
            GRAFANA,
            "Dashboards",
            CheckStatus::Ok,
            format!("{} dashboards loaded", found.len()),
        ),
    });
    results
}

pub fn check_metrics_store(api: &dyn MetricsApi, url: &str) -> Vec<CheckResult> {
    if let Err(e) = api.health() {
        return vec![CheckResult::new(PROMETHEUS, "API Health", CheckStatus::Fail, e.to_string())];
    }
    let mut results = vec![CheckResult::new(PROMETHEUS, "API Health", CheckStatus::Ok, url)];

    let data = match api.query_instant("up") {
        Ok(data) => data,
        Err(e) => {
            results.push(CheckResult::new(
                PROMETHEUS,
                "Scrape targets",
                CheckStatus::Warn,
                format!("could not query targets: {e}"),
            ));
            return results;
        }
    };

    let Some(samples) = data.get("result").and_then(|r| r.as_array()) else {
        results.push(CheckResult::new(
            PROMETHEUS,
            "Scrape targets",
            CheckStatus::Warn,
            "unexpected query result",
        ));
        return results;
    };

    let (mut up, mut down) = (0usize, 0usize);
    for sample in samples {
        let Some(value) = sample.get("value").and_then(|v| v.as_array()) else {
            continue;
        };
        if value.len() != 2 {
            continue;
        }
        if value[1].as_str() == Some("1") {
            up += 1;
        } else {
            down += 1;
        }
    }

    let status = match (up, down) {
        (_, 0) => CheckStatus::Ok,
        (0, _) => CheckStatus::Fail,
        _ => CheckStatus::Warn,
    };
    results.push(CheckResult::new(
        PROMETHEUS,
        "Scrape targets",
        status,
        format!("{up} up, {down} down"),
    ));
    results
}

pub fn check_alert_router(api: &dyn AlertRouterApi, url: &str) -> CheckResult {
    match api.health() {
        Ok(()) => CheckResult::new(ALERTMANAGER, "API Health", CheckStatus::Ok, url),
        Err(e) => {
            let detail = match e.status() {
                Some(status) => format!("status {status}"),
                None => e.to_string(),
            };
            CheckResult::new(ALERTMANAGER, "API Health", CheckStatus::Fail, detail)
        }
    }
}

pub fn check_datasources(api: &dyn DashboardApi) -> Vec<CheckResult> {
    let datasources = match api.list_datasources() {
        Ok(list) => list,
        Err(e) => {
            return vec![CheckResult::new(
                GRAFANA,
                "Datasources",
                CheckStatus::Warn,
                format!("could not list datasources: {e}"),
            )];
        }
    };

    datasources
        .iter()
        .map(|ds| {
            let mut probe = api.check_datasource_health(ds.id);
            if probe.is_err() && ds.ds_type == "prometheus" {
                debug!(datasource = %ds.name, "health endpoint failed, trying proxy query");
                probe = api.proxy_query(ds.id, PROXY_FALLBACK_PATH);
            }
            match probe {
                Ok(()) => CheckResult::new(
                    DATASOURCE,
                    &ds.name,
                    CheckStatus::Ok,
                    format!("{} -> {}", ds.ds_type, ds.url),
                ),
                Err(e) => CheckResult::new(
                    DATASOURCE,
                    &ds.name,
                    CheckStatus::Fail,
                    format!("{} -> {} ({e})", ds.ds_type, ds.url),
                ),
            }
        })
        .collect()
}

pub fn check_alerts(api: &dyn MetricsApi) -> Vec<CheckResult> {
    let alerts = match api.query_alerts() {
        Ok(alerts) => alerts,
        Err(e) => {
            return vec![CheckResult::new(
                PROMETHEUS,
                "Alerts",
                CheckStatus::Warn,
                format!("could not query alerts: {e}"),
            )];
        }
    };

    let firing: Vec<&str> = alerts
        .iter()
        .filter(|a| a.state == AlertState::Firing)
        .map(|a| a.name())
        .collect();
    let pending = alerts.iter().filter(|a| a.state == AlertState::Pending).count();

    if firing.is_empty() && pending == 0 {
        return vec![CheckResult::new(PROMETHEUS, "Alerts", CheckStatus::Ok, "no alerts firing")];
    }

    let status = if firing.is_empty() { CheckStatus::Ok } else { CheckStatus::Warn };
    let mut results = vec![CheckResult::new(
        PROMETHEUS,
        "Alerts",
        status,
        format!("{} firing, {pending} pending", firing.len()),
    )];

    if !firing.is_empty() {
        results.push(CheckResult::new(
            PROMETHEUS,
            "Firing alerts",
            CheckStatus::Warn,
            summarize_names(&firing),
        ));
    }
    results
}

/// `"a (x2), b"` in first-seen order.
fn summarize_names(names: &[&str]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &name in names {
        match counts.iter().position(|(n, _)| *n == name) {
            Some(i) => counts[i].1 += 1,
            None => counts.push((name, 1)),
        }
    }
    counts
        .iter()
        .map(|(name, count)| {
            if *count > 1 {
                format!("{name} (x{count})")
            } else {
                name.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_deduplicated_in_order() {
        assert_eq!(
            summarize_names(&["Down", "HighLatency", "Down", "Down"]),
            "Down (x3), HighLatency"
        );
        assert_eq!(summarize_names(&["unnamed"]), "unnamed");
    }
}
