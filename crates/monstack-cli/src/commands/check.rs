use anyhow::bail;
use monstack_client::{AlertRouterClient, GrafanaClient, PrometheusClient};
use monstack_core::{Endpoint, MonstackConfig};
use monstack_health::{check_stack, format_table, CheckStatus, StackProbes};

use super::GrafanaArgs;

pub fn check(
    config: &MonstackConfig,
    grafana: &GrafanaArgs,
    prometheus_url: Option<&str>,
    alertmanager_url: Option<&str>,
    format: &str,
) -> anyhow::Result<()> {
    let grafana = grafana.endpoint(&config.grafana);
    let prometheus = prometheus_url.map_or_else(|| config.prometheus.clone(), Endpoint::new);
    let alertmanager = alertmanager_url.map_or_else(|| config.alertmanager.clone(), Endpoint::new);

    let dashboard = GrafanaClient::new(grafana.clone())?;
    let metrics = PrometheusClient::new(prometheus.clone())?;
    let alert_router = AlertRouterClient::new(alertmanager.clone())?;

    let report = check_stack(&StackProbes {
        dashboard: &dashboard,
        dashboard_url: &grafana.url,
        metrics: &metrics,
        metrics_url: &prometheus.url,
        alert_router: &alert_router,
        alert_router_url: &alertmanager.url,
    });

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            print!("{}", format_table(&report));
            println!(
                "\n{} ok, {} warn, {} fail",
                report.count(CheckStatus::Ok),
                report.count(CheckStatus::Warn),
                report.count(CheckStatus::Fail),
            );
        }
    }

    if report.has_failures() {
        bail!("one or more checks failed");
    }
    Ok(())
}
