use std::path::PathBuf;

use anyhow::Context;
use monstack_client::{DashboardApi, GrafanaClient, MetricsApi, PrometheusClient};
use monstack_core::{ClonePorts, Endpoint, MonstackConfig};
use monstack_migrate::{
    clone_stack, copy_stack, export_stack, import_stack, CloneOptions, CopyOptions, ExportOptions,
    ImportOptions,
};
use monstack_runtime::detect_runtime;

use super::{print_warnings, GrafanaArgs, LayoutArgs};

pub fn export(
    config: &MonstackConfig,
    grafana: Option<&GrafanaArgs>,
    prometheus_url: Option<&str>,
    output: PathBuf,
    layout: &LayoutArgs,
    target_files: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let dashboard = grafana
        .map(|args| GrafanaClient::new(args.endpoint(&config.grafana)))
        .transpose()?;
    let metrics = prometheus_url
        .map(|url| PrometheusClient::new(Endpoint::new(url)))
        .transpose()?;
    if metrics.is_none() {
        tracing::warn!("no --prometheus-url given, no TSDB snapshot will be requested");
    }

    let opts = ExportOptions {
        output,
        layout: layout.apply(&config.layout),
        target_files,
        dashboard_url: dashboard
            .as_ref()
            .map(|c| c.endpoint().url.clone())
            .unwrap_or_default(),
        metrics_url: prometheus_url.unwrap_or_default().to_string(),
    };

    let report = export_stack(
        &opts,
        dashboard.as_ref().map(|c| c as &dyn DashboardApi),
        metrics.as_ref().map(|c| c as &dyn MetricsApi),
    )
    .context("export failed")?;

    println!(
        "✓ Stack exported to {} ({:.1} KB)",
        report.archive.output_path.display(),
        report.archive.size_bytes as f64 / 1024.0
    );
    println!("  SHA256:      {}", report.archive.sha256);
    println!("  Dashboards:  {}", report.metadata.dashboard_count);
    println!("  Datasources: {}", report.metadata.datasource_count);
    if let Some(snapshot) = &report.metadata.prometheus_snapshot {
        println!("  TSDB snapshot {snapshot} left on the metrics store host");
    }
    print_warnings(&report.warnings);
    Ok(())
}

pub fn import(
    config: &MonstackConfig,
    path: PathBuf,
    grafana: Option<&GrafanaArgs>,
    prometheus_url: Option<String>,
    layout: &LayoutArgs,
) -> anyhow::Result<()> {
    let dashboard = grafana
        .map(|args| GrafanaClient::new(args.endpoint(&config.grafana)))
        .transpose()?;
    let opts = ImportOptions {
        source: path,
        layout: layout.apply(&config.layout),
        metrics_url: prometheus_url,
    };

    let report = match import_stack(&opts, dashboard.as_ref().map(|c| c as &dyn DashboardApi)) {
        Ok(report) => report,
        Err(e) if e.is_integrity() => {
            eprintln!("✗ Refusing {}: the archive is corrupt or tampered with", opts.source.display());
            return Err(anyhow::Error::new(e).context("import rejected"));
        }
        Err(e) => return Err(anyhow::Error::new(e).context("import failed")),
    };

    println!("✓ Stack imported (exported at {})", report.metadata.export_timestamp);
    println!("  Files restored:       {}", report.restored_files.len());
    println!("  Datasources uploaded: {}", report.datasources_uploaded);
    println!("  Dashboards uploaded:  {}", report.dashboards_uploaded);
    print_warnings(&report.warnings);
    Ok(())
}

pub fn clone(
    config: &MonstackConfig,
    grafana: &GrafanaArgs,
    prometheus_url: Option<&str>,
    ports: ClonePorts,
    stage_dir: Option<PathBuf>,
    layout: &LayoutArgs,
) -> anyhow::Result<()> {
    let source = GrafanaClient::new(grafana.endpoint(&config.grafana))?;
    let source_metrics = PrometheusClient::new(
        prometheus_url.map_or_else(|| config.prometheus.clone(), Endpoint::new),
    )?;
    let target = GrafanaClient::new(
        Endpoint::new(format!("http://localhost:{}", ports.grafana_port)).with_basic_auth("admin", "admin"),
    )?;
    let runtime = detect_runtime().context("no container runtime available")?;

    let mut opts = CloneOptions::new(ports, config.images.clone(), layout.apply(&config.layout));
    opts.stage_dir = stage_dir;

    let report = clone_stack(&opts, &source, &source_metrics, &target, &runtime)
        .context("clone failed")?;

    let d = &report.deployment;
    println!("✓ Cloned stack is running on network {}", d.network);
    println!("  Grafana:      {}", d.grafana_url);
    println!("  Prometheus:   {}", d.prometheus_url);
    println!("  AlertManager: {}", d.alertmanager_url);
    println!(
        "  {} dashboards, {} datasources, {} target files",
        report.dashboards, report.datasources, report.target_files
    );
    print_warnings(&report.warnings);
    Ok(())
}

pub fn copy(
    source: GrafanaArgs,
    target: GrafanaArgs,
    include_dashboards: bool,
    include_datasources: bool,
) -> anyhow::Result<()> {
    let source = GrafanaClient::new(source.endpoint(&Endpoint::default()))?;
    let target = GrafanaClient::new(target.endpoint(&Endpoint::default()))?;
    let opts = CopyOptions {
        include_dashboards,
        include_datasources,
    };

    let report = copy_stack(&opts, &source, &target).context("copy failed")?;
    println!(
        "✓ Copied {} datasources and {} dashboards",
        report.datasources_copied, report.dashboards_copied
    );
    print_warnings(&report.warnings);
    Ok(())
}
