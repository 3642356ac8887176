mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use common::{FakeDashboard, FakeMetrics, FakeRuntime, RuntimeCall};
use monstack_core::{ClonePorts, ImageSet, StackLayout, TargetGroup};
use monstack_migrate::{clone_stack, CloneOptions, ItemKind, MigrateError};

const SCRAPE_CONFIG: &str = "\
global:
  scrape_interval: 20s

alerting:
  alertmanagers:
  - static_configs:
    - targets:
      - aalert:9093

scrape_configs:
- job_name: grafana
  static_configs:
  - targets:
    - agraf:3000
- job_name: prometheus
  static_configs:
  - targets:
    - aprom:9090
- job_name: scylla
  file_sd_configs:
  - files:
    - /etc/scylla.d/prometheus/scylla_servers.yml
";

fn layout_in(root: &Path, scrape_config: &str) -> StackLayout {
    let layout = StackLayout::default().rooted_at(root);
    fs::create_dir_all(layout.prometheus_config.parent().unwrap()).unwrap();
    fs::write(&layout.prometheus_config, scrape_config).unwrap();
    fs::create_dir_all(&layout.alert_rules_dir).unwrap();
    fs::write(&layout.alertmanager_config, "route:\n  receiver: team\n").unwrap();
    layout
}

fn options(root: &Path, scrape_config: &str) -> CloneOptions {
    let mut opts = CloneOptions::new(
        ClonePorts {
            prometheus_port: 9191,
            grafana_port: 3101,
            alertmanager_port: 9195,
            stack_id: 2,
        },
        ImageSet::default(),
        layout_in(root, scrape_config),
    );
    opts.stage_dir = Some(root.join("stage"));
    opts.wait_interval = Duration::ZERO;
    opts
}

fn source_stack() -> (FakeDashboard, FakeMetrics) {
    let grafana = FakeDashboard::default()
        .with_dashboard(11, "overview", "Overview")
        .with_dashboard(12, "cql", "CQL")
        .with_datasource(1, "prometheus", "prometheus", "http://aprom:9090")
        .with_datasource(2, "alertmanager", "alertmanager", "http://aalert:9093")
        .with_datasource(3, "loki", "loki", "http://loki:3100");
    let metrics = FakeMetrics::default()
        .with_targets(
            "/etc/scylla.d/prometheus/scylla_servers.yml",
            &["10.0.0.1:9180", "10.0.0.2:9180"],
            &[("cluster", "prod"), ("dc", "dc1")],
        )
        .with_targets(
            "/etc/scylla.d/prometheus/node_exporter_servers.yml",
            &["10.0.0.1:9100"],
            &[("cluster", "prod")],
        );
    (grafana, metrics)
}

#[test]
fn unreachable_source_fails_before_any_container_starts() {
    let work = tempfile::tempdir().unwrap();
    let opts = options(work.path(), SCRAPE_CONFIG);
    let runtime = FakeRuntime::default();
    let target = FakeDashboard::default();

    let grafana_down = FakeDashboard {
        down: true,
        ..Default::default()
    };
    let err = clone_stack(&opts, &grafana_down, &FakeMetrics::default(), &target, &runtime)
        .unwrap_err();
    assert!(matches!(err, MigrateError::Client { .. }));
    assert!(err.to_string().contains("source dashboard server"));

    let metrics_down = FakeMetrics {
        down: true,
        ..Default::default()
    };
    let err = clone_stack(&opts, &FakeDashboard::default(), &metrics_down, &target, &runtime)
        .unwrap_err();
    assert!(err.to_string().contains("source metrics store"));

    assert!(runtime.calls().is_empty());
    assert!(target.upserted().is_empty());
}

#[test]
fn clone_deploys_rewired_stack() {
    let work = tempfile::tempdir().unwrap();
    let opts = options(work.path(), SCRAPE_CONFIG);
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime::default();
    let target = FakeDashboard::default();

    let report = clone_stack(&opts, &source, &metrics, &target, &runtime).unwrap();

    assert_eq!(report.dashboards, 2);
    assert_eq!(report.datasources, 3);
    assert_eq!(report.target_files, 2);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.deployment.network, "monstack-net-2");
    assert_eq!(report.deployment.metrics_store.name, "aprom-s2-9191");
    assert_eq!(report.deployment.grafana_url, "http://localhost:3101");

    let calls = runtime.calls();
    assert_eq!(calls[0], RuntimeCall::CreateNetwork("monstack-net-2".into()));
    let started = runtime.started();
    let names: Vec<&str> = started.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["aalert-s2-9195", "aprom-s2-9191", "agraf-s2-3101"]);
    assert!(started.iter().all(|c| c.network == "monstack-net-2"));
    assert_eq!(
        &calls[4..],
        &[
            RuntimeCall::Wait("http://localhost:9191/-/ready".into()),
            RuntimeCall::Wait("http://localhost:3101/api/health".into()),
        ]
    );

    let alert = &started[0];
    assert_eq!(alert.ports[0].host, 9195);
    assert_eq!(alert.ports[0].container, 9093);
    assert_eq!(alert.mounts[0].target, "/etc/alertmanager/config.yml");
    assert!(alert.mounts[0].read_only);
    assert!(alert.mounts[0].source.is_absolute());

    let prom = &started[1];
    assert!(prom.command.contains(&"--web.enable-lifecycle".to_string()));
    assert!(prom.command.contains(&"--web.enable-admin-api".to_string()));
    assert!(prom.mounts.iter().all(|m| m.read_only));
    let config_mount = prom
        .mounts
        .iter()
        .find(|m| m.target == "/etc/prometheus/prometheus.yml")
        .unwrap();
    let rewritten = fs::read_to_string(&config_mount.source).unwrap();
    assert!(rewritten.contains("    - agraf-s2-3101:3000\n"));
    assert!(rewritten.contains("    - localhost:9090\n"));
    assert!(rewritten.contains("      - aalert-s2-9195:9093\n"));
    assert!(rewritten.contains("    - /etc/scylla.d/prometheus/scylla_servers.yml\n"));

    let target_mount = prom
        .mounts
        .iter()
        .find(|m| m.target == "/etc/scylla.d/prometheus")
        .unwrap();
    let staged: Vec<TargetGroup> = serde_yaml::from_str(
        &fs::read_to_string(target_mount.source.join("scylla_servers.yml")).unwrap(),
    )
    .unwrap();
    assert_eq!(staged.len(), 2);
    assert_eq!(staged[0].labels["dc"], "dc1");
    assert!(target_mount.source.join("node_exporter_servers.yml").is_file());

    let grafana = &started[2];
    assert!(grafana
        .env
        .contains(&("GF_AUTH_ANONYMOUS_ENABLED".to_string(), "true".to_string())));
    assert_eq!(grafana.ports[0].container, 3000);

    let upserted = target.upserted();
    let url_of = |name: &str| upserted.iter().find(|d| d.name == name).unwrap().url.clone();
    assert_eq!(url_of("prometheus"), "http://aprom-s2-9191:9090");
    assert_eq!(url_of("alertmanager"), "http://aalert-s2-9195:9093");
    assert_eq!(url_of("loki"), "http://loki:3100");
    assert!(upserted.iter().all(|d| d.id == 0));

    let uploaded = target.uploaded();
    assert_eq!(uploaded.len(), 2);
    assert!(uploaded.iter().all(|(d, folder, overwrite)| {
        d.get("id").is_none() && d.get("dashboard").is_none() && *folder == 0 && *overwrite
    }));
}

#[test]
fn unmatched_rewrite_is_a_warning() {
    let work = tempfile::tempdir().unwrap();
    let config = "scrape_configs:\n- job_name: scylla\n  static_configs:\n  - targets: ['a:9180']\n";
    let opts = options(work.path(), config);
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime::default();
    let target = FakeDashboard::default();

    let report = clone_stack(&opts, &source, &metrics, &target, &runtime).unwrap();
    let scrape: Vec<&str> = report
        .warnings
        .iter()
        .filter(|w| w.item_kind == ItemKind::ScrapeConfig)
        .map(|w| w.item.as_str())
        .collect();
    assert_eq!(scrape, vec!["job grafana", "job prometheus", "alertmanager"]);
}

#[test]
fn failed_start_leaves_earlier_containers_running() {
    let work = tempfile::tempdir().unwrap();
    let opts = options(work.path(), SCRAPE_CONFIG);
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime {
        fail_start: vec!["aprom-s2-9191".to_string()],
        ..Default::default()
    };
    let target = FakeDashboard::default();

    let err = clone_stack(&opts, &source, &metrics, &target, &runtime).unwrap_err();
    assert!(matches!(err, MigrateError::Runtime { .. }));
    assert!(err.to_string().contains("starting metrics store"));

    let names: Vec<String> = runtime.started().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["aalert-s2-9195", "aprom-s2-9191"]);
    assert!(target.upserted().is_empty());
}

#[test]
fn readiness_timeout_is_fatal() {
    let work = tempfile::tempdir().unwrap();
    let opts = options(work.path(), SCRAPE_CONFIG);
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime {
        never_ready: vec!["http://localhost:3101/api/health".to_string()],
        ..Default::default()
    };
    let target = FakeDashboard::default();

    let err = clone_stack(&opts, &source, &metrics, &target, &runtime).unwrap_err();
    assert!(err.to_string().contains("dashboard server health check"));
    assert!(target.uploaded().is_empty());
}

#[test]
fn temporary_stage_is_removed() {
    let work = tempfile::tempdir().unwrap();
    let mut opts = options(work.path(), SCRAPE_CONFIG);
    opts.stage_dir = None;
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime::default();

    clone_stack(&opts, &source, &metrics, &FakeDashboard::default(), &runtime).unwrap();
    let prom = &runtime.started()[1];
    assert!(!prom.mounts[0].source.exists());
}

#[test]
fn missing_scrape_config_is_fatal() {
    let work = tempfile::tempdir().unwrap();
    let opts = options(work.path(), SCRAPE_CONFIG);
    fs::remove_file(&opts.layout.prometheus_config).unwrap();
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime::default();

    let err = clone_stack(&opts, &source, &metrics, &FakeDashboard::default(), &runtime).unwrap_err();
    assert!(matches!(err, MigrateError::Io { .. }));
    assert!(runtime.calls().is_empty());
}

#[test]
fn inline_target_list_is_left_alone_and_reported() {
    let work = tempfile::tempdir().unwrap();
    let config = "\
scrape_configs:
- job_name: grafana
  static_configs:
  - targets: ['agraf:3000']
- job_name: prometheus
  static_configs:
  - targets:
    - aprom:9090
";
    let opts = options(work.path(), config);
    let (source, metrics) = source_stack();
    let runtime = FakeRuntime::default();

    let report = clone_stack(&opts, &source, &metrics, &FakeDashboard::default(), &runtime).unwrap();
    assert!(report
        .warnings
        .iter()
        .any(|w| w.item_kind == ItemKind::ScrapeConfig && w.item == "job grafana"));

    let staged = fs::read_to_string(work.path().join("stage/prometheus.yml")).unwrap();
    assert!(staged.contains("  - targets: ['agraf:3000']\n"));
    assert!(staged.contains("    - localhost:9090\n"));
    assert!(!staged.contains("agraf-s2-3101"));
}

#[test]
fn relative_discovery_files_do_not_shadow_the_config_dir() {
    let work = tempfile::tempdir().unwrap();
    let opts = options(work.path(), SCRAPE_CONFIG);
    let (source, _) = source_stack();
    let metrics = FakeMetrics::default().with_targets(
        "scylla_manager_servers.yml",
        &["10.0.0.9:5090"],
        &[("cluster", "prod")],
    );
    let runtime = FakeRuntime::default();

    clone_stack(&opts, &source, &metrics, &FakeDashboard::default(), &runtime).unwrap();
    let prom = &runtime.started()[1];
    let targets: Vec<&str> = prom.mounts.iter().map(|m| m.target.as_str()).collect();
    assert_eq!(
        targets,
        vec![
            "/etc/prometheus/prometheus.yml",
            "/etc/prometheus/prom_rules",
            "/etc/prometheus/scylla_manager_servers.yml",
        ]
    );
    assert!(prom.mounts[2].source.is_file());
}
