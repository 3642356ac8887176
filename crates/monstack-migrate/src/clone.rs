//! Clone a running stack onto new ports.
//!
//! Stages, in order, each fatal unless noted:
//!
//! 1. validate: source dashboard server and metrics store answer health probes
//! 2. export: dashboards (per-item failures are warnings), datasources, and
//!    the live file-based discovery groups of the source metrics store
//! 3. stage: target files plus a scrape config rewritten for the new names
//! 4. deploy: network, alert router, metrics store, dashboard server
//! 5. wait: both new HTTP services become ready
//! 6. re-import: datasources with rewritten URLs, then dashboards
//!    (per-item failures are warnings)
//!
//! Nothing is torn down on failure. Containers started before a failing
//! stage keep running; only a temporary staging directory is removed.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{self, Path, PathBuf};
use std::time::Duration;

use monstack_client::{DashboardApi, MetricsApi};
use monstack_core::{ClonePorts, Datasource, DatasourceRole, ImageSet, StackLayout, TargetGroup, TargetGroupMap};
use monstack_runtime::{
    container_name, network_name, ContainerConfig, ContainerHandle, ContainerRuntime, Mount,
    PortBinding, Role,
};
use tempfile::TempDir;
use tracing::info;

use crate::error::{MigrateError, MigrateResult};
use crate::report::{record, CloneDeployment, CloneReport, ItemKind, Warning};
use crate::rewrite::{replace_alertmanager_target, replace_job_target};
use crate::snapshot::sanitize_name;
use crate::transfer::{download_dashboards, upload_dashboards, upload_datasources};

pub const WAIT_ATTEMPTS: u32 = 35;
pub const WAIT_INTERVAL: Duration = Duration::from_secs(1);

const PROMETHEUS_PORT: u16 = 9090;
const GRAFANA_PORT: u16 = 3000;
const ALERTMANAGER_PORT: u16 = 9093;

/// Directory relative file-discovery paths are resolved against inside the
/// metrics-store container.
const PROMETHEUS_CONFIG_DIR: &str = "/etc/prometheus";

#[derive(Debug, Clone)]
pub struct CloneOptions {
    pub ports: ClonePorts,
    pub images: ImageSet,
    /// Local scrape config, alert rules, alert-router config and dashboard
    /// server directories mounted into the new containers.
    pub layout: StackLayout,
    /// Keep staged files here instead of a temporary directory. The new
    /// metrics store mounts them, so a kept directory outlives the command.
    pub stage_dir: Option<PathBuf>,
    pub wait_attempts: u32,
    pub wait_interval: Duration,
}

impl CloneOptions {
    pub fn new(ports: ClonePorts, images: ImageSet, layout: StackLayout) -> Self {
        Self {
            ports,
            images,
            layout,
            stage_dir: None,
            wait_attempts: WAIT_ATTEMPTS,
            wait_interval: WAIT_INTERVAL,
        }
    }
}

/// Container and network names for one clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneNames {
    pub network: String,
    pub alert_router: String,
    pub metrics_store: String,
    pub dashboard_server: String,
}

impl CloneNames {
    pub fn for_ports(ports: &ClonePorts) -> Self {
        Self {
            network: network_name(ports.stack_id),
            alert_router: container_name(Role::AlertRouter, ports.alertmanager_port, ports.stack_id),
            metrics_store: container_name(Role::MetricsStore, ports.prometheus_port, ports.stack_id),
            dashboard_server: container_name(Role::DashboardServer, ports.grafana_port, ports.stack_id),
        }
    }
}

/// Everything pulled from the source stack.
struct SourceState {
    dashboards: Vec<(String, serde_json::Value)>,
    datasources: Vec<Datasource>,
    target_groups: TargetGroupMap,
}

/// Clone the stack behind `source`/`source_metrics` and import its
/// dashboards and datasources into `target`, the client for the new
/// dashboard server at `http://localhost:<grafana_port>`.
pub fn clone_stack(
    opts: &CloneOptions,
    source: &dyn DashboardApi,
    source_metrics: &dyn MetricsApi,
    target: &dyn DashboardApi,
    runtime: &dyn ContainerRuntime,
) -> MigrateResult<CloneReport> {
    source
        .health()
        .map_err(|e| MigrateError::client("source dashboard server not reachable", e))?;
    source_metrics
        .health()
        .map_err(|e| MigrateError::client("source metrics store not reachable", e))?;

    let mut warnings = Vec::new();
    let state = export_source(source, source_metrics, &mut warnings)?;

    let (_stage_guard, stage_root) = staging_dir(opts.stage_dir.as_deref())?;
    let names = CloneNames::for_ports(&opts.ports);

    let target_mounts = write_target_files(&stage_root, &state.target_groups)?;
    let target_files = state.target_groups.len();
    let config_path = stage_scrape_config(&opts.layout, &stage_root, &names, &mut warnings)?;

    let deployment = deploy(opts, runtime, &names, &config_path, target_mounts)?;

    let prometheus_ready = format!("http://localhost:{}/-/ready", opts.ports.prometheus_port);
    runtime
        .wait_for_health(&prometheus_ready, opts.wait_attempts, opts.wait_interval)
        .map_err(|e| MigrateError::runtime("metrics store health check", e))?;
    let grafana_ready = format!("http://localhost:{}/api/health", opts.ports.grafana_port);
    runtime
        .wait_for_health(&grafana_ready, opts.wait_attempts, opts.wait_interval)
        .map_err(|e| MigrateError::runtime("dashboard server health check", e))?;

    let metrics_url = format!("http://{}:{PROMETHEUS_PORT}", names.metrics_store);
    let alert_url = format!("http://{}:{ALERTMANAGER_PORT}", names.alert_router);
    let datasources = upload_datasources(
        target,
        state.datasources,
        |ds| match ds.role() {
            DatasourceRole::MetricsStore => ds.url = metrics_url.clone(),
            DatasourceRole::AlertRouter => ds.url = alert_url.clone(),
            DatasourceRole::Other => {}
        },
        &mut warnings,
    );
    let dashboards = upload_dashboards(target, state.dashboards, &mut warnings);

    info!(
        grafana = %deployment.grafana_url,
        prometheus = %deployment.prometheus_url,
        alertmanager = %deployment.alertmanager_url,
        "cloned stack is running"
    );

    Ok(CloneReport {
        deployment,
        dashboards,
        datasources,
        target_files,
        warnings,
    })
}

fn export_source(
    source: &dyn DashboardApi,
    metrics: &dyn MetricsApi,
    warnings: &mut Vec<Warning>,
) -> MigrateResult<SourceState> {
    info!("exporting from source stack");
    let dashboards = download_dashboards(source, warnings)
        .map_err(|e| MigrateError::client("exporting dashboards", e))?;
    let datasources = source
        .list_datasources()
        .map_err(|e| MigrateError::client("exporting datasources", e))?;
    info!(count = datasources.len(), "exported datasources");
    let target_groups = metrics
        .query_target_groups()
        .map_err(|e| MigrateError::client("querying source targets", e))?;
    info!(count = target_groups.len(), "discovered target files");
    Ok(SourceState {
        dashboards,
        datasources,
        target_groups,
    })
}

fn staging_dir(keep: Option<&Path>) -> MigrateResult<(Option<TempDir>, PathBuf)> {
    match keep {
        Some(dir) => {
            fs::create_dir_all(dir)
                .map_err(|e| MigrateError::io(format!("creating {}", dir.display()), e))?;
            let dir = path::absolute(dir)
                .map_err(|e| MigrateError::io(format!("resolving {}", dir.display()), e))?;
            Ok((None, dir))
        }
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("monstack-clone-")
                .tempdir()
                .map_err(|e| MigrateError::io("creating staging directory", e))?;
            let root = tmp.path().to_path_buf();
            Ok((Some(tmp), root))
        }
    }
}

/// Write one YAML file per discovery origin. Files sharing a container
/// directory are staged together, and that directory becomes one read-only
/// mount at its original container path. Files living in the metrics
/// store's own config directory are mounted one by one so they do not hide
/// the scrape config and rules mounted there.
pub fn write_target_files(stage_root: &Path, groups: &TargetGroupMap) -> MigrateResult<Vec<Mount>> {
    let mut by_dir: BTreeMap<String, Vec<(String, &Vec<TargetGroup>)>> = BTreeMap::new();
    for (origin, file_groups) in groups {
        let origin = Path::new(PROMETHEUS_CONFIG_DIR).join(origin);
        let (Some(dir), Some(file)) = (origin.parent(), origin.file_name()) else {
            continue;
        };
        by_dir
            .entry(dir.to_string_lossy().into_owned())
            .or_default()
            .push((file.to_string_lossy().into_owned(), file_groups));
    }

    let mut mounts = Vec::with_capacity(by_dir.len());
    let mut local_names = HashSet::new();
    for (container_dir, files) in by_dir {
        let mut local_name = sanitize_name(&container_dir);
        let mut n = 1;
        while !local_names.insert(local_name.clone()) {
            n += 1;
            local_name = format!("{}-{n}", sanitize_name(&container_dir));
        }
        let local_dir = stage_root.join("targets").join(&local_name);
        fs::create_dir_all(&local_dir)
            .map_err(|e| MigrateError::io(format!("creating {}", local_dir.display()), e))?;

        let per_file = Path::new(&container_dir) == Path::new(PROMETHEUS_CONFIG_DIR);
        for (file, file_groups) in files {
            let yaml = serde_yaml::to_string(file_groups).map_err(|source| MigrateError::Yaml {
                context: format!("serializing targets for {file}"),
                source,
            })?;
            let path = local_dir.join(&file);
            fs::write(&path, yaml)
                .map_err(|e| MigrateError::io(format!("writing {}", path.display()), e))?;
            info!(file = %file, groups = file_groups.len(), "wrote target file");
            if per_file {
                mounts.push(Mount::read_only(path, format!("{PROMETHEUS_CONFIG_DIR}/{file}")));
            }
        }
        if !per_file {
            mounts.push(Mount::read_only(local_dir, container_dir));
        }
    }
    Ok(mounts)
}

/// Rewrite the local scrape config for the clone's container names and
/// write it to the staging directory.
fn stage_scrape_config(
    layout: &StackLayout,
    stage_root: &Path,
    names: &CloneNames,
    warnings: &mut Vec<Warning>,
) -> MigrateResult<PathBuf> {
    let src = &layout.prometheus_config;
    let original = fs::read_to_string(src)
        .map_err(|e| MigrateError::io(format!("reading {}", src.display()), e))?;

    let grafana_target = format!("{}:{GRAFANA_PORT}", names.dashboard_server);
    let alert_target = format!("{}:{ALERTMANAGER_PORT}", names.alert_router);

    let mut config = original;
    for (label, job, new_target) in [
        ("job grafana", Some("grafana"), grafana_target.as_str()),
        ("job prometheus", Some("prometheus"), "localhost:9090"),
        ("alertmanager", None, alert_target.as_str()),
    ] {
        let rewritten = match job {
            Some(job) => replace_job_target(&config, job, new_target)?,
            None => replace_alertmanager_target(&config, new_target)?,
        };
        if rewritten == config && !config.contains(new_target) {
            record(
                warnings,
                ItemKind::ScrapeConfig,
                label,
                format!("no static target found to point at {new_target}"),
            );
        }
        config = rewritten;
    }

    let dst = stage_root.join("prometheus.yml");
    fs::write(&dst, config).map_err(|e| MigrateError::io(format!("writing {}", dst.display()), e))?;
    Ok(dst)
}

fn deploy(
    opts: &CloneOptions,
    runtime: &dyn ContainerRuntime,
    names: &CloneNames,
    config_path: &Path,
    target_mounts: Vec<Mount>,
) -> MigrateResult<CloneDeployment> {
    let ports = &opts.ports;
    let layout = &opts.layout;
    info!(
        runtime = runtime.name(),
        prometheus = ports.prometheus_port,
        grafana = ports.grafana_port,
        alertmanager = ports.alertmanager_port,
        "deploying cloned stack"
    );

    runtime
        .create_network(&names.network)
        .map_err(|e| MigrateError::runtime(format!("creating network {}", names.network), e))?;

    let alert_router = ContainerConfig {
        name: names.alert_router.clone(),
        image: opts.images.alertmanager.clone(),
        network: names.network.clone(),
        ports: vec![PortBinding {
            host: ports.alertmanager_port,
            container: ALERTMANAGER_PORT,
        }],
        command: vec!["--config.file=/etc/alertmanager/config.yml".to_string()],
        env: Vec::new(),
        mounts: vec![Mount::read_only(
            host_path(&layout.alertmanager_config),
            "/etc/alertmanager/config.yml",
        )],
    };
    let alert_router = start(runtime, &alert_router, Role::AlertRouter)?;

    let mut prom_mounts = vec![
        Mount::read_only(config_path, "/etc/prometheus/prometheus.yml"),
        Mount::read_only(host_path(&layout.alert_rules_dir), "/etc/prometheus/prom_rules"),
    ];
    prom_mounts.extend(target_mounts);
    let metrics_store = ContainerConfig {
        name: names.metrics_store.clone(),
        image: opts.images.prometheus.clone(),
        network: names.network.clone(),
        ports: vec![PortBinding {
            host: ports.prometheus_port,
            container: PROMETHEUS_PORT,
        }],
        command: [
            "--config.file=/etc/prometheus/prometheus.yml",
            "--storage.tsdb.path=/prometheus",
            "--web.listen-address=0.0.0.0:9090",
            "--web.enable-lifecycle",
            "--web.enable-admin-api",
        ]
        .map(String::from)
        .to_vec(),
        env: Vec::new(),
        mounts: prom_mounts,
    };
    let metrics_store = start(runtime, &metrics_store, Role::MetricsStore)?;

    let dashboard_server = ContainerConfig {
        name: names.dashboard_server.clone(),
        image: opts.images.grafana.clone(),
        network: names.network.clone(),
        ports: vec![PortBinding {
            host: ports.grafana_port,
            container: GRAFANA_PORT,
        }],
        command: Vec::new(),
        env: [
            ("GF_PATHS_PROVISIONING", "/var/lib/grafana/provisioning"),
            ("GF_PLUGINS_ALLOW_LOADING_UNSIGNED_PLUGINS", "scylladb-scylla-datasource"),
            ("GF_DATABASE_WAL", "true"),
            ("GF_AUTH_ANONYMOUS_ENABLED", "true"),
            ("GF_AUTH_ANONYMOUS_ORG_ROLE", "Admin"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .to_vec(),
        mounts: vec![
            Mount::read_write(host_path(&layout.grafana_dashboards_dir), "/var/lib/grafana/dashboards"),
            Mount::read_write(host_path(&layout.grafana_plugins_dir), "/var/lib/grafana/plugins"),
            Mount::read_write(
                host_path(&layout.grafana_provisioning_dir),
                "/var/lib/grafana/provisioning",
            ),
        ],
    };
    let dashboard_server = start(runtime, &dashboard_server, Role::DashboardServer)?;

    Ok(CloneDeployment {
        network: names.network.clone(),
        alert_router,
        metrics_store,
        dashboard_server,
        grafana_url: format!("http://localhost:{}", ports.grafana_port),
        prometheus_url: format!("http://localhost:{}", ports.prometheus_port),
        alertmanager_url: format!("http://localhost:{}", ports.alertmanager_port),
    })
}

fn start(
    runtime: &dyn ContainerRuntime,
    config: &ContainerConfig,
    role: Role,
) -> MigrateResult<ContainerHandle> {
    runtime
        .start_container(config)
        .map_err(|e| MigrateError::runtime(format!("starting {role}"), e))
}

/// Bind mounts need absolute host paths.
fn host_path(path: &Path) -> PathBuf {
    path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
