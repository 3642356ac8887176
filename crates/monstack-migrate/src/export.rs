//! Export a live stack to a snapshot archive.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use monstack_archive::pack;
use monstack_client::{DashboardApi, MetricsApi};
use monstack_core::StackLayout;
use tracing::{debug, info};

use crate::error::{MigrateError, MigrateResult};
use crate::fsutil::{copy_dir, copy_file, is_unset};
use crate::report::{record, ExportReport, ItemKind, Warning};
use crate::snapshot::{
    json_file_name, Metadata, SnapshotDir, ALERTMANAGER_CONFIG, ALERT_RULES_DIR, DASHBOARDS_DIR, DATASOURCES_DIR,
    LOKI_CONFIG, PROMETHEUS_CONFIG, TARGETS_DIR,
};
use crate::transfer::download_dashboards;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Where the `.tar.gz` is written.
    pub output: PathBuf,
    /// Local config files to include. Empty paths are skipped.
    pub layout: StackLayout,
    /// Extra target files, stored under `targets/` by file name.
    pub target_files: Vec<PathBuf>,
    /// Recorded in the metadata only.
    pub dashboard_url: String,
    pub metrics_url: String,
}

pub fn export_stack(
    opts: &ExportOptions,
    dashboard: Option<&dyn DashboardApi>,
    metrics: Option<&dyn MetricsApi>,
) -> MigrateResult<ExportReport> {
    let stage = tempfile::Builder::new()
        .prefix("monstack-export-")
        .tempdir()
        .map_err(|e| MigrateError::io("creating staging directory", e))?;
    let snap = SnapshotDir::new(stage.path());
    let mut warnings = Vec::new();

    let mut metadata = Metadata::now(&opts.dashboard_url, &opts.metrics_url);
    metadata.includes_data = metrics.is_some();

    if let Some(api) = dashboard {
        export_dashboard_server(api, &snap, &mut metadata, &mut warnings)?;
    }

    stage_config_files(opts, &snap, &mut warnings);

    if let Some(api) = metrics {
        match api.create_snapshot() {
            Ok(name) => {
                info!(snapshot = %name, "created TSDB snapshot; data stays on the metrics store host");
                metadata.prometheus_snapshot = Some(name);
            }
            Err(e) => record(&mut warnings, ItemKind::Snapshot, opts.metrics_url.clone(), e),
        }
    }

    snap.write_metadata(&metadata)?;

    let archive = pack(stage.path(), &opts.output).map_err(|source| MigrateError::Archive {
        context: format!("packing {}", opts.output.display()),
        source,
    })?;
    info!(
        path = %archive.output_path.display(),
        bytes = archive.size_bytes,
        dashboards = metadata.dashboard_count,
        datasources = metadata.datasource_count,
        warnings = warnings.len(),
        "export complete"
    );

    Ok(ExportReport {
        archive,
        metadata,
        warnings,
    })
}

fn export_dashboard_server(
    api: &dyn DashboardApi,
    snap: &SnapshotDir,
    metadata: &mut Metadata,
    warnings: &mut Vec<Warning>,
) -> MigrateResult<()> {
    for dir in [DASHBOARDS_DIR, DATASOURCES_DIR] {
        let path = snap.path(dir);
        fs::create_dir_all(&path)
            .map_err(|e| MigrateError::io(format!("creating {}", path.display()), e))?;
    }

    match download_dashboards(api, warnings) {
        Ok(dashboards) => {
            let mut taken = HashSet::new();
            for (uid, envelope) in &dashboards {
                if !taken.insert(json_file_name(uid)) {
                    record(warnings, ItemKind::Dashboard, uid.as_str(), name_clash(uid));
                    continue;
                }
                snap.write_dashboard(uid, envelope)?;
                metadata.dashboard_count += 1;
            }
        }
        Err(e) => record(warnings, ItemKind::Dashboard, "*", format!("listing dashboards: {e}")),
    }

    match api.list_datasources() {
        Ok(datasources) => {
            let mut taken = HashSet::new();
            for ds in &datasources {
                if !taken.insert(json_file_name(&ds.name)) {
                    record(warnings, ItemKind::Datasource, ds.name.as_str(), name_clash(&ds.name));
                    continue;
                }
                snap.write_datasource(ds)?;
                metadata.datasource_count += 1;
            }
            info!(count = metadata.datasource_count, "exported datasources");
        }
        Err(e) => record(warnings, ItemKind::Datasource, "*", format!("listing datasources: {e}")),
    }

    match api.list_folders() {
        Ok(folders) => {
            snap.write_folders(&folders)?;
        }
        Err(e) => record(warnings, ItemKind::Folder, "*", format!("listing folders: {e}")),
    }
    Ok(())
}

/// Copy local config files into the staging tree. Unset or missing sources
/// are skipped silently; a source that exists but cannot be copied is a
/// warning.
fn stage_config_files(opts: &ExportOptions, snap: &SnapshotDir, warnings: &mut Vec<Warning>) {
    let layout = &opts.layout;
    stage_file(&layout.prometheus_config, &snap.path(PROMETHEUS_CONFIG), warnings);
    stage_dir(&layout.alert_rules_dir, &snap.path(ALERT_RULES_DIR), warnings);
    stage_file(&layout.alertmanager_config, &snap.path(ALERTMANAGER_CONFIG), warnings);
    stage_file(&layout.loki_config, &snap.path(LOKI_CONFIG), warnings);

    let mut taken = HashSet::new();
    for file in &opts.target_files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let dst = snap.path(TARGETS_DIR).join(name);
        if !file.is_file() {
            debug!(path = %file.display(), "target file not found, skipping");
            continue;
        }
        if !taken.insert(name.to_os_string()) {
            record(
                warnings,
                ItemKind::TargetFile,
                file.display().to_string(),
                format!("another target file is already stored as {}", name.to_string_lossy()),
            );
            continue;
        }
        if let Err(e) = copy_file(file, &dst) {
            record(warnings, ItemKind::TargetFile, file.display().to_string(), e);
        }
    }
}

fn name_clash(name: &str) -> String {
    format!("{} is already taken by another item, skipped", json_file_name(name))
}

fn stage_file(src: &Path, dst: &Path, warnings: &mut Vec<Warning>) {
    if is_unset(src) {
        return;
    }
    if !src.is_file() {
        debug!(path = %src.display(), "config file not found, skipping");
        return;
    }
    if let Err(e) = copy_file(src, dst) {
        record(warnings, ItemKind::ConfigFile, src.display().to_string(), e);
    }
}

fn stage_dir(src: &Path, dst: &Path, warnings: &mut Vec<Warning>) {
    if is_unset(src) {
        return;
    }
    if !src.is_dir() {
        debug!(path = %src.display(), "config directory not found, skipping");
        return;
    }
    if let Err(e) = copy_dir(src, dst) {
        record(warnings, ItemKind::ConfigFile, src.display().to_string(), e);
    }
}
