//! Restore a snapshot: local config files, then dashboards and datasources.

use std::fs;
use std::path::{Path, PathBuf};

use monstack_archive::unpack;
use monstack_client::DashboardApi;
use monstack_core::{DatasourceRole, StackLayout};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{MigrateError, MigrateResult};
use crate::fsutil::{copy_dir, copy_file, is_unset};
use crate::report::{record, ImportReport, ItemKind, Warning};
use crate::snapshot::{
    SnapshotDir, SnapshotItem, ALERTMANAGER_CONFIG, ALERT_RULES_DIR, LOKI_CONFIG, PROMETHEUS_CONFIG, TARGETS_DIR,
};
use crate::transfer::{upload_dashboards, upload_datasources};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// A `.tar.gz` produced by export, or a directory holding its contents.
    pub source: PathBuf,
    /// Local destinations for restored config files.
    pub layout: StackLayout,
    /// New URL for every metrics-store datasource.
    pub metrics_url: Option<String>,
}

pub fn import_stack(
    opts: &ImportOptions,
    dashboard: Option<&dyn DashboardApi>,
) -> MigrateResult<ImportReport> {
    // Keeps the extraction directory alive until the import is done.
    let (_extracted, snap) = open_snapshot(&opts.source)?;
    let metadata = snap.read_metadata()?;
    info!(
        exported_at = %metadata.export_timestamp,
        dashboards = metadata.dashboard_count,
        datasources = metadata.datasource_count,
        "importing snapshot"
    );

    let mut warnings = Vec::new();
    let restored_files = restore_files(&snap, &opts.layout, &mut warnings);

    let mut datasources_uploaded = 0;
    let mut dashboards_uploaded = 0;
    if let Some(api) = dashboard {
        api.health()
            .map_err(|e| MigrateError::client("dashboard server not ready", e))?;

        let datasources = readable(snap.datasources()?, ItemKind::Datasource, &mut warnings)
            .into_iter()
            .map(|(_, ds)| ds);
        let metrics_url = opts.metrics_url.as_deref().filter(|u| !u.is_empty());
        datasources_uploaded = upload_datasources(
            api,
            datasources,
            |ds| {
                if let Some(url) = metrics_url {
                    if ds.role() == DatasourceRole::MetricsStore {
                        ds.url = url.to_string();
                    }
                }
            },
            &mut warnings,
        );

        let dashboards = readable(snap.dashboards()?, ItemKind::Dashboard, &mut warnings);
        dashboards_uploaded = upload_dashboards(api, dashboards, &mut warnings);
    }

    Ok(ImportReport {
        metadata,
        restored_files,
        datasources_uploaded,
        dashboards_uploaded,
        warnings,
    })
}

/// Use `source` directly when it is a directory, otherwise unpack it into a
/// temporary directory that lives as long as the returned guard.
fn open_snapshot(source: &Path) -> MigrateResult<(Option<TempDir>, SnapshotDir)> {
    let meta = fs::metadata(source)
        .map_err(|e| MigrateError::io(format!("accessing {}", source.display()), e))?;
    if meta.is_dir() {
        info!(path = %source.display(), "using unpacked export directory");
        return Ok((None, SnapshotDir::new(source)));
    }

    let dir = tempfile::Builder::new()
        .prefix("monstack-import-")
        .tempdir()
        .map_err(|e| MigrateError::io("creating extract directory", e))?;
    let summary = unpack(source, dir.path()).map_err(|source_err| MigrateError::Archive {
        context: format!("unpacking {}", source.display()),
        source: source_err,
    })?;
    debug!(files = summary.files, directories = summary.directories, "unpacked archive");
    let snap = SnapshotDir::new(dir.path());
    Ok((Some(dir), snap))
}

/// Keep the documents that parsed, labelled by file name; warn about the rest.
fn readable<T>(
    items: Vec<SnapshotItem<T>>,
    kind: ItemKind,
    warnings: &mut Vec<Warning>,
) -> Vec<(String, T)> {
    let mut docs = Vec::with_capacity(items.len());
    for item in items {
        match item.document {
            Ok(doc) => docs.push((item.file_name, doc)),
            Err(e) => record(warnings, kind, item.file_name, e),
        }
    }
    docs
}

/// Copy config and target files from the snapshot to their local homes.
/// Each piece is optional on both sides.
fn restore_files(snap: &SnapshotDir, layout: &StackLayout, warnings: &mut Vec<Warning>) -> Vec<PathBuf> {
    let mut restored = Vec::new();

    let files = [
        (PROMETHEUS_CONFIG, &layout.prometheus_config),
        (ALERTMANAGER_CONFIG, &layout.alertmanager_config),
        (LOKI_CONFIG, &layout.loki_config),
    ];
    for (rel, dst) in files {
        let src = snap.path(rel);
        if is_unset(dst) || !src.is_file() {
            continue;
        }
        match copy_file(&src, dst) {
            Ok(()) => restored.push(dst.clone()),
            Err(e) => record(warnings, ItemKind::ConfigFile, rel, e),
        }
    }

    let rules = snap.path(ALERT_RULES_DIR);
    if !is_unset(&layout.alert_rules_dir) && rules.is_dir() {
        match copy_dir(&rules, &layout.alert_rules_dir) {
            Ok(_) => restored.push(layout.alert_rules_dir.clone()),
            Err(e) => record(warnings, ItemKind::ConfigFile, ALERT_RULES_DIR, e),
        }
    }

    let targets = snap.path(TARGETS_DIR);
    if !is_unset(&layout.target_dir) && targets.is_dir() {
        match fs::read_dir(&targets) {
            Ok(entries) => {
                let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
                paths.sort();
                for src in paths {
                    let Some(name) = src.file_name() else { continue };
                    let dst = layout.target_dir.join(name);
                    let result = if src.is_dir() {
                        copy_dir(&src, &dst).map(|_| ())
                    } else {
                        copy_file(&src, &dst)
                    };
                    match result {
                        Ok(()) => restored.push(dst),
                        Err(e) => record(warnings, ItemKind::TargetFile, src.display().to_string(), e),
                    }
                }
            }
            Err(e) => record(warnings, ItemKind::TargetFile, TARGETS_DIR, e),
        }
    }

    if !restored.is_empty() {
        info!(count = restored.len(), "restored config files");
    }
    restored
}
