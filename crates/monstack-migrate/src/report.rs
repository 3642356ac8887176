//! Structured outcomes of the orchestrators.
//!
//! Per-item problems that do not abort an operation are logged when they
//! happen and collected as [`Warning`]s in the returned report.

use std::fmt;
use std::path::PathBuf;

use monstack_archive::PackResult;
use monstack_runtime::ContainerHandle;
use serde::Serialize;
use tracing::warn;

use crate::snapshot::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Dashboard,
    Datasource,
    Folder,
    ConfigFile,
    TargetFile,
    ScrapeConfig,
    Snapshot,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Dashboard => "dashboard",
            ItemKind::Datasource => "datasource",
            ItemKind::Folder => "folder",
            ItemKind::ConfigFile => "config file",
            ItemKind::TargetFile => "target file",
            ItemKind::ScrapeConfig => "scrape config",
            ItemKind::Snapshot => "snapshot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub item_kind: ItemKind,
    pub item: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.item_kind, self.item, self.message)
    }
}

/// Log a warning and keep it for the report.
pub(crate) fn record(
    warnings: &mut Vec<Warning>,
    item_kind: ItemKind,
    item: impl Into<String>,
    message: impl fmt::Display,
) {
    let warning = Warning {
        item_kind,
        item: item.into(),
        message: message.to_string(),
    };
    warn!(kind = %warning.item_kind, item = %warning.item, "{}", warning.message);
    warnings.push(warning);
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub archive: PackResult,
    pub metadata: Metadata,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub metadata: Metadata,
    /// Local paths written from the snapshot.
    pub restored_files: Vec<PathBuf>,
    pub datasources_uploaded: usize,
    pub dashboards_uploaded: usize,
    pub warnings: Vec<Warning>,
}

/// Names and handles of a deployed clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneDeployment {
    pub network: String,
    pub alert_router: ContainerHandle,
    pub metrics_store: ContainerHandle,
    pub dashboard_server: ContainerHandle,
    pub grafana_url: String,
    pub prometheus_url: String,
    pub alertmanager_url: String,
}

#[derive(Debug, Clone)]
pub struct CloneReport {
    pub deployment: CloneDeployment,
    /// Dashboards uploaded to the new stack.
    pub dashboards: usize,
    /// Datasources upserted into the new stack.
    pub datasources: usize,
    /// Target files staged from the source's live discovery state.
    pub target_files: usize,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    pub datasources_copied: usize,
    pub dashboards_copied: usize,
    pub warnings: Vec<Warning>,
}
