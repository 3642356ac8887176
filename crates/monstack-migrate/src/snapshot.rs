//! On-disk model of an exported stack.
//!
//! ```text
//! metadata.yaml
//! dashboards/<uid>.json
//! datasources/<name>.json
//! folders/folders.json
//! prometheus/prometheus.yml
//! prometheus/prom_rules/...
//! alertmanager/config.yml
//! loki/config.yaml
//! targets/<file>
//! ```
//!
//! Every subtree is optional. Readers treat a missing directory as empty.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use monstack_core::Datasource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MigrateError, MigrateResult};

pub const METADATA_FILE: &str = "metadata.yaml";
pub const DASHBOARDS_DIR: &str = "dashboards";
pub const DATASOURCES_DIR: &str = "datasources";
pub const FOLDERS_FILE: &str = "folders/folders.json";
pub const PROMETHEUS_CONFIG: &str = "prometheus/prometheus.yml";
pub const ALERT_RULES_DIR: &str = "prometheus/prom_rules";
pub const ALERTMANAGER_CONFIG: &str = "alertmanager/config.yml";
pub const LOKI_CONFIG: &str = "loki/config.yaml";
pub const TARGETS_DIR: &str = "targets";

/// Summary written to `metadata.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub export_timestamp: String,
    #[serde(rename = "grafana_url", default, skip_serializing_if = "String::is_empty")]
    pub source_dashboard_url: String,
    #[serde(rename = "prometheus_url", default, skip_serializing_if = "String::is_empty")]
    pub source_metrics_url: String,
    /// A storage snapshot was requested. The data itself is not in the archive.
    #[serde(default)]
    pub includes_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus_snapshot: Option<String>,
    #[serde(default)]
    pub dashboard_count: usize,
    #[serde(default)]
    pub datasource_count: usize,
}

impl Metadata {
    /// Fresh metadata stamped with the current UTC time.
    pub fn now(source_dashboard_url: &str, source_metrics_url: &str) -> Self {
        Self {
            export_timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source_dashboard_url: source_dashboard_url.to_string(),
            source_metrics_url: source_metrics_url.to_string(),
            includes_data: !source_metrics_url.is_empty(),
            prometheus_snapshot: None,
            dashboard_count: 0,
            datasource_count: 0,
        }
    }
}

/// One document read back from a snapshot directory. A file that cannot be
/// read or parsed is kept as an error so callers can skip it with a warning.
pub struct SnapshotItem<T> {
    pub file_name: String,
    pub document: MigrateResult<T>,
}

/// An unpacked snapshot rooted at a directory.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn write_metadata(&self, metadata: &Metadata) -> MigrateResult<()> {
        let yaml = serde_yaml::to_string(metadata).map_err(|source| MigrateError::Yaml {
            context: "serializing metadata".to_string(),
            source,
        })?;
        fs::write(self.path(METADATA_FILE), yaml)
            .map_err(|e| MigrateError::io("writing metadata", e))
    }

    pub fn read_metadata(&self) -> MigrateResult<Metadata> {
        let path = self.path(METADATA_FILE);
        let raw = fs::read_to_string(&path)
            .map_err(|e| MigrateError::io(format!("reading {}", path.display()), e))?;
        serde_yaml::from_str(&raw).map_err(|source| MigrateError::Yaml {
            context: format!("parsing {}", path.display()),
            source,
        })
    }

    /// Write a dashboard envelope to `dashboards/<uid>.json`.
    pub fn write_dashboard(&self, uid: &str, envelope: &Value) -> MigrateResult<PathBuf> {
        let path = self.path(DASHBOARDS_DIR).join(json_file_name(uid));
        write_json(&path, envelope)?;
        Ok(path)
    }

    pub fn write_datasource(&self, datasource: &Datasource) -> MigrateResult<PathBuf> {
        let path = self.path(DATASOURCES_DIR).join(json_file_name(&datasource.name));
        write_json(&path, datasource)?;
        Ok(path)
    }

    pub fn write_folders(&self, folders: &[Value]) -> MigrateResult<PathBuf> {
        let path = self.path(FOLDERS_FILE);
        write_json(&path, &folders)?;
        Ok(path)
    }

    pub fn dashboards(&self) -> MigrateResult<Vec<SnapshotItem<Value>>> {
        read_documents(&self.path(DASHBOARDS_DIR))
    }

    pub fn datasources(&self) -> MigrateResult<Vec<SnapshotItem<Datasource>>> {
        read_documents(&self.path(DATASOURCES_DIR))
    }
}

/// `<name>.json` with path separators replaced.
pub fn json_file_name(name: &str) -> String {
    format!("{}.json", sanitize_name(name))
}

pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Remove the store-assigned numeric id from a dashboard, whether wrapped in
/// a `{"dashboard": ...}` envelope or not.
pub fn strip_dashboard_id(doc: &mut Value) {
    let target = if doc.get("dashboard").is_some_and(Value::is_object) {
        &mut doc["dashboard"]
    } else {
        doc
    };
    if let Some(obj) = target.as_object_mut() {
        obj.remove("id");
    }
}

/// The dashboard model itself, without the download envelope.
pub fn unwrap_dashboard(doc: Value) -> Value {
    match doc {
        Value::Object(mut obj) => match obj.remove("dashboard") {
            Some(inner) => inner,
            None => Value::Object(obj),
        },
        other => other,
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> MigrateResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| MigrateError::io(format!("creating {}", parent.display()), e))?;
    }
    let body = serde_json::to_vec_pretty(value).map_err(|source| MigrateError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(|e| MigrateError::io(format!("writing {}", path.display()), e))
}

/// Every `*.json` file in `dir`, sorted by name. A missing directory is empty.
fn read_documents<T: serde::de::DeserializeOwned>(
    dir: &Path,
) -> MigrateResult<Vec<SnapshotItem<T>>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(MigrateError::io(format!("listing {}", dir.display()), e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MigrateError::io(format!("listing {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let document = fs::read(&path)
                .map_err(|e| MigrateError::io(format!("reading {}", path.display()), e))
                .and_then(|raw| {
                    serde_json::from_slice(&raw).map_err(|source| MigrateError::Json {
                        path: path.clone(),
                        source,
                    })
                });
            SnapshotItem { file_name, document }
        })
        .collect())
}
