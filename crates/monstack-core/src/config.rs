//! monstack.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoint::Endpoint;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonstackConfig {
    #[serde(default = "default_grafana")]
    pub grafana: Endpoint,
    #[serde(default = "default_prometheus")]
    pub prometheus: Endpoint,
    #[serde(default = "default_alertmanager")]
    pub alertmanager: Endpoint,
    #[serde(default)]
    pub images: ImageSet,
    #[serde(default)]
    pub layout: StackLayout,
    #[serde(default)]
    pub clone: ClonePorts,
}

/// Container images used when deploying a cloned stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSet {
    pub prometheus: String,
    pub grafana: String,
    pub alertmanager: String,
}

/// Local working-tree paths read by export and clone, written by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackLayout {
    pub prometheus_config: PathBuf,
    pub alert_rules_dir: PathBuf,
    pub alertmanager_config: PathBuf,
    /// Empty means the stack runs without a log pipeline.
    pub loki_config: PathBuf,
    pub target_dir: PathBuf,
    pub grafana_dashboards_dir: PathBuf,
    pub grafana_plugins_dir: PathBuf,
    pub grafana_provisioning_dir: PathBuf,
}

/// External ports and stack identifier for a cloned stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClonePorts {
    pub prometheus_port: u16,
    pub grafana_port: u16,
    pub alertmanager_port: u16,
    pub stack_id: u32,
}

fn default_grafana() -> Endpoint {
    Endpoint::new("http://localhost:3000").with_basic_auth("admin", "admin")
}

fn default_prometheus() -> Endpoint {
    Endpoint::new("http://localhost:9090")
}

fn default_alertmanager() -> Endpoint {
    Endpoint::new("http://localhost:9093")
}

impl Default for MonstackConfig {
    fn default() -> Self {
        Self {
            grafana: default_grafana(),
            prometheus: default_prometheus(),
            alertmanager: default_alertmanager(),
            images: ImageSet::default(),
            layout: StackLayout::default(),
            clone: ClonePorts::default(),
        }
    }
}

impl Default for ImageSet {
    fn default() -> Self {
        Self {
            prometheus: "prom/prometheus:v3.9.1".to_string(),
            grafana: "grafana/grafana:12.3.2".to_string(),
            alertmanager: "prom/alertmanager:v0.30.1".to_string(),
        }
    }
}

impl Default for StackLayout {
    fn default() -> Self {
        Self {
            prometheus_config: PathBuf::from("prometheus/build/prometheus.yml"),
            alert_rules_dir: PathBuf::from("prometheus/prom_rules"),
            alertmanager_config: PathBuf::from("prometheus/rule_config.yml"),
            loki_config: PathBuf::new(),
            target_dir: PathBuf::from("prometheus"),
            grafana_dashboards_dir: PathBuf::from("grafana/build"),
            grafana_plugins_dir: PathBuf::from("grafana/plugins"),
            grafana_provisioning_dir: PathBuf::from("grafana/provisioning"),
        }
    }
}

impl Default for ClonePorts {
    fn default() -> Self {
        Self {
            prometheus_port: 9091,
            grafana_port: 3001,
            alertmanager_port: 9095,
            stack_id: 1,
        }
    }
}

impl StackLayout {
    /// Re-root every relative path under `base`. Absolute paths are kept.
    pub fn rooted_at(&self, base: &Path) -> Self {
        let root = |p: &PathBuf| {
            if p.as_os_str().is_empty() || p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            prometheus_config: root(&self.prometheus_config),
            alert_rules_dir: root(&self.alert_rules_dir),
            alertmanager_config: root(&self.alertmanager_config),
            loki_config: root(&self.loki_config),
            target_dir: root(&self.target_dir),
            grafana_dashboards_dir: root(&self.grafana_dashboards_dir),
            grafana_plugins_dir: root(&self.grafana_plugins_dir),
            grafana_provisioning_dir: root(&self.grafana_provisioning_dir),
        }
    }
}

impl MonstackConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config: MonstackConfig = toml::from_str("").unwrap();
        assert_eq!(config, MonstackConfig::default());
        assert_eq!(config.grafana.url, "http://localhost:3000");
        assert_eq!(config.clone.grafana_port, 3001);
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml_str = r#"
[prometheus]
url = "http://metrics.internal:9090"

[layout]
target_dir = "/srv/targets"

[clone]
stack_id = 4
"#;
        let config: MonstackConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.prometheus.url, "http://metrics.internal:9090");
        assert_eq!(config.layout.target_dir, PathBuf::from("/srv/targets"));
        assert_eq!(
            config.layout.prometheus_config,
            PathBuf::from("prometheus/build/prometheus.yml")
        );
        assert_eq!(config.clone.stack_id, 4);
        assert_eq!(config.clone.prometheus_port, 9091);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonstackConfig::load_or_default(&dir.path().join("monstack.toml")).unwrap();
        assert_eq!(config, MonstackConfig::default());
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monstack.toml");
        std::fs::write(&path, "[clone]\nstack_id = \"three\"\n").unwrap();
        let err = MonstackConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_rooted_at_keeps_absolute_and_empty() {
        let layout = StackLayout {
            target_dir: PathBuf::from("/abs/targets"),
            ..StackLayout::default()
        };
        let rooted = layout.rooted_at(Path::new("/work"));
        assert_eq!(rooted.target_dir, PathBuf::from("/abs/targets"));
        assert_eq!(rooted.loki_config, PathBuf::new());
        assert_eq!(
            rooted.alert_rules_dir,
            PathBuf::from("/work/prometheus/prom_rules")
        );
    }
}
