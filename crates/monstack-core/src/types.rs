//! Shared types used across monstack crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A datasource as stored by the dashboard server.
///
/// Only the fields monstack reads or rewrites are typed; everything else
/// the server returns is kept in `extra` so an exported datasource can be
/// re-uploaded without losing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub ds_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
    #[serde(rename = "jsonData", default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Which stack service a datasource points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasourceRole {
    MetricsStore,
    AlertRouter,
    Other,
}

impl Datasource {
    /// Minimal datasource, mostly useful in tests.
    pub fn new(name: &str, ds_type: &str, url: &str) -> Self {
        Self {
            id: 0,
            uid: None,
            name: name.to_string(),
            ds_type: ds_type.to_string(),
            url: url.to_string(),
            access: None,
            is_default: false,
            json_data: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn role(&self) -> DatasourceRole {
        match self.ds_type.as_str() {
            "prometheus" => DatasourceRole::MetricsStore,
            "alertmanager" => DatasourceRole::AlertRouter,
            _ => DatasourceRole::Other,
        }
    }
}

/// One hit from the dashboard search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub uid: String,
    #[serde(rename = "title", default)]
    pub name: String,
}

/// A file-based service-discovery group, as the metrics store reads it from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Reconstructed discovery groups keyed by their origin file path.
pub type TargetGroupMap = BTreeMap<String, Vec<TargetGroup>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Firing,
    Pending,
    Inactive,
    #[serde(other)]
    Unknown,
}

/// An alert as reported by the metrics store's alerts endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub state: AlertState,
    #[serde(rename = "activeAt", default, skip_serializing_if = "Option::is_none")]
    pub active_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Alert {
    pub fn name(&self) -> &str {
        self.labels
            .get("alertname")
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or("unnamed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasource_keeps_unknown_fields() {
        let raw = r#"{
            "id": 7,
            "uid": "P1809F7CD0C75ACF3",
            "name": "prometheus",
            "type": "prometheus",
            "url": "http://aprom:9090",
            "access": "proxy",
            "isDefault": true,
            "jsonData": {"timeInterval": "20s"},
            "basicAuth": false,
            "readOnly": true
        }"#;
        let ds: Datasource = serde_json::from_str(raw).unwrap();
        assert_eq!(ds.id, 7);
        assert_eq!(ds.role(), DatasourceRole::MetricsStore);
        assert_eq!(ds.extra.get("readOnly"), Some(&serde_json::json!(true)));

        let back = serde_json::to_value(&ds).unwrap();
        assert_eq!(back["basicAuth"], serde_json::json!(false));
        assert_eq!(back["jsonData"]["timeInterval"], "20s");
    }

    #[test]
    fn datasource_roles() {
        assert_eq!(
            Datasource::new("am", "alertmanager", "").role(),
            DatasourceRole::AlertRouter
        );
        assert_eq!(
            Datasource::new("scylla", "scylladb-scylla-datasource", "").role(),
            DatasourceRole::Other
        );
    }

    #[test]
    fn alert_state_tolerates_unknown_values() {
        let alert: Alert =
            serde_json::from_str(r#"{"labels": {}, "state": "silenced"}"#).unwrap();
        assert_eq!(alert.state, AlertState::Unknown);
        assert_eq!(alert.name(), "unnamed");
    }

    #[test]
    fn target_group_omits_empty_labels() {
        let group = TargetGroup {
            targets: vec!["10.0.0.1:9180".to_string()],
            labels: BTreeMap::new(),
        };
        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, r#"{"targets":["10.0.0.1:9180"]}"#);
    }
}
