#![allow(dead_code)]

//! Recording fakes for the collaborator traits.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use monstack_client::{ClientError, ClientResult, DashboardApi, MetricsApi};
use monstack_core::{Alert, DashboardSummary, Datasource, TargetGroup, TargetGroupMap};
use monstack_runtime::{ContainerConfig, ContainerHandle, ContainerRuntime, RuntimeError, RuntimeResult};
use serde_json::{json, Value};

pub fn unavailable(context: &str) -> ClientError {
    ClientError::Status {
        context: context.to_string(),
        status: 503,
        body: "service unavailable".to_string(),
    }
}

#[derive(Default)]
pub struct FakeDashboard {
    pub down: bool,
    pub fail_search: bool,
    pub fail_datasources: bool,
    /// `(uid, title, envelope)` as the search and download endpoints return them.
    pub dashboards: Vec<(String, String, Value)>,
    pub datasources: Vec<Datasource>,
    pub folders: Vec<Value>,
    pub fail_download: Vec<String>,
    pub fail_upsert: Vec<String>,
    pub upserted: RefCell<Vec<Datasource>>,
    pub uploaded: RefCell<Vec<(Value, i64, bool)>>,
    pub health_calls: Cell<usize>,
}

impl FakeDashboard {
    pub fn with_dashboard(mut self, id: i64, uid: &str, title: &str) -> Self {
        let envelope = json!({
            "dashboard": {"id": id, "uid": uid, "title": title, "panels": []},
            "meta": {"slug": title.to_lowercase(), "folderId": 0}
        });
        self.dashboards.push((uid.to_string(), title.to_string(), envelope));
        self
    }

    pub fn with_datasource(mut self, id: i64, name: &str, ds_type: &str, url: &str) -> Self {
        let mut ds = Datasource::new(name, ds_type, url);
        ds.id = id;
        ds.access = Some("proxy".to_string());
        self.datasources.push(ds);
        self
    }

    pub fn upserted(&self) -> Vec<Datasource> {
        self.upserted.borrow().clone()
    }

    pub fn uploaded(&self) -> Vec<(Value, i64, bool)> {
        self.uploaded.borrow().clone()
    }
}

impl DashboardApi for FakeDashboard {
    fn health(&self) -> ClientResult<()> {
        self.health_calls.set(self.health_calls.get() + 1);
        if self.down { Err(unavailable("grafana health check")) } else { Ok(()) }
    }

    fn search_dashboards(&self) -> ClientResult<Vec<DashboardSummary>> {
        if self.down || self.fail_search {
            return Err(unavailable("searching dashboards"));
        }
        Ok(self
            .dashboards
            .iter()
            .map(|(uid, title, _)| DashboardSummary {
                uid: uid.clone(),
                name: title.clone(),
            })
            .collect())
    }

    fn download_dashboard(&self, uid: &str) -> ClientResult<Value> {
        if self.fail_download.iter().any(|u| u == uid) {
            return Err(unavailable(&format!("downloading dashboard {uid}")));
        }
        self.dashboards
            .iter()
            .find(|(u, _, _)| u == uid)
            .map(|(_, _, envelope)| envelope.clone())
            .ok_or_else(|| ClientError::Status {
                context: format!("downloading dashboard {uid}"),
                status: 404,
                body: "not found".to_string(),
            })
    }

    fn list_datasources(&self) -> ClientResult<Vec<Datasource>> {
        if self.down || self.fail_datasources {
            return Err(unavailable("listing datasources"));
        }
        Ok(self.datasources.clone())
    }

    fn upsert_datasource(&self, datasource: &Datasource) -> ClientResult<()> {
        if self.fail_upsert.contains(&datasource.name) {
            return Err(unavailable(&format!("creating datasource {}", datasource.name)));
        }
        self.upserted.borrow_mut().push(datasource.clone());
        Ok(())
    }

    fn upload_dashboard(&self, dashboard: &Value, folder_id: i64, overwrite: bool) -> ClientResult<()> {
        self.uploaded
            .borrow_mut()
            .push((dashboard.clone(), folder_id, overwrite));
        Ok(())
    }

    fn list_folders(&self) -> ClientResult<Vec<Value>> {
        if self.down {
            return Err(unavailable("listing folders"));
        }
        Ok(self.folders.clone())
    }

    fn check_datasource_health(&self, _id: i64) -> ClientResult<()> {
        Ok(())
    }

    fn proxy_query(&self, _id: i64, _path: &str) -> ClientResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMetrics {
    pub down: bool,
    pub target_groups: TargetGroupMap,
    /// `None` makes snapshot creation fail.
    pub snapshot_name: Option<String>,
    pub snapshot_requests: Cell<usize>,
}

impl FakeMetrics {
    pub fn with_targets(mut self, origin: &str, targets: &[&str], labels: &[(&str, &str)]) -> Self {
        let groups = self.target_groups.entry(origin.to_string()).or_default();
        for target in targets {
            groups.push(TargetGroup {
                targets: vec![target.to_string()],
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
        }
        self
    }
}

impl MetricsApi for FakeMetrics {
    fn health(&self) -> ClientResult<()> {
        if self.down { Err(unavailable("prometheus readiness check")) } else { Ok(()) }
    }

    fn reload(&self) -> ClientResult<()> {
        Ok(())
    }

    fn query_instant(&self, _promql: &str) -> ClientResult<Value> {
        Ok(json!({"resultType": "vector", "result": []}))
    }

    fn query_alerts(&self) -> ClientResult<Vec<Alert>> {
        Ok(Vec::new())
    }

    fn query_target_groups(&self) -> ClientResult<TargetGroupMap> {
        if self.down {
            return Err(unavailable("listing targets"));
        }
        Ok(self.target_groups.clone())
    }

    fn create_snapshot(&self) -> ClientResult<String> {
        self.snapshot_requests.set(self.snapshot_requests.get() + 1);
        self.snapshot_name
            .clone()
            .ok_or_else(|| unavailable("creating TSDB snapshot"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    CreateNetwork(String),
    Start(ContainerConfig),
    Wait(String),
}

#[derive(Default)]
pub struct FakeRuntime {
    /// Container names whose start fails.
    pub fail_start: Vec<String>,
    /// URLs that never become healthy.
    pub never_ready: Vec<String>,
    pub calls: RefCell<Vec<RuntimeCall>>,
}

impl FakeRuntime {
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.borrow().clone()
    }

    pub fn started(&self) -> Vec<ContainerConfig> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RuntimeCall::Start(config) => Some(config),
                _ => None,
            })
            .collect()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn name(&self) -> &str {
        "fake"
    }

    fn create_network(&self, network: &str) -> RuntimeResult<()> {
        self.calls
            .borrow_mut()
            .push(RuntimeCall::CreateNetwork(network.to_string()));
        Ok(())
    }

    fn start_container(&self, config: &ContainerConfig) -> RuntimeResult<ContainerHandle> {
        self.calls.borrow_mut().push(RuntimeCall::Start(config.clone()));
        if self.fail_start.contains(&config.name) {
            return Err(RuntimeError::Command {
                command: "docker run".to_string(),
                status: "exit status: 125".to_string(),
                stderr: "port is already allocated".to_string(),
            });
        }
        Ok(ContainerHandle {
            id: format!("id-{}", config.name),
            name: config.name.clone(),
        })
    }

    fn wait_for_health(&self, url: &str, attempts: u32, _interval: Duration) -> RuntimeResult<()> {
        self.calls.borrow_mut().push(RuntimeCall::Wait(url.to_string()));
        if self.never_ready.iter().any(|u| u == url) {
            return Err(RuntimeError::Unhealthy {
                url: url.to_string(),
                attempts,
            });
        }
        Ok(())
    }
}
