//! monstack-client — blocking HTTP clients for the three stack services.
//!
//! The orchestrators only talk to services through the [`DashboardApi`] and
//! [`MetricsApi`] traits, so tests can substitute in-memory fakes.
//! [`GrafanaClient`] and [`PrometheusClient`] are the live implementations.
//!
//! Every request carries an explicit timeout: 30 s for API calls, 10 s for
//! datasource proxy probes, 5 s for the alert-router health probe.

pub mod alertmanager;
pub mod error;
pub mod grafana;
mod http;
pub mod prometheus;
pub mod targets;

use monstack_core::{Alert, DashboardSummary, Datasource, TargetGroupMap};

pub use alertmanager::AlertRouterClient;
pub use error::{ClientError, ClientResult};
pub use grafana::GrafanaClient;
pub use prometheus::PrometheusClient;
pub use targets::{reconstruct_target_groups, ActiveTarget};

/// Dashboard-server operations used by export, import, clone, copy and check.
pub trait DashboardApi {
    fn health(&self) -> ClientResult<()>;
    fn search_dashboards(&self) -> ClientResult<Vec<DashboardSummary>>;
    /// Raw envelope: `{"dashboard": {...}, "meta": {...}}`.
    fn download_dashboard(&self, uid: &str) -> ClientResult<serde_json::Value>;
    fn list_datasources(&self) -> ClientResult<Vec<Datasource>>;
    /// Create the datasource, or update the existing one with the same name.
    fn upsert_datasource(&self, datasource: &Datasource) -> ClientResult<()>;
    fn upload_dashboard(
        &self,
        dashboard: &serde_json::Value,
        folder_id: i64,
        overwrite: bool,
    ) -> ClientResult<()>;
    fn list_folders(&self) -> ClientResult<Vec<serde_json::Value>>;
    fn check_datasource_health(&self, id: i64) -> ClientResult<()>;
    /// GET `path` through the server's datasource proxy.
    fn proxy_query(&self, id: i64, path: &str) -> ClientResult<()>;
}

/// Metrics-store operations.
pub trait MetricsApi {
    fn health(&self) -> ClientResult<()>;
    fn reload(&self) -> ClientResult<()>;
    /// The `data` document of an instant query.
    fn query_instant(&self, promql: &str) -> ClientResult<serde_json::Value>;
    fn query_alerts(&self) -> ClientResult<Vec<Alert>>;
    /// Live file-based discovery groups, keyed by origin file path.
    fn query_target_groups(&self) -> ClientResult<TargetGroupMap>;
    /// Ask the store to write a storage snapshot; returns its name.
    fn create_snapshot(&self) -> ClientResult<String>;
}

/// Alert-router operations.
pub trait AlertRouterApi {
    fn health(&self) -> ClientResult<()>;
}
