//! Metrics-store (Prometheus) HTTP API client.

use monstack_core::{Alert, Endpoint, TargetGroupMap};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, read_json, send, API_TIMEOUT};
use crate::targets::{reconstruct_target_groups, ActiveTarget};
use crate::MetricsApi;

/// The `{status, data}` wrapper every `/api/v1` response uses.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlertsData {
    #[serde(default)]
    alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct TargetsData {
    #[serde(rename = "activeTargets", default)]
    active_targets: Vec<ActiveTarget>,
}

#[derive(Debug, Deserialize)]
struct SnapshotData {
    name: String,
}

pub struct PrometheusClient {
    endpoint: Endpoint,
    http: Client,
}

impl PrometheusClient {
    pub fn new(endpoint: Endpoint) -> ClientResult<Self> {
        Ok(Self {
            endpoint,
            http: build_client(API_TIMEOUT)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.endpoint.join(path));
        match &self.endpoint.user {
            Some(user) if !user.is_empty() => req.basic_auth(user, self.endpoint.password.as_ref()),
            _ => req,
        }
    }

    /// Send `req`, decode the API wrapper and require `status == "success"`.
    fn api<T: DeserializeOwned>(&self, req: RequestBuilder, context: &str) -> ClientResult<T> {
        let resp: ApiResponse<T> = read_json(send(req, context)?, context)?;
        if resp.status != "success" {
            let status = match resp.error {
                Some(err) => format!("{} ({err})", resp.status),
                None => resp.status,
            };
            return Err(ClientError::Api {
                context: context.to_string(),
                status,
            });
        }
        resp.data.ok_or_else(|| ClientError::Api {
            context: context.to_string(),
            status: "success without data".to_string(),
        })
    }
}

impl MetricsApi for PrometheusClient {
    fn health(&self) -> ClientResult<()> {
        send(self.request(Method::GET, "-/ready"), "prometheus readiness check")?;
        Ok(())
    }

    fn reload(&self) -> ClientResult<()> {
        send(self.request(Method::POST, "-/reload"), "reloading prometheus")?;
        Ok(())
    }

    fn query_instant(&self, promql: &str) -> ClientResult<serde_json::Value> {
        let req = self
            .request(Method::GET, "api/v1/query")
            .query(&[("query", promql)]);
        self.api(req, &format!("query {promql}"))
    }

    fn query_alerts(&self) -> ClientResult<Vec<Alert>> {
        let data: AlertsData = self.api(self.request(Method::GET, "api/v1/alerts"), "listing alerts")?;
        Ok(data.alerts)
    }

    fn query_target_groups(&self) -> ClientResult<TargetGroupMap> {
        let data: TargetsData =
            self.api(self.request(Method::GET, "api/v1/targets"), "listing targets")?;
        Ok(reconstruct_target_groups(&data.active_targets))
    }

    fn create_snapshot(&self) -> ClientResult<String> {
        let data: SnapshotData = self.api(
            self.request(Method::POST, "api/v1/admin/tsdb/snapshot"),
            "creating TSDB snapshot",
        )?;
        Ok(data.name)
    }
}
