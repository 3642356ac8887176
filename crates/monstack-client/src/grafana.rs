//! Dashboard-server (Grafana) HTTP API client.

use monstack_core::{DashboardSummary, Datasource, Endpoint};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, read_json, send, API_TIMEOUT, PROXY_TIMEOUT};
use crate::DashboardApi;

pub struct GrafanaClient {
    endpoint: Endpoint,
    http: Client,
}

impl GrafanaClient {
    pub fn new(endpoint: Endpoint) -> ClientResult<Self> {
        Ok(Self {
            endpoint,
            http: build_client(API_TIMEOUT)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        let req = self.http.request(method, url);
        match &self.endpoint.user {
            Some(user) if !user.is_empty() => req.basic_auth(user, self.endpoint.password.as_ref()),
            _ => req,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, self.endpoint.join(path))
    }

    /// `base_path` with `segment` appended as one percent-encoded path segment.
    fn url_with_segment(&self, base_path: &str, segment: &str) -> ClientResult<Url> {
        let raw = self.endpoint.join(base_path);
        let mut url = Url::parse(&raw).map_err(|_| ClientError::Url(raw.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(raw.clone()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    fn datasource_by_name(&self, name: &str) -> ClientResult<Datasource> {
        let url = self.url_with_segment("api/datasources/name", name)?;
        let context = format!("looking up datasource {name}");
        let resp = send(self.request(Method::GET, url), &context)?;
        read_json(resp, &context)
    }
}

impl DashboardApi for GrafanaClient {
    fn health(&self) -> ClientResult<()> {
        send(self.get("api/health"), "grafana health check")?;
        Ok(())
    }

    fn search_dashboards(&self) -> ClientResult<Vec<DashboardSummary>> {
        let context = "searching dashboards";
        let resp = send(self.get("api/search").query(&[("type", "dash-db")]), context)?;
        read_json(resp, context)
    }

    fn download_dashboard(&self, uid: &str) -> ClientResult<serde_json::Value> {
        let url = self.url_with_segment("api/dashboards/uid", uid)?;
        let context = format!("downloading dashboard {uid}");
        let resp = send(self.request(Method::GET, url), &context)?;
        read_json(resp, &context)
    }

    fn list_datasources(&self) -> ClientResult<Vec<Datasource>> {
        let context = "listing datasources";
        let resp = send(self.get("api/datasources"), context)?;
        read_json(resp, context)
    }

    fn upsert_datasource(&self, datasource: &Datasource) -> ClientResult<()> {
        let context = format!("creating datasource {}", datasource.name);
        let create = self
            .request(Method::POST, self.endpoint.join("api/datasources"))
            .json(datasource);

        match send(create, &context) {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(409) => {
                debug!(datasource = %datasource.name, "datasource exists, updating");
                let existing = self.datasource_by_name(&datasource.name)?;
                let mut update = datasource.clone();
                update.id = existing.id;
                if update.uid.is_none() {
                    update.uid = existing.uid;
                }
                let url = self.endpoint.join(&format!("api/datasources/{}", existing.id));
                send(
                    self.request(Method::PUT, url).json(&update),
                    &format!("updating datasource {}", datasource.name),
                )?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn upload_dashboard(
        &self,
        dashboard: &serde_json::Value,
        folder_id: i64,
        overwrite: bool,
    ) -> ClientResult<()> {
        let body = serde_json::json!({
            "dashboard": dashboard,
            "folderId": folder_id,
            "overwrite": overwrite,
        });
        let uid = dashboard.get("uid").and_then(|u| u.as_str()).unwrap_or("<no uid>");
        send(
            self.request(Method::POST, self.endpoint.join("api/dashboards/db")).json(&body),
            &format!("uploading dashboard {uid}"),
        )?;
        Ok(())
    }

    fn list_folders(&self) -> ClientResult<Vec<serde_json::Value>> {
        let context = "listing folders";
        let resp = send(self.get("api/folders"), context)?;
        read_json(resp, context)
    }

    fn check_datasource_health(&self, id: i64) -> ClientResult<()> {
        send(
            self.get(&format!("api/datasources/{id}/health")),
            &format!("datasource {id} health"),
        )?;
        Ok(())
    }

    fn proxy_query(&self, id: i64, path: &str) -> ClientResult<()> {
        let url = self.endpoint.join(&format!(
            "api/datasources/proxy/{id}/{}",
            path.trim_start_matches('/')
        ));
        send(
            self.request(Method::GET, url).timeout(PROXY_TIMEOUT),
            &format!("proxy query through datasource {id}"),
        )?;
        Ok(())
    }
}
