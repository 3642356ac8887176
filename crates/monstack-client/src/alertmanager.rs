//! Alert-router (Alertmanager) client. monstack only probes its health.

use monstack_core::Endpoint;
use reqwest::blocking::Client;

use crate::error::ClientResult;
use crate::http::{build_client, send, PROBE_TIMEOUT};
use crate::AlertRouterApi;

pub struct AlertRouterClient {
    endpoint: Endpoint,
    http: Client,
}

impl AlertRouterClient {
    pub fn new(endpoint: Endpoint) -> ClientResult<Self> {
        Ok(Self {
            endpoint,
            http: build_client(PROBE_TIMEOUT)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl AlertRouterApi for AlertRouterClient {
    fn health(&self) -> ClientResult<()> {
        send(
            self.http.get(self.endpoint.join("-/healthy")),
            "alertmanager health check",
        )?;
        Ok(())
    }
}
