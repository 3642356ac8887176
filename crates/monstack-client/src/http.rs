//! Request plumbing shared by the service clients.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};

pub(crate) const API_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const PROXY_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn build_client(timeout: Duration) -> ClientResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("monstack/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ClientError::Build)
}

/// Send `req` and require a 2xx response.
pub(crate) fn send(req: RequestBuilder, context: &str) -> ClientResult<Response> {
    let resp = req.send().map_err(|source| ClientError::Request {
        context: context.to_string(),
        source,
    })?;
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    Err(ClientError::Status {
        context: context.to_string(),
        status,
        body: body.trim().to_string(),
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(resp: Response, context: &str) -> ClientResult<T> {
    let body = resp.bytes().map_err(|source| ClientError::Request {
        context: format!("reading {context} response"),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
        context: format!("{context} response"),
        source,
    })
}
