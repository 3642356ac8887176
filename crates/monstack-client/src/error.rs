//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("building HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid URL {0}")]
    Url(String),

    #[error("{context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} failed (status {status}): {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    #[error("parsing {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context} returned status: {status}")]
    Api { context: String, status: String },
}

impl ClientError {
    /// True when the service could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            ClientError::Request { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
