//! Error types for the migration orchestrators.

use std::path::PathBuf;

use monstack_archive::ArchiveError;
use monstack_client::ClientError;
use monstack_runtime::RuntimeError;
use thiserror::Error;

pub type MigrateResult<T> = Result<T, MigrateError>;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Archive {
        context: String,
        #[source]
        source: ArchiveError,
    },

    #[error("{context}: {source}")]
    Client {
        context: String,
        #[source]
        source: ClientError,
    },

    #[error("{context}: {source}")]
    Runtime {
        context: String,
        #[source]
        source: RuntimeError,
    },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("building rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl MigrateError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MigrateError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn client(context: impl Into<String>, source: ClientError) -> Self {
        MigrateError::Client {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn runtime(context: impl Into<String>, source: RuntimeError) -> Self {
        MigrateError::Runtime {
            context: context.into(),
            source,
        }
    }

    /// True for archive corruption or tampering (traversal, oversized entry).
    pub fn is_integrity(&self) -> bool {
        matches!(self, MigrateError::Archive { source, .. } if source.is_integrity())
    }
}
