//! Error types for container-runtime operations.

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no container runtime found: install docker or podman")]
    NotFound,

    #[error("unknown container runtime {0:?} (expected docker or podman)")]
    Unknown(String),

    #[error("running {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("building health probe client: {0}")]
    Probe(#[source] reqwest::Error),

    #[error("{url} not healthy after {attempts} attempts")]
    Unhealthy { url: String, attempts: u32 },
}
