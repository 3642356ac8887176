//! monstack-runtime — starts the services of a cloned stack.
//!
//! The clone orchestrator only needs three things from a container runtime:
//! an isolated network, detached containers, and a way to wait until a
//! service answers. [`ContainerRuntime`] is that seam; [`CliRuntime`] drives
//! the `docker` or `podman` binary.

pub mod cli;
pub mod error;
pub mod naming;
pub mod wait;

use std::path::PathBuf;
use std::time::Duration;

pub use cli::{detect_runtime, CliRuntime, RuntimeKind};
pub use error::{RuntimeError, RuntimeResult};
pub use naming::{container_name, network_name, Role};
pub use wait::wait_for_health;

/// Host-to-container port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host: u16,
    pub container: u16,
}

/// Bind mount of a host path into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

impl Mount {
    pub fn read_only(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: true,
        }
    }

    pub fn read_write(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }
}

/// Everything needed to start one detached container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    pub network: String,
    pub ports: Vec<PortBinding>,
    /// Arguments passed after the image name.
    pub command: Vec<String>,
    pub env: Vec<(String, String)>,
    pub mounts: Vec<Mount>,
}

/// A started container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

pub trait ContainerRuntime {
    /// Short runtime name for log output.
    fn name(&self) -> &str;

    /// Create `network`; an existing network of that name is fine.
    fn create_network(&self, network: &str) -> RuntimeResult<()>;

    fn start_container(&self, config: &ContainerConfig) -> RuntimeResult<ContainerHandle>;

    /// Poll `url` until it answers 2xx, at most `attempts` times.
    fn wait_for_health(&self, url: &str, attempts: u32, interval: Duration) -> RuntimeResult<()> {
        wait_for_health(url, attempts, interval)
    }
}
