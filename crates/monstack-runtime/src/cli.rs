//! Container runtime driven through the `docker` / `podman` command line.

use std::env;
use std::fmt;
use std::process::{Command, Output, Stdio};

use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};
use crate::{ContainerConfig, ContainerHandle, ContainerRuntime};

/// Environment variable that forces a runtime instead of probing.
pub const RUNTIME_ENV: &str = "MONSTACK_RUNTIME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Docker,
    Podman,
}

impl RuntimeKind {
    pub fn binary(self) -> &'static str {
        match self {
            RuntimeKind::Docker => "docker",
            RuntimeKind::Podman => "podman",
        }
    }

    pub fn parse(name: &str) -> RuntimeResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(RuntimeKind::Docker),
            "podman" => Ok(RuntimeKind::Podman),
            _ => Err(RuntimeError::Unknown(name.to_string())),
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Pick a runtime: `MONSTACK_RUNTIME` if set, else the first of docker and
/// podman whose `version` subcommand succeeds.
pub fn detect_runtime() -> RuntimeResult<CliRuntime> {
    let forced = env::var(RUNTIME_ENV).ok().filter(|v| !v.trim().is_empty());
    let kind = select_kind(forced.as_deref(), |kind| {
        Command::new(kind.binary())
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })?;
    info!(runtime = %kind, "using container runtime");
    Ok(CliRuntime::new(kind))
}

fn select_kind(
    forced: Option<&str>,
    available: impl Fn(RuntimeKind) -> bool,
) -> RuntimeResult<RuntimeKind> {
    if let Some(name) = forced {
        return RuntimeKind::parse(name);
    }
    [RuntimeKind::Docker, RuntimeKind::Podman]
        .into_iter()
        .find(|kind| available(*kind))
        .ok_or(RuntimeError::NotFound)
}

#[derive(Debug, Clone)]
pub struct CliRuntime {
    kind: RuntimeKind,
}

impl CliRuntime {
    pub fn new(kind: RuntimeKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> RuntimeKind {
        self.kind
    }

    fn run(&self, args: &[String]) -> RuntimeResult<Output> {
        let program = self.kind.binary();
        debug!(program, ?args, "invoking container runtime");
        Command::new(program)
            .args(args)
            .output()
            .map_err(|source| RuntimeError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    fn failure(&self, args: &[String], output: &Output) -> RuntimeError {
        let subcommand = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        RuntimeError::Command {
            command: format!("{} {subcommand}", self.kind.binary()),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl ContainerRuntime for CliRuntime {
    fn name(&self) -> &str {
        self.kind.binary()
    }

    fn create_network(&self, network: &str) -> RuntimeResult<()> {
        let args = vec!["network".to_string(), "create".to_string(), network.to_string()];
        let output = self.run(&args)?;
        if output.status.success() {
            info!(network, "created network");
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("already exists") {
            debug!(network, "network already exists");
            return Ok(());
        }
        Err(self.failure(&args, &output))
    }

    fn start_container(&self, config: &ContainerConfig) -> RuntimeResult<ContainerHandle> {
        let args = run_args(config);
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(self.failure(&args, &output));
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(name = %config.name, image = %config.image, id = %short_id(&id), "started container");
        Ok(ContainerHandle {
            id,
            name: config.name.clone(),
        })
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Arguments for `<runtime> run -d ...`.
pub fn run_args(config: &ContainerConfig) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        config.name.clone(),
    ];
    if !config.network.is_empty() {
        args.push("--network".to_string());
        args.push(config.network.clone());
    }
    for port in &config.ports {
        args.push("-p".to_string());
        args.push(format!("{}:{}", port.host, port.container));
    }
    for mount in &config.mounts {
        let mut volume = format!("{}:{}", mount.source.display(), mount.target);
        if mount.read_only {
            volume.push_str(":ro");
        }
        args.push("-v".to_string());
        args.push(volume);
    }
    for (key, value) in &config.env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(config.image.clone());
    args.extend(config.command.iter().cloned());
    args
}
