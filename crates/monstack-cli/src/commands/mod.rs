pub mod check;
pub mod migrate;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use monstack_core::{Endpoint, MonstackConfig, StackLayout};
use monstack_migrate::Warning;

/// Dashboard-server connection flags. Unset flags fall back to the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GrafanaArgs {
    #[arg(long)]
    pub grafana_url: Option<String>,
    #[arg(long)]
    pub grafana_user: Option<String>,
    #[arg(long)]
    pub grafana_password: Option<String>,
}

impl GrafanaArgs {
    pub fn endpoint(&self, base: &Endpoint) -> Endpoint {
        let mut endpoint = base.clone();
        if let Some(url) = &self.grafana_url {
            endpoint.url = url.clone();
        }
        if let Some(user) = &self.grafana_user {
            endpoint.user = Some(user.clone());
        }
        if let Some(password) = &self.grafana_password {
            endpoint.password = Some(password.clone());
        }
        endpoint
    }
}

/// Local file overrides for the `[layout]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    #[arg(long)]
    pub prometheus_config: Option<PathBuf>,
    #[arg(long)]
    pub alert_rules_dir: Option<PathBuf>,
    #[arg(long)]
    pub alertmanager_config: Option<PathBuf>,
    #[arg(long)]
    pub loki_config: Option<PathBuf>,
    #[arg(long)]
    pub target_dir: Option<PathBuf>,
}

impl LayoutArgs {
    pub fn apply(&self, base: &StackLayout) -> StackLayout {
        let pick = |flag: &Option<PathBuf>, value: &PathBuf| flag.clone().unwrap_or_else(|| value.clone());
        StackLayout {
            prometheus_config: pick(&self.prometheus_config, &base.prometheus_config),
            alert_rules_dir: pick(&self.alert_rules_dir, &base.alert_rules_dir),
            alertmanager_config: pick(&self.alertmanager_config, &base.alertmanager_config),
            loki_config: pick(&self.loki_config, &base.loki_config),
            target_dir: pick(&self.target_dir, &base.target_dir),
            ..base.clone()
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<MonstackConfig> {
    MonstackConfig::load_or_default(path)
        .with_context(|| format!("loading configuration from {}", path.display()))
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!("  {} warning(s):", warnings.len());
    for w in warnings {
        println!("    - {w}");
    }
}
