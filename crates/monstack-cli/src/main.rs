use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{GrafanaArgs, LayoutArgs};

#[derive(Parser)]
#[command(
    name = "monstack",
    about = "monstack — monitoring stack health checks and migration",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Configuration file. A missing file means built-in defaults.
    #[arg(short, long, global = true, default_value = "monstack.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that every service of the stack answers and works.
    ///
    /// Probes the dashboard server, the metrics store and the alert router,
    /// every datasource through the dashboard server, and lists firing
    /// alerts. Fails if any check fails.
    Check {
        #[command(flatten)]
        grafana: GrafanaArgs,
        #[arg(long)]
        prometheus_url: Option<String>,
        #[arg(long)]
        alertmanager_url: Option<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Export, import, clone or copy a stack
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Export dashboards, datasources and config files to an archive.
    ///
    /// With --prometheus-url a TSDB snapshot is also requested on the
    /// metrics store. The snapshot stays on that host.
    Export {
        #[command(flatten)]
        grafana: GrafanaArgs,
        /// Export config files only
        #[arg(long)]
        no_grafana: bool,
        #[arg(long)]
        prometheus_url: Option<String>,
        #[arg(short, long, default_value = "stack-export.tar.gz")]
        output: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Extra target files to include (repeatable)
        #[arg(long = "target-file")]
        target_files: Vec<PathBuf>,
    },
    /// Import a stack from an archive or an unpacked export directory.
    Import {
        /// A .tar.gz archive or a directory
        path: PathBuf,
        #[command(flatten)]
        grafana: GrafanaArgs,
        /// Restore files only, upload nothing
        #[arg(long)]
        no_grafana: bool,
        /// Point imported metrics-store datasources at this URL
        #[arg(long)]
        prometheus_url: Option<String>,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Clone a running stack onto new ports.
    ///
    /// Target files are rebuilt from the source metrics store's live
    /// targets; datasource URLs are rewritten to the new container names.
    Clone {
        #[command(flatten)]
        grafana: GrafanaArgs,
        /// Source metrics store
        #[arg(long)]
        prometheus_url: Option<String>,
        #[arg(long)]
        prometheus_port: Option<u16>,
        #[arg(long)]
        grafana_port: Option<u16>,
        #[arg(long)]
        alertmanager_port: Option<u16>,
        /// Stack identifier used in container and network names
        #[arg(long = "stack")]
        stack_id: Option<u32>,
        /// Keep staged scrape config and target files here
        #[arg(long)]
        stage_dir: Option<PathBuf>,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Copy dashboards and datasources between two live dashboard servers
    Copy {
        #[arg(long)]
        source_grafana_url: String,
        #[arg(long, default_value = "admin")]
        source_grafana_user: String,
        #[arg(long, default_value = "admin")]
        source_grafana_password: String,
        #[arg(long)]
        target_grafana_url: String,
        #[arg(long, default_value = "admin")]
        target_grafana_user: String,
        #[arg(long, default_value = "admin")]
        target_grafana_password: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        include_dashboards: bool,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        include_datasources: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("monstack=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(&cli.config)?;

    match cli.command {
        Commands::Check {
            grafana,
            prometheus_url,
            alertmanager_url,
            format,
        } => commands::check::check(
            &config,
            &grafana,
            prometheus_url.as_deref(),
            alertmanager_url.as_deref(),
            &format,
        ),
        Commands::Migrate { action } => match action {
            MigrateAction::Export {
                grafana,
                no_grafana,
                prometheus_url,
                output,
                layout,
                target_files,
            } => commands::migrate::export(
                &config,
                (!no_grafana).then_some(&grafana),
                prometheus_url.as_deref(),
                output,
                &layout,
                target_files,
            ),
            MigrateAction::Import {
                path,
                grafana,
                no_grafana,
                prometheus_url,
                layout,
            } => commands::migrate::import(
                &config,
                path,
                (!no_grafana).then_some(&grafana),
                prometheus_url,
                &layout,
            ),
            MigrateAction::Clone {
                grafana,
                prometheus_url,
                prometheus_port,
                grafana_port,
                alertmanager_port,
                stack_id,
                stage_dir,
                layout,
            } => {
                let mut ports = config.clone;
                if let Some(port) = prometheus_port {
                    ports.prometheus_port = port;
                }
                if let Some(port) = grafana_port {
                    ports.grafana_port = port;
                }
                if let Some(port) = alertmanager_port {
                    ports.alertmanager_port = port;
                }
                if let Some(id) = stack_id {
                    ports.stack_id = id;
                }
                commands::migrate::clone(
                    &config,
                    &grafana,
                    prometheus_url.as_deref(),
                    ports,
                    stage_dir,
                    &layout,
                )
            }
            MigrateAction::Copy {
                source_grafana_url,
                source_grafana_user,
                source_grafana_password,
                target_grafana_url,
                target_grafana_user,
                target_grafana_password,
                include_dashboards,
                include_datasources,
            } => commands::migrate::copy(
                GrafanaArgs {
                    grafana_url: Some(source_grafana_url),
                    grafana_user: Some(source_grafana_user),
                    grafana_password: Some(source_grafana_password),
                },
                GrafanaArgs {
                    grafana_url: Some(target_grafana_url),
                    grafana_user: Some(target_grafana_user),
                    grafana_password: Some(target_grafana_password),
                },
                include_dashboards,
                include_datasources,
            ),
        },
    }
}
