//! # wheelhouse: Binary Entry Point
//!
//! Starts the Simple Repository API server (`serve`, the default) or prints
//! the index to the terminal (`list`). Both paths go through the same
//! [`IndexService`], so `list` shows exactly what the server would serve.

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use wheelhouse_api::service::{IndexService, ScanPolicy};
use wheelhouse_api::state::{AppConfig, AppState};
use wheelhouse_store::{ArtifactStore, DEFAULT_DIST_DIR};

/// Wheelhouse: read-only Simple Repository API over a directory of wheels.
#[derive(Parser, Debug)]
#[command(name = "wheelhouse", version, about, long_about = None)]
struct Cli {
    /// Root directory holding `{family}/dist/*.whl`.
    #[arg(long, env = "WHEELHOUSE_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Per-family subdirectory holding wheels.
    #[arg(long, env = "WHEELHOUSE_DIST_DIR", default_value = DEFAULT_DIST_DIR, global = true)]
    dist_dir: String,

    /// How to treat wheel files whose names cannot be parsed.
    #[arg(
        long,
        env = "WHEELHOUSE_SCAN_POLICY",
        value_parser = ScanPolicy::from_str,
        default_value_t = ScanPolicy::Strict,
        global = true
    )]
    scan_policy: ScanPolicy,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Address to bind to.
    #[arg(long, env = "WHEELHOUSE_BIND", default_value = "0.0.0.0", global = true)]
    bind: IpAddr,

    /// Port to bind to.
    #[arg(long, env = "PORT", default_value_t = 8080, global = true)]
    port: u16,

    /// Record request metrics and expose them at `/_/metrics`.
    #[arg(
        long,
        env = "WHEELHOUSE_METRICS_ENABLED",
        default_value_t = true,
        action = ArgAction::Set,
        global = true
    )]
    metrics_enabled: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the index over HTTP (default).
    Serve,

    /// Print every project, or one project's files, and exit.
    List {
        /// Project to list files for, in any spelling.
        project: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            bind: self.bind,
            port: self.port,
            artifact_root: self.root.clone(),
            dist_dir: self.dist_dir.clone(),
            scan_policy: self.scan_policy,
            metrics_enabled: self.metrics_enabled,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match &cli.command {
        Some(Commands::List { project }) => run_list(&cli, project.as_deref()),
        Some(Commands::Serve) | None => serve(cli.app_config()).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(config = ?config, "starting wheelhouse");
    let addr = config.socket_addr();
    let metrics_enabled = config.metrics_enabled;

    let mut state = AppState::new(config);
    if metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }
    if !state.service.store().is_available() {
        tracing::warn!(
            root = %state.service.store().root().display(),
            "artifact root is not readable; serving an empty index"
        );
    }

    let app = wheelhouse_api::app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("wheelhouse listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("wheelhouse stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

fn run_list(cli: &Cli, project: Option<&str>) -> anyhow::Result<()> {
    let store = ArtifactStore::with_dist_dir(&cli.root, cli.dist_dir.clone());
    let service = IndexService::new(store, cli.scan_policy);

    match project {
        None => {
            let index = service.list_projects().context("failed to list projects")?;
            for project in index.projects {
                println!("{}", project.name);
            }
        }
        Some(project) => {
            let page = service
                .list_files(project)
                .with_context(|| format!("failed to list files for {project}"))?;
            println!("{} ({})", page.name, page.versions.join(", "));
            for file in page.files {
                println!("  {}  sha256={}  {} bytes", file.filename, file.hashes.sha256, file.size);
            }
        }
    }
    Ok(())
}
