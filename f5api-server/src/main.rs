#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::Context;
use clap::Parser;
use f5api_core::config::LogFormat;
use f5api_core::{Config, VersionInfo};
use f5api_ltm::HostRegistry;
use f5api_observability::MetricsCollector;
use f5api_rest::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "f5api", version, about = "Manage client-SSL profiles on BigIP LTM hosts")]
struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, default_value = "/etc/f5api/config.yaml")]
    config: PathBuf,

    /// Log level, overrides the configured one
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Config ──
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // ── Tracing ──
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(level, config.log_format);

    let version = VersionInfo::current();
    info!(
        version = %version.version,
        git_hash = %version.git_hash,
        org = %config.org,
        "f5api starting"
    );

    // ── Appliance sessions ──
    let registry = HostRegistry::from_config(&config)?;
    if registry.is_empty() {
        warn!("No accounts configured, every host-scoped request will return 404");
    }
    for alias in registry.aliases() {
        info!(alias, "LTM host registered");
    }

    // ── Shared state ──
    let metrics = MetricsCollector::new(config.metrics_enabled)?;
    let state = Arc::new(AppState {
        registry: Arc::new(registry),
        metrics: Arc::new(metrics),
        token: config.token.clone(),
        version,
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    });

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    rt.block_on(server::start(&config.listen_addr(), state, shutdown_signal()))?;

    info!("f5api stopped");
    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM (docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
