//! CoinFluence launch pipeline service
//!
//! Serves the pledge ledger and the launch administration API, and drives
//! liquidity bootstraps against an EVM node (or an in-process simulator).

use anyhow::Result;
use clap::Parser;
use coinfluence_launcher::{api, LauncherConfig, ServiceContainer};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coinfluence-launcher")]
#[command(about = "CoinFluence pledge ledger and liquidity bootstrap service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "launcher.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Dry run mode (validate config and exit)
    #[arg(long)]
    dry_run: bool,

    /// Use the in-process simulated chain instead of the configured RPC node
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_missing = !std::path::Path::new(&cli.config).exists();
    let mut config = if config_missing {
        LauncherConfig::default()
    } else {
        LauncherConfig::from_file(&cli.config)?
    };

    // Override log level if provided
    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config);
    if config_missing {
        warn!("Config file not found, using defaults: {}", cli.config);
    }

    info!("Starting CoinFluence launcher");
    info!("Chain: id {} via {}", config.chain.chain_id, config.chain.rpc_url);
    info!("Launcher account: {}", config.chain.launcher_account);

    config.validate()?;
    info!("Configuration validated successfully");

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let container = ServiceContainer::new(config, cli.simulate).await?;
    if let Err(e) = container.health_check().await {
        warn!("Startup health check failed, serving anyway: {}", e);
    }

    info!("Starting API server on {}", container.config.api.bind_address);
    let api_server = api::start_server(container.api_state(), &container.config.api).await?;

    let _metrics_server = if container.config.monitoring.metrics_port > 0 {
        info!("Starting metrics server on port {}", container.config.monitoring.metrics_port);
        Some(api::start_metrics_server(container.config.monitoring.metrics_port, container.metrics.clone()).await?)
    } else {
        None
    };

    // Wait for shutdown signal
    info!("Launcher started successfully. Press Ctrl+C to shutdown.");
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
        }
        result = api_server => {
            if let Err(e) = result {
                error!("API server task error: {}", e);
            }
        }
    }

    container.shutdown().await;
    info!("Shutting down CoinFluence launcher");
    Ok(())
}

fn init_logging(config: &LauncherConfig) {
    let log_level = config
        .monitoring
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("coinfluence_launcher={},tower_http=info", log_level).into());

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
