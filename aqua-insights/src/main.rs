//! aqua-insights - assessment insights service
//!
//! `serve` hosts the session and the result data-provider over HTTP + SSE;
//! `query` resolves one selector through the cache and prints the result set.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use aqua_common::config::{
    default_config_path, read_toml_config, ConfigOverrides, InsightsConfig, TomlConfig,
};
use aqua_common::events::EventBus;
use aqua_insights::logging::log_filter;
use aqua_insights::AppState;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for aqua-insights
#[derive(Parser, Debug)]
#[command(name = "aqua-insights")]
#[command(about = "Translation-quality assessment insights service")]
#[command(version)]
struct Args {
    /// Config file (defaults to ~/.config/aqua/aqua-insights.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding the result cache database
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Remote results endpoint
    #[arg(long, global = true)]
    base_uri: Option<String>,

    /// Credential sent with every remote request
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Header that carries the credential
    #[arg(long, global = true)]
    api_key_header: Option<String>,

    /// Persistence namespace
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Assessment shown by the interactive session
    #[arg(long, global = true)]
    assessment_id: Option<u32>,

    /// Refetch cached results older than this; 0 keeps them until evicted
    #[arg(long, global = true)]
    cache_max_age_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Resolve one selector and print the result set as JSON
    Query {
        /// e.g. '{"assessment_id":211,"book":"GEN"}'
        #[arg(long)]
        selector: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read before the subscriber exists: it supplies the log level
    let config_path = args.config.clone().or_else(default_config_path);
    let (toml_config, config_error) = match config_path.as_deref().map(read_toml_config) {
        Some(Ok(Some(config))) => (config, None),
        Some(Err(e)) => (TomlConfig::default(), Some(e)),
        _ => (TomlConfig::default(), None),
    };

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref(), &toml_config.logging))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    if let Some(e) = config_error {
        warn!("{}, using defaults", e);
    } else if let Some(path) = config_path.filter(|p| p.exists()) {
        info!("Loaded config from {}", path.display());
    }

    let port = match &args.command {
        Command::Serve { port } => *port,
        Command::Query { .. } => None,
    };
    let overrides = ConfigOverrides {
        root_folder: args.root_folder.clone(),
        base_uri: args.base_uri.clone(),
        api_key: args.api_key.clone(),
        api_key_header: args.api_key_header.clone(),
        namespace: args.namespace.clone(),
        assessment_id: args.assessment_id,
        cache_max_age_secs: args.cache_max_age_secs,
        port,
    };
    let config = InsightsConfig::resolve(&overrides, &toml_config)
        .context("Failed to resolve configuration")?;

    match args.command {
        Command::Serve { .. } => serve(config).await,
        Command::Query { selector } => query(config, &selector).await,
    }
}

async fn serve(config: InsightsConfig) -> Result<()> {
    info!("Starting aqua-insights on port {}", config.port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let event_bus = EventBus::new(100);
    let state = AppState::from_config(&config, event_bus)
        .await
        .context("Failed to initialize service")?;

    let app = aqua_insights::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn query(config: InsightsConfig, selector: &str) -> Result<()> {
    let cache = aqua_insights::build_cache_service(&config, None)
        .await
        .context("Failed to initialize result cache")?;

    let result_set = cache
        .get_results_from_string_selector(selector)
        .await
        .context("Query failed")?;

    println!("{}", serde_json::to_string_pretty(&result_set)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
