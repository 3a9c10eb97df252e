use anyhow::Result;
use axum::serve;
use chorus_core::{
    cache::{spawn_sweeper, ResponseCache, SWEEP_INTERVAL},
    config::AppConfig,
    proxy::ProxyEngine,
};
use rustls::crypto::{ring::default_provider, CryptoProvider};
use server::router;
use std::{net::SocketAddr, sync::Arc};
use tokio::{signal, sync::broadcast};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system based on the configuration.
///
/// When `logpath` is set, log output is mirrored into that file without ANSI
/// escapes. `LOG_FORMAT=json` switches the console layer to JSON lines.
fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = if let Ok(env_filter) = std::env::var("RUST_LOG") {
        if env_filter == "debug" {
            EnvFilter::new("warn,chorus_core=debug,server=debug,tests=debug")
        } else if env_filter == "trace" {
            EnvFilter::new("warn,chorus_core=trace,server=trace,tests=trace")
        } else {
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("warn,chorus_core=debug,server=debug"))
        }
    } else {
        EnvFilter::new("warn,chorus_core=info,server=info")
    };

    let registry = tracing_subscriber::registry().with(filter);

    let log_file = match &config.logpath {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {e}", path.display()))?;
            Some(Arc::new(file))
        }
        None => None,
    };

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        let fmt_layer = tracing_subscriber::fmt::layer().json();
        let file_layer = log_file
            .map(|file| tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file));
        registry.with(fmt_layer).with(file_layer).init();
    } else {
        // any other format defaults to pretty logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        let file_layer = log_file
            .map(|file| tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file));
        registry.with(fmt_layer).with(file_layer).init();
    }

    Ok(())
}

/// Resolves the config file path: CLI argument, then `CHORUS_CONFIG`, then
/// the conventional default.
fn config_path() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHORUS_CONFIG").ok())
        .unwrap_or_else(|| "config/config.yml".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    CryptoProvider::install_default(default_provider())
        .map_err(|e| anyhow::anyhow!("Failed to install crypto provider: {e:?}"))?;

    let path = config_path();
    let config = AppConfig::from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration from {path}: {e}"))?;
    config.validate().map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    init_logging(&config)?;
    info!("Starting Chorus JSON-RPC proxy");
    debug!(
        workers_count = config.workers.len(),
        mode = config.select_worker_mode.as_str(),
        bind_port = config.port,
        "Configuration loaded"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let cache = Arc::new(ResponseCache::new());
    let sweeper_handle =
        spawn_sweeper(Arc::clone(&cache), SWEEP_INTERVAL, shutdown_tx.subscribe());

    let engine = Arc::new(
        ProxyEngine::from_config(&config, Arc::clone(&cache))
            .map_err(|e| anyhow::anyhow!("Proxy engine initialization failed: {e}"))?,
    );

    let app = router::create_app(engine);
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {}: {e}", config.listen_addr()))?;
    info!(
        address = %addr,
        mode = config.select_worker_mode.as_str(),
        workers = config.workers.len(),
        "RPC proxy listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "Server error occurred");
    }

    let _ = shutdown_tx.send(());
    sweeper_handle.abort();
    info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
