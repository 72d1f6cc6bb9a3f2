use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use musicreq_core::{
    create_authenticator, load_config, validate_config, Aggregator, Authenticator, Config,
    QBittorrentClient, TorrentClient, TorrentClientBackend,
};
use musicreq_server::api::create_router;
use musicreq_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let config_path = std::env::var("MUSICREQ_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth, &config.http)
            .context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let torrent_client = create_torrent_client(&config);

    let aggregator = Aggregator::from_config(&config, torrent_client.clone())
        .context("Failed to create search aggregator")?;
    info!(sources = ?aggregator.source_names(), "Search aggregator ready");

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        Arc::new(aggregator),
        torrent_client,
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Human-readable logs by default; `MUSICREQ_LOG_FORMAT=json` for log shippers.
fn init_logging() {
    let json = std::env::var("MUSICREQ_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(fmt_layer)
        .init();
}

fn create_torrent_client(config: &Config) -> Option<Arc<dyn TorrentClient>> {
    let Some(tc_config) = &config.torrent_client else {
        info!("No torrent client configured, results will not be flagged");
        return None;
    };

    match tc_config.backend {
        TorrentClientBackend::QBittorrent => match &tc_config.qbittorrent {
            Some(qbit_config) => {
                info!("Initializing qBittorrent client at {}", qbit_config.url);
                Some(Arc::new(QBittorrentClient::new(
                    qbit_config.clone(),
                    config.http.user_agent.clone(),
                )))
            }
            None => {
                error!("qBittorrent backend selected but no qbittorrent config provided");
                None
            }
        },
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
