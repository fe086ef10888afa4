//! Nox Lobby - game lobby server for Nox

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LogFormat, LoggingConfig};
use lobby_api::{AppState, create_router, monitor_router};
use lobby_client::LobbyClient;
use lobby_core::{
    DEFAULT_TIMEOUT, GameLister, GameSource, ListCache, Lobby, LobbyService, MetricsObserver,
    ObservedLister, Overlay, spawn_refresh_task,
};

/// Nox Lobby - game lobby server for Nox
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "NOX_LOBBY_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "NOX_LOBBY_PORT")]
    port: Option<u16>,

    /// Address serving metrics, empty to disable
    #[arg(long, env = "NOX_LOBBY_MONITOR")]
    monitor: Option<String>,

    /// Run in global mode (monitor all known games)
    #[arg(long, env = "NOX_LOBBY_GLOBAL")]
    global: bool,

    /// Remote lobby to list games from
    #[arg(long, env = "NOX_LOBBY_UPSTREAM")]
    upstream: Option<String>,

    /// Remote lobby cache duration in seconds, 0 to disable
    #[arg(long, env = "NOX_LOBBY_UPSTREAM_CACHE")]
    upstream_cache: Option<u64>,

    /// Trust game addresses sent by clients
    #[arg(long, env = "NOX_LOBBY_TRUST_ADDR")]
    trust_addr: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(monitor) = self.monitor {
            config.monitor.address = monitor;
        }
        if self.global {
            config.monitor.global = true;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.url = Some(upstream);
        }
        if let Some(secs) = self.upstream_cache {
            config.upstream.cache_secs = secs;
        }
        if self.trust_addr {
            config.server.trust_addr = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);

    init_logging(&config.logging);

    info!("Starting Nox Lobby v{}", env!("CARGO_PKG_VERSION"));

    let observer = Arc::new(MetricsObserver);
    let service = Arc::new(LobbyService::with_observer(observer.clone()));
    service.set_timeout(config.lobby.timeout());

    let lobby: Arc<dyn Lobby> = match config.upstream.url() {
        Some(url) => {
            let mut client = LobbyClient::new(url)
                .with_context(|| format!("Invalid upstream lobby URL: {}", url))?;
            client.set_user_agent(config.upstream.user_agent.clone());

            let mut remote: Arc<dyn GameLister> = Arc::new(ObservedLister::new(
                Arc::new(client),
                GameSource::Remote,
                observer,
            ));
            let cache = config.upstream.cache();
            if !cache.is_zero() {
                remote = Arc::new(ListCache::new(remote, cache));
            }
            info!("Listing games from remote lobby {}", url);
            Arc::new(Overlay::new(service, remote))
        }
        None => service,
    };

    let shutdown = CancellationToken::new();

    if !config.monitor.address.is_empty() {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install metrics recorder")?;
        let addr: SocketAddr = config
            .monitor
            .address
            .parse()
            .with_context(|| format!("Invalid monitor address: {}", config.monitor.address))?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = monitor_router(Arc::new(handle));
        let token = shutdown.clone();

        info!("Serving monitoring on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!("Monitoring server failed: {}", e);
            }
        });

        if config.monitor.global {
            // Listing drives expiry and remote polling, and with it the metrics
            spawn_refresh_task(Arc::new(lobby.clone()), refresh_period());
        }
    } else if config.monitor.global {
        warn!("Global mode requires a monitor address, ignoring");
    }

    let app = create_router(AppState::new(lobby, config.server.trust_addr))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Serving lobby on {}", addr);
    if config.server.trust_addr {
        warn!("Trusting game addresses reported by clients");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::spawn(shutdown_signal(shutdown.clone()));
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;

    info!("Server stopped");
    Ok(())
}

fn refresh_period() -> Duration {
    DEFAULT_TIMEOUT / 2
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Wait for shutdown signal
async fn shutdown_signal(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
            token.cancel();
        }
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
