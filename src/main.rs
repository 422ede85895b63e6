//! Marquee API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ SetRequestId → Trace
//!                       → RecoverPanic → Cors → RateLimit → Authenticate
//!                       → route table ─┬─ public routes ──────────────┐
//!                                      └─ authorize(permission) ──────┤
//!                                                                     ▼
//!     Client Response                                             handlers
//!     ◀──────────────  JSON envelope ◀───────────────────────────── data stores
//! ```
//!
//! Configuration comes from an optional TOML file, then command-line flags;
//! the merged result is validated before anything starts.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use marquee::config::{load_config, validate_config, AppConfig, ConfigError};
use marquee::data::Models;
use marquee::lifecycle::{wait_for_signal, Shutdown};
use marquee::observability::{logging, metrics};
use marquee::{AppState, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(about = "Movie catalogue JSON API", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, keeping the configured host
    #[arg(long)]
    port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long)]
    env: Option<String>,

    /// Rate limiter maximum requests per second
    #[arg(long)]
    limiter_rps: Option<f64>,

    /// Rate limiter maximum burst
    #[arg(long)]
    limiter_burst: Option<u32>,

    /// Enable the rate limiter
    #[arg(long)]
    limiter_enabled: Option<bool>,

    /// Trusted CORS origins (space separated)
    #[arg(long, value_delimiter = ' ', num_args = 0..)]
    cors_trusted_origins: Option<Vec<String>>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            let ip = config
                .listener
                .bind_address
                .parse::<SocketAddr>()
                .map(|addr| addr.ip())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
            config.listener.bind_address = SocketAddr::new(ip, port).to_string();
        }
        if let Some(env) = &self.env {
            config.environment = env.clone();
        }
        if let Some(rps) = self.limiter_rps {
            config.limiter.requests_per_second = rps;
        }
        if let Some(burst) = self.limiter_burst {
            config.limiter.burst = burst;
        }
        if let Some(enabled) = self.limiter_enabled {
            config.limiter.enabled = enabled;
        }
        if let Some(origins) = &self.cors_trusted_origins {
            config.cors.trusted_origins = origins
                .iter()
                .filter(|o| !o.is_empty())
                .cloned()
                .collect();
        }
    }
}

fn load(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load(&args)?;

    logging::init_logging(config.observability.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "marquee starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.environment,
        limiter_enabled = config.limiter.enabled,
        limiter_rps = config.limiter.requests_per_second,
        limiter_burst = config.limiter.burst,
        trusted_origins = config.cors.trusted_origins.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let state = AppState::new(config, Models::in_memory())?;
    let server = HttpServer::new(state);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
