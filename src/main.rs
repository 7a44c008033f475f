//! Login gateway
//!
//! An HTTP gateway that runs in front of a login-protected application.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id / trace / timeout
//!                        │
//!                        ▼
//!                  ┌───────────────────────────────────────────────┐
//!                  │ gateway pipeline                              │
//!                  │  session check → access → decrypt → captcha   │
//!                  └──────┬──────────────────────────────┬─────────┘
//!                         │ reply                        │ continue
//!                         ▼                              ▼
//!     ◀────────── sign-out script / JSON error     upstream forwarder ──▶ Application
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use login_gateway::config::{load_config, GatewayConfig};
use login_gateway::observability::{logging, metrics};
use login_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "login-gateway")]
#[command(about = "Session, payload decryption and captcha gateway for a login endpoint", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "LOGIN_GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("login-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        context_path = %config.security.context_path,
        captcha_enabled = config.captcha.enabled,
        encryption_enabled = config.encryption.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
