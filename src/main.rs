//! Front door (v1)
//!
//! A host-routing reverse proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────────┐
//!                          │                      FRONT DOOR                        │
//!                          │                                                        │
//!     :8080 (plain)        │  ┌──────────┐    ┌─────────┐    ┌──────────────┐       │
//!     ─────────────────────┼─▶│ listener │───▶│  http   │───▶│   routing    │       │
//!     :8443 (TLS)          │  │supervisor│    │ server  │    │ Router (Arc- │       │
//!     ─────────────────────┼─▶│          │    │         │    │  Swap table) │       │
//!                          │  └──────────┘    └─────────┘    └──────┬───────┘       │
//!                          │                                         │               │
//!                          │        not found / redirect ◀──────────┤               │
//!                          │                                         ▼               │
//!                          │                                 ┌──────────────┐        │
//!                          │                                 │  dispatch    │────────┼──▶ localhost:<port>
//!                          │                                 └──────────────┘        │
//!                          │                                                        │
//!     "reload" (UDP, lo)   │  ┌──────────┐    ┌─────────────┐                       │
//!     ─────────────────────┼─▶│  reload  │───▶│ ConfigStore │──▶ Router::publish    │
//!     SIGHUP / watcher     │  └──────────┘    └─────────────┘                       │
//!                          └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use frontdoor::config::load_config;
use frontdoor::lifecycle::startup;
use frontdoor::observability::logging;

#[derive(Parser)]
#[command(name = "frontdoor")]
#[command(about = "Host-routing TLS front door", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "FRONTDOOR_CONFIG", default_value = "frontdoor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging is configured by the file, so a config failure goes to stderr.
    let config = load_config(&args.config).map_err(|e| {
        eprintln!("frontdoor: {e}");
        e
    })?;

    logging::init(&config.observability)?;

    tracing::info!("frontdoor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = ?args.config,
        http_port = config.listener.http_port,
        https_port = config.listener.https_port,
        reload_address = %config.reload.bind_address,
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
