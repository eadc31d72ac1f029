//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the initial routing table from the validated config
//! - Start background tasks (reload channel, watcher, signals, metrics)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::watcher::SourceWatcher;
use crate::config::{ConfigStore, ProxyConfig, SourceError};
use crate::lifecycle::{signals, Shutdown};
use crate::net::{ListenerError, ListenerSupervisor};
use crate::observability::metrics;
use crate::reload::{ReloadChannel, Reloader};
use crate::routing::Router;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("initial routing table: {0}")]
    Source(#[from] SourceError),

    #[error("reload channel: {0}")]
    ReloadChannel(#[source] io::Error),

    #[error("service source watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Run the front door until shutdown. Returns once both listeners have stopped.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let store = Arc::new(ConfigStore::from_config(&config.services));
    let table = store.build_routing_table()?;
    tracing::info!(
        backends = table.backends().len(),
        hosts = table.len(),
        "Routing table loaded"
    );
    metrics::set_routing_hosts(table.len());

    let router = Arc::new(Router::new(table));
    let shutdown = Shutdown::new();
    let reloader = Reloader::new(store.clone(), router.clone());

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let reload_addr: SocketAddr = config
        .reload
        .bind_address
        .parse()
        .map_err(|e| StartupError::ReloadChannel(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
    let channel = ReloadChannel::bind(reload_addr, reloader.clone())
        .await
        .map_err(StartupError::ReloadChannel)?;
    tokio::spawn(channel.run(shutdown.clone()));

    // Dropping the watcher stops notifications, so it lives for the whole run.
    let _watcher = match (config.reload.watch, store.source().watch_path()) {
        (true, Some(path)) => {
            let (watcher, changes) = SourceWatcher::new(path);
            let guard = watcher.run()?;
            tokio::spawn(reloader.clone().follow(changes, shutdown.clone()));
            Some(guard)
        }
        (true, None) => {
            tracing::warn!("reload.watch set but services are inline; nothing to watch");
            None
        }
        (false, _) => None,
    };

    tokio::spawn(signals::watch_signals(shutdown.clone(), reloader));

    let result = ListenerSupervisor::new(&config, router, shutdown.clone()).run().await;
    shutdown.cancel();
    result.map_err(StartupError::from)
}
