//! Routing table reload subsystem.
//!
//! # Data Flow
//! ```text
//! Trigger (UDP "reload" datagram | SIGHUP | source watcher)
//!     → Reloader::reload (one at a time)
//!     → ConfigStore::reload (new RoutingTable, built off to the side)
//!     → Router::publish (single atomic swap)
//! ```
//!
//! # Design Decisions
//! - A failed reload leaves the previous snapshot in effect
//! - Reloads are serialised so publishes land in trigger order
//! - No listener restarts; in-flight lookups finish on their snapshot

pub mod channel;

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::config::{ConfigStore, SourceError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::Router;

pub use channel::{ReloadChannel, RELOAD_TOKEN};

/// What asked for a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    Datagram,
    Signal,
    Watcher,
}

impl fmt::Display for ReloadTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReloadTrigger::Datagram => "datagram",
            ReloadTrigger::Signal => "signal",
            ReloadTrigger::Watcher => "watcher",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("reload task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Rebuilds the routing table and publishes it to the router.
#[derive(Debug, Clone)]
pub struct Reloader {
    store: Arc<ConfigStore>,
    router: Arc<Router>,
    serial: Arc<Mutex<()>>,
}

impl Reloader {
    pub fn new(store: Arc<ConfigStore>, router: Arc<Router>) -> Self {
        Self {
            store,
            router,
            serial: Arc::new(Mutex::new(())),
        }
    }

    /// Reload and publish. Returns the published generation.
    pub async fn reload(&self, trigger: ReloadTrigger) -> Result<u64, ReloadError> {
        let _serial = self.serial.lock().await;

        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || store.reload())
            .await
            .map_err(ReloadError::from)
            .and_then(|built| built.map_err(ReloadError::from));

        match result {
            Ok(table) => {
                let hosts = table.len();
                let generation = self.router.publish(table);
                metrics::record_reload(true);
                metrics::set_routing_hosts(hosts);
                tracing::info!(%trigger, generation, hosts, "Reload complete");
                Ok(generation)
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::error!(%trigger, error = %e, "Reload failed, keeping current routing table");
                Err(e)
            }
        }
    }

    /// Reload once per message on `changes` until shutdown.
    pub async fn follow(self, mut changes: mpsc::UnboundedReceiver<()>, shutdown: Shutdown) {
        loop {
            tokio::select! {
                _ = shutdown.done() => break,
                change = changes.recv() => {
                    if change.is_none() {
                        break;
                    }
                    // Collapse bursts of events (editors write several times).
                    while changes.try_recv().is_ok() {}
                    let _ = self.reload(ReloadTrigger::Watcher).await;
                }
            }
        }
        tracing::debug!("Source change follower stopped");
    }
}
