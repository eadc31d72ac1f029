//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - SIGTERM/SIGINT fire the shared shutdown
//! - SIGHUP triggers a routing table reload, not shutdown

use crate::lifecycle::Shutdown;
use crate::reload::{ReloadTrigger, Reloader};

/// Translate OS signals into shutdown and reload until shutdown fires.
#[cfg(unix)]
pub async fn watch_signals(shutdown: Shutdown, reloader: Reloader) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut terminate, mut hangup) =
        match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(terminate), Ok(hangup)) => (terminate, hangup),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers, only Ctrl+C is honoured");
                return wait_for_interrupt(shutdown).await;
            }
        };

    loop {
        tokio::select! {
            _ = shutdown.done() => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received");
                shutdown.cancel();
                break;
            }
            _ = terminate.recv() => {
                tracing::info!("Terminate received");
                shutdown.cancel();
                break;
            }
            _ = hangup.recv() => {
                tracing::info!("Hangup received");
                let _ = reloader.reload(ReloadTrigger::Signal).await;
            }
        }
    }
}

#[cfg(not(unix))]
pub async fn watch_signals(shutdown: Shutdown, _reloader: Reloader) {
    wait_for_interrupt(shutdown).await
}

async fn wait_for_interrupt(shutdown: Shutdown) {
    tokio::select! {
        _ = shutdown.done() => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => tracing::info!("Interrupt received"),
                Err(e) => tracing::error!(error = %e, "Ctrl+C handler failed"),
            }
            shutdown.cancel();
        }
    }
}
