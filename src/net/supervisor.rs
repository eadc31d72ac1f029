//! Supervision of the plain and TLS listeners.
//!
//! # Responsibilities
//! - Start both listeners over one shared routing snapshot
//! - Turn either listener's exit into a process-wide shutdown
//! - Stop both listeners when shutdown fires from anywhere else

use std::future::Future;
use std::sync::Arc;

use axum_server::Handle;

use crate::config::{ListenerConfig, ProxyConfig, TimeoutConfig, TlsConfig};
use crate::http::{build_app, AppState, ProxyDispatcher};
use crate::lifecycle::Shutdown;
use crate::net::listener::{serve_plain, serve_tls, ListenerError};
use crate::net::tls::load_tls_config;
use crate::routing::{Channel, Router};

/// Owns the two listeners and the shutdown signal they share.
pub struct ListenerSupervisor {
    listener: ListenerConfig,
    tls: TlsConfig,
    timeouts: TimeoutConfig,
    router: Arc<Router>,
    dispatcher: ProxyDispatcher,
    shutdown: Shutdown,
}

impl ListenerSupervisor {
    pub fn new(config: &ProxyConfig, router: Arc<Router>, shutdown: Shutdown) -> Self {
        Self {
            listener: config.listener.clone(),
            tls: config.tls.clone(),
            timeouts: config.timeouts.clone(),
            router,
            dispatcher: ProxyDispatcher::new(),
            shutdown,
        }
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run both listeners until either exits or shutdown fires.
    ///
    /// Returns the first listener error, if any.
    pub async fn run(self) -> Result<(), ListenerError> {
        let plain_handle = Handle::new();
        let secure_handle = Handle::new();

        let stopper = {
            let shutdown = self.shutdown.clone();
            let plain_handle = plain_handle.clone();
            let secure_handle = secure_handle.clone();
            tokio::spawn(async move {
                shutdown.done().await;
                tracing::info!("Shutdown signalled, stopping listeners");
                plain_handle.shutdown();
                secure_handle.shutdown();
            })
        };

        let plain_app = build_app(self.app_state(Channel::Plain), &self.timeouts);
        let secure_app = build_app(self.app_state(Channel::Secure), &self.timeouts);

        let plain = supervise(
            Channel::Plain,
            serve_plain(self.listener.http_addr(), plain_app, plain_handle, &self.timeouts),
            &self.shutdown,
        );
        let secure = supervise(
            Channel::Secure,
            async {
                let tls = load_tls_config(&self.tls).await?;
                serve_tls(self.listener.https_addr(), secure_app, secure_handle, tls, &self.timeouts).await
            },
            &self.shutdown,
        );

        let (plain_result, secure_result) = tokio::join!(plain, secure);
        stopper.abort();

        plain_result.and(secure_result)
    }

    fn app_state(&self, channel: Channel) -> AppState {
        AppState {
            router: self.router.clone(),
            dispatcher: self.dispatcher.clone(),
            channel,
        }
    }
}

async fn supervise<F>(channel: Channel, listener: F, shutdown: &Shutdown) -> Result<(), ListenerError>
where
    F: Future<Output = Result<(), ListenerError>>,
{
    let result = listener.await;
    match &result {
        Ok(()) => tracing::info!(listener = %channel, "Listener stopped"),
        Err(e) => tracing::error!(listener = %channel, error = %e, "Listener failed"),
    }
    shutdown.cancel();
    result
}
