//! Plain and TLS listeners.
//!
//! # Responsibilities
//! - Bind the configured address
//! - Apply the fixed per-connection timeouts
//! - Serve an Axum app with peer addresses attached
//! - Stop when the supervisor's handle says so

use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle, Server};
use hyper_util::rt::TokioTimer;
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::net::tls::TlsError;
use crate::routing::Channel;

/// Error type for listener operations. Any of these ends the process.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("{listener} listener on {addr} failed: {source}")]
    Serve {
        listener: Channel,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("TLS listener cannot start: {0}")]
    Tls(#[from] TlsError),
}

/// Serve `app` over plain HTTP until `handle` is shut down.
pub async fn serve_plain(
    addr: SocketAddr,
    app: Router,
    handle: Handle,
    timeouts: &TimeoutConfig,
) -> Result<(), ListenerError> {
    let mut server = axum_server::bind(addr).handle(handle);
    apply_timeouts(&mut server, timeouts);

    tracing::info!(address = %addr, listener = %Channel::Plain, "Listener starting");
    server
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|source| ListenerError::Serve {
            listener: Channel::Plain,
            addr,
            source,
        })
}

/// Serve `app` over TLS until `handle` is shut down.
pub async fn serve_tls(
    addr: SocketAddr,
    app: Router,
    handle: Handle,
    tls: RustlsConfig,
    timeouts: &TimeoutConfig,
) -> Result<(), ListenerError> {
    let mut server = axum_server::bind_rustls(addr, tls).handle(handle);
    apply_timeouts(&mut server, timeouts);

    tracing::info!(address = %addr, listener = %Channel::Secure, "Listener starting");
    server
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|source| ListenerError::Serve {
            listener: Channel::Secure,
            addr,
            source,
        })
}

/// Read-header bounds HTTP/1 requests (including idle keep-alive waits);
/// idle HTTP/2 connections are dropped by keep-alive pings.
fn apply_timeouts<A>(server: &mut Server<A>, timeouts: &TimeoutConfig) {
    let builder = server.http_builder();
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read_header());
    builder
        .http2()
        .timer(TokioTimer::new())
        .keep_alive_interval(timeouts.idle())
        .keep_alive_timeout(timeouts.idle());
}
