//! Forwarding of routed requests to local backends.
//!
//! # Responsibilities
//! - Rewrite the request target to `http://localhost:<port>` (the director)
//! - Inject forwarding headers uniformly for every backend
//! - Hand off to the HTTP client and stream the response back
//!
//! # Design Decisions
//! - Always plaintext to backends; TLS terminates at the edge
//! - No buffering: response frames are relayed as they arrive, which long-poll
//!   and streaming backends rely on
//! - One attempt per request: no retries, caching or health checks
//! - Transport failures become a bare 502; the listener keeps serving
//! - Protocol upgrades keep `Connection`/`Upgrade`; after a 101 both sides
//!   are spliced as raw byte streams

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName},
        uri::Scheme,
        HeaderMap, HeaderValue, Request, StatusCode, Uri, Version,
    },
    response::Response,
};
use hyper::{body::Incoming, upgrade::OnUpgrade};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use thiserror::Error;

use crate::config::descriptor::BackendDescriptor;
use crate::http::response;
use crate::observability::metrics;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_ORIGIN_HOST: HeaderName = HeaderName::from_static("x-origin-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Headers that describe a single connection and must not be relayed.
static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    KEEP_ALIVE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("cannot build backend URI: {0}")]
    Uri(#[from] axum::http::Error),

    #[error("invalid forwarding header: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

/// Turns `Forward` decisions into backend requests.
#[derive(Clone)]
pub struct ProxyDispatcher {
    client: Client<HttpConnector, Body>,
}

impl ProxyDispatcher {
    pub fn new() -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);

        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
        }
    }

    /// Rewrite `request` for delivery to `backend`.
    pub fn prepare(
        backend: &BackendDescriptor,
        client_addr: SocketAddr,
        request: Request<Body>,
    ) -> Result<Request<Body>, DispatchError> {
        let (mut parts, body) = request.into_parts();
        let upgrade = upgrade_protocol(&parts.headers);

        let original_host = match parts.headers.get(header::HOST) {
            Some(host) => Some(host.clone()),
            None => parts
                .uri
                .authority()
                .map(|a| HeaderValue::from_str(a.as_str()))
                .transpose()?,
        };

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let authority = backend.authority();
        parts.uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(authority.as_str())
            .path_and_query(path_and_query)
            .build()?;
        // Backends speak HTTP/1.1 regardless of the client's protocol.
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);

        let headers = &mut parts.headers;
        if let Some(protocol) = upgrade {
            headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
            headers.insert(header::UPGRADE, protocol);
        }
        if let Some(host) = original_host {
            if !headers.contains_key(header::HOST) {
                headers.insert(header::HOST, host.clone());
            }
            headers.insert(X_FORWARDED_HOST, host);
        }
        headers.insert(X_ORIGIN_HOST, HeaderValue::from_str(&authority)?);
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_str(&client_addr.ip().to_string())?,
        );

        Ok(Request::from_parts(parts, body))
    }

    /// Forward one request and relay whatever the backend answers.
    pub async fn dispatch(
        &self,
        backend: &BackendDescriptor,
        client_addr: SocketAddr,
        mut request: Request<Body>,
    ) -> Response {
        let client_upgrade = upgrade_protocol(request.headers())
            .is_some()
            .then(|| hyper::upgrade::on(&mut request));

        let outgoing = match Self::prepare(backend, client_addr, request) {
            Ok(outgoing) => outgoing,
            Err(e) => {
                tracing::warn!(backend = %backend, error = %e, "Cannot forward request");
                return response::bad_gateway();
            }
        };

        let start = Instant::now();
        match self.client.request(outgoing).await {
            Ok(upstream) => {
                metrics::record_upstream(start, false);
                if upstream.status() == StatusCode::SWITCHING_PROTOCOLS {
                    return match client_upgrade {
                        Some(client_upgrade) => relay_upgrade(backend, client_upgrade, upstream),
                        None => {
                            tracing::warn!(backend = %backend, "Backend switched protocols unasked");
                            response::bad_gateway()
                        }
                    };
                }
                let (mut parts, body) = upstream.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                metrics::record_upstream(start, true);
                tracing::error!(backend = %backend, error = %e, "Upstream request failed");
                response::bad_gateway()
            }
        }
    }
}

impl Default for ProxyDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// The `Upgrade` value of a request that asks to switch protocols.
///
/// Requires both an `Upgrade` header and an `upgrade` token in `Connection`.
pub fn upgrade_protocol(headers: &HeaderMap) -> Option<HeaderValue> {
    let asks_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    asks_upgrade
        .then(|| headers.get(header::UPGRADE).cloned())
        .flatten()
}

/// Answer the client with the backend's 101 and splice both connections
/// once each side has been handed over.
fn relay_upgrade(
    backend: &BackendDescriptor,
    client_upgrade: OnUpgrade,
    mut upstream: Response<Incoming>,
) -> Response {
    let backend_upgrade = hyper::upgrade::on(&mut upstream);
    let domain = backend.domain.clone();

    tokio::spawn(async move {
        let (client, backend_side) = match tokio::try_join!(client_upgrade, backend_upgrade) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(backend = %domain, error = %e, "Upgrade handover failed");
                return;
            }
        };

        let mut client = TokioIo::new(client);
        let mut backend_side = TokioIo::new(backend_side);
        match tokio::io::copy_bidirectional(&mut client, &mut backend_side).await {
            Ok((sent, received)) => {
                tracing::debug!(backend = %domain, sent, received, "Upgraded connection closed")
            }
            Err(e) => {
                tracing::debug!(backend = %domain, error = %e, "Upgraded connection closed with error")
            }
        }
    });

    let (parts, _) = upstream.into_parts();
    Response::from_parts(parts, Body::empty())
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
