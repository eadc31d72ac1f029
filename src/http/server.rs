//! HTTP application setup.
//!
//! # Responsibilities
//! - Create the Axum Router each listener serves
//! - Wire up middleware (tracing, write timeout, request ID)
//! - Resolve every request against the current routing snapshot
//! - Answer locally or hand off to the dispatcher
//!
//! Both listeners run the same application; only the `Channel` differs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::TimeoutConfig;
use crate::http::dispatch::ProxyDispatcher;
use crate::http::request::{request_host, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{Channel, Decision, Router as ProxyRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub dispatcher: ProxyDispatcher,
    pub channel: Channel,
}

/// Build the Axum application for one listener.
///
/// Every request target, `*` and absolute forms included, reaches the
/// entry point. A backend that has not produced a response head within the
/// write timeout is answered with 504.
pub fn build_app(state: AppState, timeouts: &TimeoutConfig) -> Router {
    Router::new()
        .fallback(entry_point)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            timeouts.write(),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

/// Route one request: placeholder, redirect, or forward.
async fn entry_point(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let host = request_host(&request).unwrap_or_default().to_owned();
    let decision = state.router.resolve(&host, request.uri(), state.channel);

    metrics::record_decision(state.channel.as_str(), decision.label());
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::debug!(
        request_id,
        peer = %peer,
        host = %host,
        listener = %state.channel,
        uri = %request.uri(),
        decision = decision.label(),
        "Routing request"
    );

    match decision {
        Decision::NotFound => response::coming_soon(),
        Decision::RedirectToSecure(target) => response::redirect_to_secure(&target),
        Decision::Forward(backend) => state.dispatcher.dispatch(&backend, peer, request).await,
    }
}
