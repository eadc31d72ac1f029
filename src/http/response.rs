//! Responses the edge answers by itself.
//!
//! # Design Decisions
//! - Unknown hosts get a fixed placeholder page with a 200
//! - Clients never see internal error detail

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

use crate::routing::RedirectTarget;

/// Body served for hosts with no backend.
pub const COMING_SOON: &str = "coming soon";

pub fn coming_soon() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        COMING_SOON,
    )
        .into_response()
}

/// 307 to the `https://` form of the request.
pub fn redirect_to_secure(target: &RedirectTarget) -> Response {
    Redirect::temporary(&target.location()).into_response()
}

pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "bad gateway").into_response()
}
