//! Request inspection and identification.
//!
//! # Responsibilities
//! - Extract the routing key (host) from a request
//! - Generate a request ID when the client sent none
//!
//! # Design Decisions
//! - Host is taken verbatim from the `Host` header, port suffix included
//! - HTTP/2 requests without `Host` fall back to the URI authority
//! - Request ID added as early as possible for tracing and forwarded to backends

use axum::http::{header, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The host a request asked for, as received.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .filter(|host| !host.is_empty())
}

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_header_taken_verbatim() {
        let request = Request::builder()
            .uri("/foo")
            .header("Host", "Example.com:8080")
            .body(())
            .unwrap();
        assert_eq!(request_host(&request), Some("Example.com:8080"));
    }

    #[test]
    fn falls_back_to_authority() {
        let request = Request::builder()
            .uri("https://example.com/foo")
            .body(())
            .unwrap();
        assert_eq!(request_host(&request), Some("example.com"));
    }

    #[test]
    fn no_host_at_all() {
        let request = Request::builder().uri("/foo").body(()).unwrap();
        assert_eq!(request_host(&request), None);
    }

    #[test]
    fn request_ids_are_unique() {
        let request = Request::builder().body(()).unwrap();
        let mut make = MakeRequestUuid;
        let a = make.make_request_id(&request).unwrap();
        let b = make.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
