//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net)
//!     → server.rs (Axum app, middleware)
//!     → request.rs (host, request ID)
//!     → routing::Router::resolve
//!     → response.rs (placeholder page, secure redirect)
//!       or dispatch.rs (director, forwarding headers, backend client)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::ProxyDispatcher;
pub use request::X_REQUEST_ID;
pub use server::{build_app, AppState};
