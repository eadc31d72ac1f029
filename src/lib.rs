//! Host-based TLS-terminating front door.
//!
//! Accepts HTTP and HTTPS on two ports, routes on the `Host` header to
//! backends on local ports, and reloads its routing table without
//! restarting listeners.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod reload;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use lifecycle::Shutdown;
pub use routing::{Channel, Decision, Router, RoutingTable};
