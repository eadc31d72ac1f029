//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor.rs
//!     → listener.rs (plain listener, fixed timeouts)
//!     → tls.rs + listener.rs (TLS listener, same timeouts)
//!     → Hand off to the HTTP layer, one task per connection
//!
//! Either listener exiting fires the shared Shutdown,
//! which stops the other one.
//! ```
//!
//! # Design Decisions
//! - Both listeners are mandatory; there is no single-listener mode
//! - Stop is immediate; in-flight requests are not drained

pub mod listener;
pub mod supervisor;
pub mod tls;

pub use listener::ListenerError;
pub use supervisor::ListenerSupervisor;
