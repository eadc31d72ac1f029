//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → ConfigStore → RoutingTable → Router
//!     → reload channel, watcher, signals → listeners
//!
//! Shutdown (shutdown.rs):
//!     Listener exit | SIGINT | SIGTERM → Shutdown::cancel → listeners stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//!     SIGHUP → Trigger routing table reload
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routing, then listeners
//! - Fail fast: any startup error is fatal
//! - Stop is immediate; in-flight requests are not drained

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
