//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout or an append-only log file
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging; JSON available for machine parsing
//! - Request ID flows from the edge to every backend
//! - Metrics are cheap (no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;
