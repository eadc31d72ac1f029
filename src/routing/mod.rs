//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, channel)
//!     → router.rs (atomic snapshot load)
//!     → table.rs (exact host lookup, www. aliases included)
//!     → Return: Forward(backend) | RedirectToSecure | NotFound
//!
//! Table Construction (startup and every reload):
//!     BackendDescriptor[]
//!     → RoutingTable::from_descriptors
//!     → Router::publish (single pointer swap)
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; reload replaces, never patches
//! - Host matching is exact and case-sensitive, as received
//! - Deterministic: same snapshot and input always give the same decision

pub mod router;
pub mod table;

pub use router::{Channel, Decision, RedirectTarget, Router};
pub use table::RoutingTable;
