//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + FRONTDOOR_* environment
//!     → loader.rs (parse, overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! service source (flat file | inline lines | live directory)
//!     → descriptor.rs (one BackendDescriptor per line/document)
//!     → store.rs (skip bad entries, build RoutingTable)
//!
//! On reload trigger:
//!     store.rs re-reads the source
//!     → brand-new RoutingTable
//!     → published by the reload subsystem
//! ```
//!
//! # Design Decisions
//! - Config is read once; only the routing table reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod descriptor;
pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use descriptor::BackendDescriptor;
pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ProxyConfig, ServicesConfig, TimeoutConfig, TlsConfig};
pub use store::{ConfigStore, ServiceSource, SourceError};
