//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the front door.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen ports for plain and TLS traffic.
    pub listener: ListenerConfig,

    /// Certificate files for the TLS listener.
    pub tls: TlsConfig,

    /// Where backend descriptors come from.
    pub services: ServicesConfig,

    /// Per-connection timeouts, shared by both listeners.
    pub timeouts: TimeoutConfig,

    /// Reload control surface.
    pub reload: ReloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port receiving plain HTTP traffic.
    pub http_port: u16,

    /// Port receiving HTTPS traffic.
    pub https_port: u16,

    /// Address both listeners bind on.
    pub bind_ip: IpAddr,
}

impl ListenerConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.http_port)
    }

    pub fn https_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.https_port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        // Unprivileged ports; 80/443 are expected to be NATed onto these.
        Self {
            http_port: 8080,
            https_port: 8443,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

/// TLS certificate references for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to the private key file (PEM).
    pub private_key: PathBuf,

    /// Path to the full certificate chain (PEM).
    pub full_chain: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            private_key: PathBuf::from("tlsCerts/privkey.pem"),
            full_chain: PathBuf::from("tlsCerts/fullchain.pem"),
        }
    }
}

/// Backend descriptor sources. Exactly one must be set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServicesConfig {
    /// Flat file with one `port:tlsRequired:alertsEnabled:domain` line per backend.
    pub file: Option<PathBuf>,

    /// Directory whose subdirectories each hold one descriptor document.
    pub live_dir: Option<PathBuf>,

    /// Inline flat lines, same format as `file`.
    pub entries: Vec<String>,
}

/// Timeout configuration applied to every accepted connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to receive request headers, in seconds. On HTTP/1 this
    /// also bounds an idle keep-alive connection waiting for its next request.
    pub read_header_secs: u64,

    /// Time allowed to produce the response head, in seconds.
    pub write_secs: u64,

    /// Idle keep-alive timeout, in seconds. Drives HTTP/2 keep-alive pings;
    /// must equal `read_header_secs`.
    pub idle_secs: u64,
}

impl TimeoutConfig {
    pub fn read_header(&self) -> Duration {
        Duration::from_secs(self.read_header_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_header_secs: 5,
            write_secs: 10,
            idle_secs: 5,
        }
    }
}

/// Reload channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Loopback address the reload datagram socket binds to.
    pub bind_address: String,

    /// Also reload when the service source changes on disk.
    pub watch: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9876".to_string(),
            watch: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Append logs to this file instead of stdout.
    pub log_file: Option<PathBuf>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            log_file: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
