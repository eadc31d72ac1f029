//! Route lookup and dispatch decision.
//!
//! # Responsibilities
//! - Hold the current routing snapshot behind an atomic pointer
//! - Resolve (host, channel) into forward, redirect or not-found
//! - Publish replacement snapshots on reload
//!
//! # Design Decisions
//! - Lookups never lock: one `ArcSwap` load per request
//! - A lookup keeps its snapshot alive until it finishes, so a concurrent
//!   publish is never observed half-way
//! - Secure-channel requests are always forwarded, which keeps redirects
//!   loop-free

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Uri;

use crate::config::descriptor::BackendDescriptor;
use crate::routing::table::RoutingTable;

/// Which listener a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Plain,
    Secure,
}

impl Channel {
    pub fn is_secure(self) -> bool {
        matches!(self, Channel::Secure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Plain => "http",
            Channel::Secure => "https",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `https://` equivalent of a plain request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub host: String,
    pub path: String,
    pub query: Option<String>,
}

impl RedirectTarget {
    /// Value for the `Location` header. Path and query are kept verbatim.
    pub fn location(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => {
                format!("https://{}{}?{}", self.host, self.path, query)
            }
            _ => format!("https://{}{}", self.host, self.path),
        }
    }
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NotFound,
    Forward(Arc<BackendDescriptor>),
    RedirectToSecure(RedirectTarget),
}

impl Decision {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::NotFound => "not_found",
            Decision::Forward(_) => "forward",
            Decision::RedirectToSecure(_) => "redirect",
        }
    }
}

/// Routes requests against the current snapshot.
#[derive(Debug)]
pub struct Router {
    table: ArcSwap<RoutingTable>,
    generation: AtomicU64,
}

impl Router {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            generation: AtomicU64::new(0),
        }
    }

    /// Decide what to do with a request for `host` received on `channel`.
    pub fn resolve(&self, host: &str, uri: &Uri, channel: Channel) -> Decision {
        let table = self.table.load();
        let Some(backend) = table.lookup(host) else {
            return Decision::NotFound;
        };

        if backend.tls_required && !channel.is_secure() {
            return Decision::RedirectToSecure(RedirectTarget {
                host: host.to_string(),
                path: uri.path().to_string(),
                query: uri.query().map(str::to_string),
            });
        }

        Decision::Forward(backend.clone())
    }

    /// The snapshot a lookup starting now would see.
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }

    /// Atomically replace the routing snapshot; returns the new generation.
    pub fn publish(&self, table: RoutingTable) -> u64 {
        let hosts = table.len();
        self.table.store(Arc::new(table));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(generation, hosts, "Routing table published");
        generation
    }

    /// Number of snapshots published since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(domain: &str, port: u16, tls_required: bool) -> BackendDescriptor {
        BackendDescriptor {
            domain: domain.into(),
            port,
            tls_required,
            alerts_enabled: false,
        }
    }

    fn router() -> Router {
        Router::new(RoutingTable::from_descriptors([
            descriptor("example.com", 8050, true),
            descriptor("plain.example", 8060, false),
        ]))
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn unknown_host_is_not_found_on_both_channels() {
        let router = router();
        for channel in [Channel::Plain, Channel::Secure] {
            assert_eq!(router.resolve("unknown.tld", &uri("/"), channel), Decision::NotFound);
        }
    }

    #[test]
    fn plain_request_to_tls_host_redirects_preserving_query() {
        let decision = router().resolve("example.com", &uri("/foo?x=1&y=%20"), Channel::Plain);
        match decision {
            Decision::RedirectToSecure(target) => {
                assert_eq!(target.location(), "https://example.com/foo?x=1&y=%20");
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn redirect_without_query_has_no_question_mark() {
        let decision = router().resolve("www.example.com", &uri("/"), Channel::Plain);
        let Decision::RedirectToSecure(target) = decision else {
            panic!("expected redirect");
        };
        assert_eq!(target.location(), "https://www.example.com/");
    }

    #[test]
    fn secure_channel_never_redirects() {
        let router = router();
        for host in ["example.com", "www.example.com", "plain.example", "www.plain.example"] {
            let decision = router.resolve(host, &uri("/foo"), Channel::Secure);
            assert!(matches!(decision, Decision::Forward(_)), "{host}: {decision:?}");
        }
    }

    #[test]
    fn plain_channel_forwards_non_tls_host() {
        let decision = router().resolve("plain.example", &uri("/"), Channel::Plain);
        let Decision::Forward(backend) = decision else {
            panic!("expected forward");
        };
        assert_eq!(backend.port, 8060);
    }

    #[test]
    fn publish_swaps_snapshot() {
        let router = router();
        let before = router.snapshot();

        let generation = router.publish(RoutingTable::from_descriptors([descriptor("new.example", 9000, false)]));

        assert_eq!(generation, 1);
        assert_eq!(router.generation(), 1);
        assert_eq!(router.resolve("example.com", &uri("/"), Channel::Secure), Decision::NotFound);
        assert!(matches!(router.resolve("new.example", &uri("/"), Channel::Plain), Decision::Forward(_)));
        // A snapshot taken before the publish still answers consistently.
        assert!(before.lookup("example.com").is_some());
        assert!(before.lookup("new.example").is_none());
    }

    #[test]
    fn concurrent_lookups_see_whole_tables() {
        let router = Arc::new(Router::new(RoutingTable::from_descriptors([
            descriptor("a.example", 1000, false),
            descriptor("b.example", 1000, false),
        ])));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let router = router.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let table = router.snapshot();
                        let a = table.lookup("a.example").map(|b| b.port);
                        let b = table.lookup("b.example").map(|b| b.port);
                        assert_eq!(a, b, "mixed snapshot observed");
                    }
                })
            })
            .collect();

        for round in 0..200u16 {
            let port = 2000 + round;
            router.publish(RoutingTable::from_descriptors([
                descriptor("a.example", port, false),
                descriptor("b.example", port, false),
            ]));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
