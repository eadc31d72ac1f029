//! Hostname to backend lookup table.
//!
//! # Responsibilities
//! - Map every canonical domain and its `www.` alias to one shared descriptor
//! - Answer exact, case-sensitive host lookups
//!
//! # Design Decisions
//! - Immutable after construction; a reload builds a new table
//! - Descriptors are held in `Arc` so the domain and its alias point at the
//!   same instance
//! - A canonical domain always wins over another backend's `www.` alias

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::descriptor::BackendDescriptor;

/// Immutable routing snapshot.
#[derive(Debug, Default)]
pub struct RoutingTable {
    entries: HashMap<String, Arc<BackendDescriptor>>,
    backends: Vec<Arc<BackendDescriptor>>,
}

impl RoutingTable {
    /// A table that routes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from parsed descriptors. Later descriptors replace earlier
    /// ones with the same domain.
    pub fn from_descriptors<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = BackendDescriptor>,
    {
        let mut canonical: HashMap<String, Arc<BackendDescriptor>> = HashMap::new();
        let mut backends: Vec<Arc<BackendDescriptor>> = Vec::new();

        for descriptor in descriptors {
            let descriptor = Arc::new(descriptor);
            if let Some(previous) = canonical.insert(descriptor.domain.clone(), descriptor.clone()) {
                tracing::warn!(
                    domain = %descriptor.domain,
                    previous_port = previous.port,
                    port = descriptor.port,
                    "Duplicate domain, later descriptor wins"
                );
                backends.retain(|b| !Arc::ptr_eq(b, &previous));
            }
            backends.push(descriptor);
        }

        let mut entries = HashMap::with_capacity(canonical.len() * 2);
        for backend in &backends {
            entries.insert(backend.alias(), backend.clone());
        }
        for backend in &backends {
            if let Some(shadowed) = entries.insert(backend.domain.clone(), backend.clone()) {
                if !Arc::ptr_eq(&shadowed, backend) {
                    tracing::warn!(
                        host = %backend.domain,
                        alias_of = %shadowed.domain,
                        "Canonical domain shadows a www alias"
                    );
                }
            }
        }

        Self { entries, backends }
    }

    /// Exact lookup of a host as received.
    pub fn lookup(&self, host: &str) -> Option<&Arc<BackendDescriptor>> {
        self.entries.get(host)
    }

    /// Number of routable host keys, aliases included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical backends in load order.
    pub fn backends(&self) -> &[Arc<BackendDescriptor>] {
        &self.backends
    }

    /// Every routable host key, sorted.
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(domain: &str, port: u16, tls: bool) -> BackendDescriptor {
        BackendDescriptor {
            domain: domain.into(),
            port,
            tls_required: tls,
            alerts_enabled: false,
        }
    }

    #[test]
    fn domain_and_alias_share_one_instance() {
        let table = RoutingTable::from_descriptors([
            backend("example.com", 8050, true),
            backend("blog.example", 8060, false),
        ]);

        assert_eq!(table.len(), 4);
        for b in table.backends() {
            let canonical = table.lookup(&b.domain).unwrap();
            let alias = table.lookup(&b.alias()).unwrap();
            assert!(Arc::ptr_eq(canonical, alias));
        }
        assert_eq!(table.lookup("www.example.com").unwrap().port, 8050);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let table = RoutingTable::from_descriptors([backend("example.com", 8050, true)]);
        assert!(table.lookup("EXAMPLE.COM").is_none());
        assert!(table.lookup("example.com:8080").is_none());
        assert!(table.lookup("api.example.com").is_none());
    }

    #[test]
    fn later_duplicate_wins() {
        let table = RoutingTable::from_descriptors([
            backend("example.com", 8050, true),
            backend("example.com", 9050, false),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.backends().len(), 1);
        assert_eq!(table.lookup("example.com").unwrap().port, 9050);
        assert_eq!(table.lookup("www.example.com").unwrap().port, 9050);
    }

    #[test]
    fn canonical_beats_foreign_alias() {
        let table = RoutingTable::from_descriptors([
            backend("www.example.com", 8070, false),
            backend("example.com", 8050, true),
        ]);
        assert_eq!(table.lookup("www.example.com").unwrap().port, 8070);
        assert_eq!(table.lookup("www.www.example.com").unwrap().port, 8070);
        assert_eq!(table.lookup("example.com").unwrap().port, 8050);
    }

    #[test]
    fn hosts_are_sorted() {
        let table = RoutingTable::from_descriptors([backend("b.example", 1, false), backend("a.example", 2, false)]);
        assert_eq!(table.hosts(), vec!["a.example", "b.example", "www.a.example", "www.b.example"]);
    }
}
