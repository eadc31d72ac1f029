//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Keep the idle timeout in step with the read-header timeout
//! - Require exactly one backend descriptor source
//! - Keep the reload channel on loopback
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a non-zero port")]
    ZeroPort { field: &'static str },

    #[error("http_port and https_port must differ (both {0})")]
    PortClash(u16),

    #[error("exactly one of services.file, services.live_dir, services.entries must be set (found {0})")]
    ServiceSource(usize),

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("timeouts.idle_secs ({idle}) must equal timeouts.read_header_secs ({read_header}); HTTP/1 idle connections are bounded by the read-header timeout")]
    IdleMismatch { idle: u64, read_header: u64 },

    #[error("invalid {field} address {value:?}")]
    BadAddress { field: &'static str, value: String },

    #[error("reload.bind_address {0} is not a loopback address")]
    NotLoopback(SocketAddr),
}

/// Check a parsed configuration, collecting every violation.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.http_port == 0 {
        errors.push(ValidationError::ZeroPort { field: "listener.http_port" });
    }
    if listener.https_port == 0 {
        errors.push(ValidationError::ZeroPort { field: "listener.https_port" });
    }
    if listener.http_port != 0 && listener.http_port == listener.https_port {
        errors.push(ValidationError::PortClash(listener.http_port));
    }

    let services = &config.services;
    let sources = [
        services.file.is_some(),
        services.live_dir.is_some(),
        !services.entries.is_empty(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if sources != 1 {
        errors.push(ValidationError::ServiceSource(sources));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("read_header_secs", timeouts.read_header_secs),
        ("write_secs", timeouts.write_secs),
        ("idle_secs", timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }
    if timeouts.idle_secs != timeouts.read_header_secs {
        errors.push(ValidationError::IdleMismatch {
            idle: timeouts.idle_secs,
            read_header: timeouts.read_header_secs,
        });
    }

    match config.reload.bind_address.parse::<SocketAddr>() {
        Ok(addr) if !addr.ip().is_loopback() => errors.push(ValidationError::NotLoopback(addr)),
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::BadAddress {
            field: "reload.bind_address",
            value: config.reload.bind_address.clone(),
        }),
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.services.file = Some(PathBuf::from("prox.config"));
        config
    }

    #[test]
    fn defaults_with_one_source_pass() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn missing_source_rejected() {
        let errors = validate_config(&ProxyConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ServiceSource(0)]);
    }

    #[test]
    fn two_sources_rejected() {
        let mut config = valid();
        config.services.entries.push("8050:true:false:example.com".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ServiceSource(2)]);
    }

    #[test]
    fn collects_every_error() {
        let mut config = valid();
        config.listener.https_port = config.listener.http_port;
        config.timeouts.write_secs = 0;
        config.reload.bind_address = "0.0.0.0:9876".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::PortClash(8080)));
        assert!(errors.contains(&ValidationError::ZeroTimeout { field: "write_secs" }));
        assert!(matches!(errors[2], ValidationError::NotLoopback(_)));
    }

    #[test]
    fn idle_timeout_must_match_read_header() {
        let mut config = valid();
        config.timeouts.read_header_secs = 1;
        config.timeouts.idle_secs = 4;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::IdleMismatch { idle: 4, read_header: 1 }]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
