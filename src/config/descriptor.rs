//! Backend descriptors and their two on-disk formats.
//!
//! A flat line reads `port:tlsRequired:alertsEnabled:domain`. A descriptor
//! document (`service.toml` / `service.json`) carries the same four fields.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// File names probed in each live subdirectory, in order of preference.
pub const DESCRIPTOR_FILES: [&str; 2] = ["service.toml", "service.json"];

/// One deployed service the front door can route to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Canonical hostname this backend answers to.
    pub domain: String,

    /// Local port the backend listens on.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,

    /// Plain-channel clients are redirected to HTTPS.
    #[serde(default, alias = "tlsRequired")]
    pub tls_required: bool,

    /// Carried for an external alerting collaborator; routing ignores it.
    #[serde(default, alias = "alertsEnabled")]
    pub alerts_enabled: bool,
}

impl BackendDescriptor {
    /// Local authority of the backend, `localhost:<port>`.
    pub fn authority(&self) -> String {
        format!("localhost:{}", self.port)
    }

    /// `www.` alias inserted next to the canonical domain.
    pub fn alias(&self) -> String {
        format!("www.{}", self.domain)
    }

    fn validate(self) -> Result<Self, DescriptorError> {
        if self.domain.trim().is_empty() {
            return Err(DescriptorError::EmptyDomain);
        }
        if self.port == 0 {
            return Err(DescriptorError::InvalidPort("0".into()));
        }
        Ok(self)
    }
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.domain, self.authority())
    }
}

/// Why a single descriptor was rejected.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("expected 4 ':'-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("{field} must be `true` or `false`, got {value:?}")]
    InvalidFlag { field: &'static str, value: String },

    #[error("empty domain")]
    EmptyDomain,

    #[error("descriptor {path:?} unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("descriptor {path:?} malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Parse one flat `port:tlsRequired:alertsEnabled:domain` line.
pub fn parse_line(line: &str) -> Result<BackendDescriptor, DescriptorError> {
    let fields: Vec<&str> = line.trim().split(':').collect();
    let [port, tls, alerts, domain] = fields.as_slice() else {
        return Err(DescriptorError::FieldCount(fields.len()));
    };

    BackendDescriptor {
        domain: domain.to_string(),
        port: parse_port(port)?,
        tls_required: parse_flag("tlsRequired", tls)?,
        alerts_enabled: parse_flag("alertsEnabled", alerts)?,
    }
    .validate()
}

/// Whether a flat line carries no descriptor at all.
pub fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Read and parse a descriptor document; the format follows the extension.
pub fn read_document(path: &Path) -> Result<BackendDescriptor, DescriptorError> {
    let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |reason: String| DescriptorError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let descriptor: BackendDescriptor = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?,
        _ => toml::from_str(&content).map_err(|e| malformed(e.to_string()))?,
    };
    descriptor.validate()
}

fn parse_port(value: &str) -> Result<u16, DescriptorError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(DescriptorError::InvalidPort(value.to_string())),
    }
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, DescriptorError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DescriptorError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }

    let port = match Port::deserialize(deserializer)? {
        Port::Number(n) => u16::try_from(n).ok(),
        Port::Text(s) => s.trim().parse().ok(),
    };
    port.ok_or_else(|| serde::de::Error::custom("port must be a number between 1 and 65535"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_flat_line() {
        let d = parse_line("8050:true:false:example.com").unwrap();
        assert_eq!(d.domain, "example.com");
        assert_eq!(d.port, 8050);
        assert!(d.tls_required);
        assert!(!d.alerts_enabled);
        assert_eq!(d.authority(), "localhost:8050");
        assert_eq!(d.alias(), "www.example.com");
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(parse_line("8050:true:example.com"), Err(DescriptorError::FieldCount(3))));
        assert!(matches!(parse_line("http:true:false:a.com"), Err(DescriptorError::InvalidPort(_))));
        assert!(matches!(parse_line("0:true:false:a.com"), Err(DescriptorError::InvalidPort(_))));
        assert!(matches!(
            parse_line("8050:yes:false:a.com"),
            Err(DescriptorError::InvalidFlag { field: "tlsRequired", .. })
        ));
        assert!(matches!(parse_line("8050:true:false:"), Err(DescriptorError::EmptyDomain)));
    }

    #[test]
    fn comments_and_blanks_are_skippable() {
        assert!(is_skippable(""));
        assert!(is_skippable("   "));
        assert!(is_skippable("# retired: 8040:true:false:old.example"));
        assert!(!is_skippable("8050:true:false:example.com"));
    }

    #[test]
    fn reads_toml_and_json_documents() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("service.toml");
        fs::write(&toml_path, "domain = \"blog.example\"\nport = 8060\ntls_required = true\n").unwrap();
        let d = read_document(&toml_path).unwrap();
        assert_eq!(d.port, 8060);
        assert!(d.tls_required);
        assert!(!d.alerts_enabled);

        let json_path = dir.path().join("service.json");
        fs::write(
            &json_path,
            r#"{"domain":"shop.example","port":"8070","tlsRequired":false,"alertsEnabled":true}"#,
        )
        .unwrap();
        let d = read_document(&json_path).unwrap();
        assert_eq!(d.port, 8070);
        assert!(d.alerts_enabled);
    }

    #[test]
    fn document_port_out_of_range_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.json");
        fs::write(&path, r#"{"domain":"a.example","port":70000}"#).unwrap();
        assert!(matches!(read_document(&path), Err(DescriptorError::Malformed { .. })));
    }
}
