//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{kind} file not found: {path:?}")]
    Missing { kind: &'static str, path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no private key in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("certificate and key rejected: {0}")]
    Rejected(#[source] std::io::Error),
}

/// Load the listener's certificate chain and private key.
///
/// The PEM files are checked up front so a bad path or empty file is
/// reported by name rather than as a generic rustls error.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    check_chain(&tls.full_chain)?;
    check_key(&tls.private_key)?;

    let config = RustlsConfig::from_pem_file(&tls.full_chain, &tls.private_key)
        .await
        .map_err(TlsError::Rejected)?;

    tracing::info!(chain = ?tls.full_chain, "TLS certificates loaded");
    Ok(config)
}

fn open(kind: &'static str, path: &Path) -> Result<BufReader<File>, TlsError> {
    if !path.exists() {
        return Err(TlsError::Missing {
            kind,
            path: path.to_path_buf(),
        });
    }
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn check_chain(path: &Path) -> Result<(), TlsError> {
    let mut reader = open("certificate chain", path)?;
    let mut count = 0;
    for cert in rustls_pemfile::certs(&mut reader) {
        cert.map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }
    if count == 0 {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(())
}

fn check_key(path: &Path) -> Result<(), TlsError> {
    let mut reader = open("private key", path)?;
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TlsError::NoPrivateKey(path.to_path_buf())),
        Err(source) => Err(TlsError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_chain_is_reported() {
        let tls = TlsConfig {
            private_key: "/nonexistent/privkey.pem".into(),
            full_chain: "/nonexistent/fullchain.pem".into(),
        };
        let err = load_tls_config(&tls).await.err().unwrap();
        assert!(matches!(err, TlsError::Missing { kind: "certificate chain", .. }));
    }

    #[tokio::test]
    async fn non_pem_chain_has_no_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let chain = dir.path().join("fullchain.pem");
        let key = dir.path().join("privkey.pem");
        std::fs::write(&chain, "not a certificate\n").unwrap();
        std::fs::write(&key, "not a key\n").unwrap();

        let tls = TlsConfig {
            private_key: key,
            full_chain: chain,
        };
        let err = load_tls_config(&tls).await.err().unwrap();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }
}
