//! Loopback datagram socket that triggers reloads.
//!
//! Any local process may send the token; binding to loopback is the only
//! access control. Nothing is ever sent back.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::lifecycle::Shutdown;
use crate::reload::{ReloadTrigger, Reloader};

/// The only command the channel understands.
pub const RELOAD_TOKEN: &[u8] = b"reload";

const MAX_DATAGRAM: usize = 512;

/// Whether a datagram payload is the reload command.
///
/// Surrounding ASCII whitespace is ignored so `echo reload | nc -u` works.
pub fn is_reload_command(payload: &[u8]) -> bool {
    payload.trim_ascii() == RELOAD_TOKEN
}

/// Control surface for routing table refreshes.
pub struct ReloadChannel {
    socket: UdpSocket,
    reloader: Reloader,
}

impl ReloadChannel {
    /// Bind the control socket. Non-loopback addresses are refused.
    pub async fn bind(addr: SocketAddr, reloader: Reloader) -> io::Result<Self> {
        if !addr.ip().is_loopback() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("reload channel must bind to loopback, got {addr}"),
            ));
        }

        let socket = UdpSocket::bind(addr).await?;
        tracing::info!(address = %socket.local_addr()?, "Reload channel bound");
        Ok(Self { socket, reloader })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve datagrams until shutdown.
    pub async fn run(self, shutdown: Shutdown) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            tokio::select! {
                _ = shutdown.done() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        if is_reload_command(&buf[..len]) {
                            tracing::info!(%peer, "Reload requested");
                            let _ = self.reloader.reload(ReloadTrigger::Datagram).await;
                        } else {
                            tracing::warn!(%peer, len, "Ignoring unknown control datagram");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Reload channel receive failed"),
                }
            }
        }
        tracing::debug!("Reload channel stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, ServiceSource};
    use crate::routing::{Router, RoutingTable};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn recognises_token() {
        assert!(is_reload_command(b"reload"));
        assert!(is_reload_command(b"reload\n"));
        assert!(is_reload_command(b"  reload\r\n"));
        assert!(!is_reload_command(b"RELOAD"));
        assert!(!is_reload_command(b"reload now"));
        assert!(!is_reload_command(b""));
    }

    fn reloader(lines: Vec<String>) -> (Reloader, Arc<Router>) {
        let store = Arc::new(ConfigStore::new(ServiceSource::Inline(lines)));
        let router = Arc::new(Router::new(RoutingTable::empty()));
        (Reloader::new(store, router.clone()), router)
    }

    #[tokio::test]
    async fn refuses_non_loopback() {
        let (reloader, _) = reloader(vec![]);
        let err = ReloadChannel::bind("0.0.0.0:0".parse().unwrap(), reloader).await.err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn datagram_triggers_reload() {
        let (reloader, router) = reloader(vec!["8050:true:false:example.com".into()]);
        let channel = ReloadChannel::bind("127.0.0.1:0".parse().unwrap(), reloader).await.unwrap();
        let addr = channel.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let task = tokio::spawn(channel.run(shutdown.clone()));

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"status", addr).await.unwrap();
        client.send_to(RELOAD_TOKEN, addr).await.unwrap();

        for _ in 0..50 {
            if router.generation() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(router.generation(), 1);
        assert!(router.snapshot().lookup("www.example.com").is_some());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
