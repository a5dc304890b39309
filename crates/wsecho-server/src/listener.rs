//! Listening socket setup.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket};
use tracing::debug;

use crate::errors::BindError;

/// Open a TCP listener on `addr` with `SO_REUSEADDR` and the given backlog.
///
/// Must be called from within a Tokio runtime.
pub fn bind(addr: SocketAddr, backlog: u32) -> Result<TcpListener, BindError> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(|source| BindError::Open { addr, source })?;

    socket
        .set_reuseaddr(true)
        .map_err(|source| BindError::ReuseAddress { addr, source })?;

    socket
        .bind(addr)
        .map_err(|source| BindError::Bind { addr, source })?;

    let listener = socket
        .listen(backlog)
        .map_err(|source| BindError::Listen { addr, source })?;

    debug!(%addr, backlog, "listening socket ready");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind(loopback(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn accepts_a_connection() {
        let listener = bind(loopback(), 16).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move { tokio::net::TcpStream::connect(addr).await });
        let (_stream, peer) = listener.accept().await.unwrap();
        let client = client.await.unwrap().unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn reuse_address_is_enabled() {
        // Reuse lets a new listener take a port whose previous owner is gone,
        // even while accepted connections linger in TIME_WAIT.
        let first = bind(loopback(), 16).unwrap();
        let addr = first.local_addr().unwrap();
        let connect = tokio::spawn(async move { tokio::net::TcpStream::connect(addr).await });
        let (accepted, _) = first.accept().await.unwrap();
        drop(connect.await.unwrap().unwrap());
        drop(accepted);
        drop(first);

        let second = bind(addr, 16).unwrap();
        assert_eq!(second.local_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn port_held_by_another_listener_fails_with_bind_error() {
        let holder = bind(loopback(), 16).unwrap();
        let addr = holder.local_addr().unwrap();

        let err = bind(addr, 16).unwrap_err();
        assert_matches!(err, BindError::Bind { addr: a, .. } if a == addr);
    }

    #[tokio::test]
    async fn ipv6_loopback_when_available() {
        let addr: SocketAddr = "[::1]:0".parse().unwrap();
        // Some CI sandboxes have no IPv6 stack; only assert on success.
        if let Ok(listener) = bind(addr, 16) {
            assert!(listener.local_addr().unwrap().is_ipv6());
        }
    }
}
