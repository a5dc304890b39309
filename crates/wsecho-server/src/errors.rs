//! Listener and session error types.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure while setting up the listening socket.
///
/// One variant per acceptor setup stage. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum BindError {
    /// Creating the socket failed.
    #[error("open {addr}: {source}")]
    Open {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Enabling `SO_REUSEADDR` failed.
    #[error("set_option reuse_address on {addr}: {source}")]
    ReuseAddress {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Binding the address failed (typically already in use).
    #[error("bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Switching the socket to listening mode failed.
    #[error("listen {addr}: {source}")]
    Listen {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Reasons a session ends abnormally.
///
/// A clean close by the peer is not an error; see
/// [`SessionEnd`](crate::websocket::session::SessionEnd).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The WebSocket upgrade was rejected or failed.
    #[error("accept: {0}")]
    Handshake(#[source] tungstenite::Error),
    /// The peer did not complete the upgrade in time.
    #[error("accept: handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
    /// Reading a frame failed.
    #[error("read: {0}")]
    Read(#[source] tungstenite::Error),
    /// Writing a frame failed.
    #[error("write: {0}")]
    Write(#[source] tungstenite::Error),
    /// No inbound traffic within the idle window.
    #[error("read: idle for {0:?}")]
    IdleTimeout(Duration),
    /// A write did not complete within the idle window.
    #[error("write: timed out after {0:?}")]
    WriteTimeout(Duration),
}

impl SessionError {
    /// Short label used for the `reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Handshake(_) => "handshake",
            Self::HandshakeTimeout(_) => "handshake_timeout",
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::IdleTimeout(_) => "idle_timeout",
            Self::WriteTimeout(_) => "write_timeout",
        }
    }

    /// Whether the session failed before the upgrade completed.
    pub fn is_handshake(&self) -> bool {
        matches!(self, Self::Handshake(_) | Self::HandshakeTimeout(_))
    }
}
