//! Runtime configuration for the listener and its sessions.

use std::net::SocketAddr;
use std::time::Duration;

use wsecho_settings::{EchoSettings, SessionSettings};

/// Configuration for [`EchoServer`](crate::server::EchoServer).
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: SocketAddr,
    /// Listen backlog.
    pub backlog: u32,
    /// Set `TCP_NODELAY` on accepted sockets.
    pub tcp_nodelay: bool,
    /// Per-session settings shared by every connection.
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &EchoSettings) -> wsecho_settings::Result<Self> {
        Ok(Self {
            bind_addr: settings.server.bind_addr()?,
            backlog: settings.server.backlog,
            tcp_nodelay: settings.server.tcp_nodelay,
            session: SessionConfig::from(&settings.session),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 81)),
            backlog: wsecho_settings::max_listen_backlog(),
            tcp_nodelay: true,
            session: SessionConfig::default(),
        }
    }
}

/// Settings applied to each accepted connection.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Upper bound on the upgrade exchange.
    pub handshake_timeout: Duration,
    /// Inactivity window for reads and writes.
    pub idle_timeout: Duration,
    /// Ping quiet peers halfway through the idle window.
    pub keep_alive_pings: bool,
    /// Largest accepted message and frame, in bytes.
    pub max_message_size: usize,
    /// Print decoded JSON payloads to stdout.
    pub diagnostics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for SessionConfig {
    fn from(s: &SessionSettings) -> Self {
        Self {
            handshake_timeout: s.handshake_timeout(),
            idle_timeout: s.idle_timeout(),
            keep_alive_pings: s.keep_alive_pings,
            max_message_size: s.max_message_size,
            diagnostics: s.diagnostics,
        }
    }
}
