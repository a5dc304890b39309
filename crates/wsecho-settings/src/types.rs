//! Settings types.
//!
//! Every struct uses `#[serde(default)]` so a partial settings file only
//! needs to name the values it changes.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wsecho_core::LogFormat;

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EchoSettings {
    /// Listener and runtime settings.
    pub server: ServerSettings,
    /// Per-connection session settings.
    pub session: SessionSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

impl EchoSettings {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.worker_threads == 0 {
            return Err(SettingsError::InvalidValue(
                "server.workerThreads must be at least 1".into(),
            ));
        }
        if self.server.backlog == 0 {
            return Err(SettingsError::InvalidValue(
                "server.backlog must be at least 1".into(),
            ));
        }
        if self.session.handshake_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "session.handshakeTimeoutMs must be positive".into(),
            ));
        }
        if self.session.idle_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "session.idleTimeoutMs must be positive".into(),
            ));
        }
        if self.session.max_message_size == 0 {
            return Err(SettingsError::InvalidValue(
                "session.maxMessageSize must be positive".into(),
            ));
        }
        let _ = self.server.bind_addr()?;
        Ok(())
    }
}

/// Listener and runtime settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address (`0.0.0.0` listens on all IPv4 interfaces).
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Pending-connection queue length passed to `listen(2)`.
    pub backlog: u32,
    /// Number of I/O worker threads in the runtime.
    pub worker_threads: usize,
    /// Disable Nagle's algorithm on accepted sockets.
    pub tcp_nodelay: bool,
    /// How long shutdown waits for open sessions to finish, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl ServerSettings {
    /// Resolve `host` and `port` into a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            SettingsError::InvalidValue(format!("server.host is not an IP address: {}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 81,
            backlog: max_listen_backlog(),
            worker_threads: 1,
            tcp_nodelay: true,
            shutdown_timeout_ms: 10_000,
        }
    }
}

/// The platform's maximum listen backlog.
#[cfg(unix)]
pub fn max_listen_backlog() -> u32 {
    libc::SOMAXCONN as u32
}

/// The platform's maximum listen backlog.
#[cfg(not(unix))]
pub fn max_listen_backlog() -> u32 {
    i32::MAX as u32
}

/// Per-connection session settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Upper bound on the WebSocket upgrade exchange, in milliseconds.
    pub handshake_timeout_ms: u64,
    /// Inactivity window before an open session is dropped, in milliseconds.
    pub idle_timeout_ms: u64,
    /// Probe quiet peers with a Ping halfway through the idle window.
    pub keep_alive_pings: bool,
    /// Largest accepted message (and frame) in bytes.
    pub max_message_size: usize,
    /// Print decoded JSON payloads to stdout.
    pub diagnostics: bool,
}

impl SessionSettings {
    /// Handshake timeout as a [`Duration`].
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 30_000,
            idle_timeout_ms: 300_000,
            keep_alive_pings: true,
            max_message_size: 16 * 1024 * 1024, // 16 MB
            diagnostics: true,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
