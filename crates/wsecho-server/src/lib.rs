//! # wsecho-server
//!
//! TCP listener and WebSocket echo sessions.
//!
//! - [`listener`]: acceptor setup (address reuse, backlog)
//! - [`server`]: the accept loop, spawning one task per connection
//! - [`websocket`]: handshake policy, idle/keep-alive tracking, the echo loop
//!   and payload diagnostics
//! - [`shutdown`]: graceful shutdown via `CancellationToken`
//! - [`metrics`]: metric names and the Prometheus recorder

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod listener;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::{ServerConfig, SessionConfig};
pub use errors::{BindError, SessionError};
pub use server::EchoServer;
pub use websocket::session::SessionEnd;
