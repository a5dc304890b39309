//! WebSocket handshake, idle tracking, the echo session and payload diagnostics.

pub mod diagnostic;
pub mod handshake;
pub mod keepalive;
pub mod session;
