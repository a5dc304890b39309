//! Idle detection with optional keep-alive pings.
//!
//! With pings enabled the idle window is split in two halves: after the
//! first quiet half the session sends a Ping, and if the second half also
//! passes without any inbound frame the session expires. Any inbound frame
//! (data, ping, pong or close) starts a fresh window.

use std::time::Duration;

/// What the session should do when a wait period elapses with no traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    /// Probe the peer and keep waiting.
    SendPing,
    /// The peer is considered gone.
    Expire,
}

/// Tracks inbound silence for one session.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    timeout: Duration,
    keep_alive: bool,
    ping_outstanding: bool,
}

impl IdleTracker {
    /// Create a tracker for the given idle window.
    pub fn new(timeout: Duration, keep_alive: bool) -> Self {
        Self {
            timeout,
            keep_alive,
            ping_outstanding: false,
        }
    }

    /// The full idle window.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How long to wait for the next inbound frame.
    pub fn wait(&self) -> Duration {
        if self.keep_alive {
            self.timeout / 2
        } else {
            self.timeout
        }
    }

    /// Record inbound traffic.
    pub fn on_activity(&mut self) {
        self.ping_outstanding = false;
    }

    /// Decide what to do after [`wait`](Self::wait) elapsed without traffic.
    pub fn on_elapsed(&mut self) -> IdleAction {
        if self.keep_alive && !self.ping_outstanding {
            self.ping_outstanding = true;
            IdleAction::SendPing
        } else {
            IdleAction::Expire
        }
    }
}
