//! `EchoServer`: accept loop spawning one session task per connection.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span};

use crate::config::{ServerConfig, SessionConfig};
use crate::errors::BindError;
use crate::listener;
use crate::metrics::WS_ACCEPT_ERRORS_TOTAL;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::run_session;

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// The echo server.
pub struct EchoServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    session: Arc<SessionConfig>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl EchoServer {
    /// Open the listening socket. Nothing is accepted until [`run`](Self::run).
    pub fn bind(config: ServerConfig) -> Result<Self, BindError> {
        let listener = listener::bind(config.bind_addr, config.backlog)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BindError::Listen {
                addr: config.bind_addr,
                source,
            })?;
        Ok(Self {
            listener,
            local_addr,
            session: Arc::new(config.session.clone()),
            config,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        })
    }

    /// Address the listener is bound to (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections until shutdown is requested.
    ///
    /// Each connection runs on its own task tracked by the shutdown
    /// coordinator; a failing session never affects the loop or its
    /// siblings.
    pub async fn run(self) {
        let token = self.shutdown.token();
        info!(addr = %self.local_addr, "accepting connections");

        loop {
            let accepted = tokio::select! {
                () = token.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    if self.config.tcp_nodelay {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(%peer, error = %e, "set_nodelay failed");
                        }
                    }
                    let _handle = self.shutdown.tracker().spawn(run_session(
                        stream,
                        peer,
                        Arc::clone(&self.session),
                        token.clone(),
                    ));
                }
                Err(e) => {
                    counter!(WS_ACCEPT_ERRORS_TOTAL).increment(1);
                    error!(error = %e, kind = ?e.kind(), "accept failed");
                    if is_fatal(&e) {
                        break;
                    }
                    tokio::select! {
                        () = token.cancelled() => break,
                        () = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!(addr = %self.local_addr, "accept loop stopped");
    }

    /// Run the accept loop on a background task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let span = info_span!("listener", addr = %self.local_addr);
        tokio::spawn(self.run().instrument(span))
    }
}

/// Errors meaning the listening socket itself is unusable.
fn is_fatal(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::InvalidInput | io::ErrorKind::NotConnected)
}
