//! One echo session: upgrade, then read a message and write it back until
//! the peer closes, the session goes idle, or the server shuts down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::diagnostic;
use super::handshake;
use super::keepalive::{IdleAction, IdleTracker};
use crate::config::SessionConfig;
use crate::errors::SessionError;
use crate::metrics::{
    WS_BYTES_ECHOED_TOTAL, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_FRAMES_ECHOED_TOTAL,
    WS_HANDSHAKE_FAILURES_TOTAL, WS_SESSION_DURATION_SECONDS, WS_SESSION_ERRORS_TOTAL,
};

/// How long a shutdown close waits for the peer's close reply.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// How a session ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer completed the close handshake or hung up after it.
    ClosedByPeer,
    /// The server is shutting down and closed the session with 1001.
    ShutDown,
}

/// Run a session on an accepted stream and report how it ended.
///
/// Logs, metrics and the session span are handled here; the echo protocol
/// itself lives in [`serve`].
#[instrument(name = "session", skip_all, fields(session_id = %Uuid::now_v7(), %peer))]
pub async fn run_session<S>(
    stream: S,
    peer: SocketAddr,
    config: Arc<SessionConfig>,
    shutdown: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    match serve(stream, &config, shutdown).await {
        Ok(SessionEnd::ClosedByPeer) => debug!("closed by peer"),
        Ok(SessionEnd::ShutDown) => debug!("closed for shutdown"),
        Err(e) => {
            if e.is_handshake() {
                counter!(WS_HANDSHAKE_FAILURES_TOTAL).increment(1);
            }
            counter!(WS_SESSION_ERRORS_TOTAL, "reason" => e.reason()).increment(1);
            warn!(error = %e, "session failed");
        }
    }

    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_SESSION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
}

/// Upgrade `stream` and echo every data message back to the peer.
///
/// Each text or binary message is written back with the same kind and the
/// same bytes before the next one is read. Control frames are answered by
/// the protocol layer and never echoed.
pub async fn serve<S>(
    stream: S,
    config: &SessionConfig,
    shutdown: CancellationToken,
) -> Result<SessionEnd, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ws = tokio::select! {
        () = shutdown.cancelled() => return Ok(SessionEnd::ShutDown),
        ws = handshake::accept(stream, config) => ws?,
    };
    debug!("upgrade complete");

    let mut idle = IdleTracker::new(config.idle_timeout, config.keep_alive_pings);
    // Set once the peer's Close arrives; later transport errors only mean
    // the peer hung up before our close reply was flushed.
    let mut peer_closed = false;
    loop {
        let next = tokio::select! {
            () = shutdown.cancelled() => {
                close_for_shutdown(&mut ws).await;
                return Ok(SessionEnd::ShutDown);
            }
            next = time::timeout(idle.wait(), ws.next()) => next,
        };

        let message = match next {
            Err(_) => match idle.on_elapsed() {
                IdleAction::SendPing => {
                    debug!("peer quiet, sending ping");
                    send(&mut ws, Message::Ping(Vec::new().into()), idle.timeout()).await?;
                    continue;
                }
                IdleAction::Expire => return Err(SessionError::IdleTimeout(idle.timeout())),
            },
            Ok(None) => return Ok(SessionEnd::ClosedByPeer),
            Ok(Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed))) => {
                return Ok(SessionEnd::ClosedByPeer);
            }
            Ok(Some(Err(e))) if peer_closed => {
                debug!(error = %e, "peer hung up after close");
                return Ok(SessionEnd::ClosedByPeer);
            }
            Ok(Some(Err(e))) => return Err(SessionError::Read(e)),
            Ok(Some(Ok(message))) => message,
        };
        idle.on_activity();

        match message {
            Message::Text(_) | Message::Binary(_) => echo(&mut ws, message, config, idle.timeout()).await?,
            Message::Close(frame) => {
                // The close reply is queued by the protocol layer and flushed
                // by the next read, which then reports end of stream.
                debug!(?frame, "peer sent close");
                peer_closed = true;
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

/// Write one data message back unchanged.
async fn echo<S>(
    ws: &mut WebSocketStream<S>,
    message: Message,
    config: &SessionConfig,
    deadline: Duration,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (kind, len) = match &message {
        Message::Text(text) => {
            if config.diagnostics {
                diagnostic::emit(text.as_bytes());
            }
            ("text", text.len())
        }
        Message::Binary(data) => {
            if config.diagnostics {
                diagnostic::emit(data);
            }
            ("binary", data.len())
        }
        _ => return Ok(()),
    };

    send(ws, message, deadline).await?;
    counter!(WS_FRAMES_ECHOED_TOTAL, "kind" => kind).increment(1);
    counter!(WS_BYTES_ECHOED_TOTAL).increment(len as u64);
    Ok(())
}

async fn send<S>(
    ws: &mut WebSocketStream<S>,
    message: Message,
    deadline: Duration,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match time::timeout(deadline, ws.send(message)).await {
        Ok(result) => result.map_err(SessionError::Write),
        Err(_) => Err(SessionError::WriteTimeout(deadline)),
    }
}

/// Send `1001 Going Away` and give the peer a moment to answer.
async fn close_for_shutdown<S>(ws: &mut WebSocketStream<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Away,
        reason: "server shutting down".into(),
    };
    let closing = async {
        if let Err(e) = ws.close(Some(frame)).await {
            debug!(error = %e, "close on shutdown failed");
            return;
        }
        while let Some(Ok(_)) = ws.next().await {}
    };
    if time::timeout(CLOSE_GRACE, closing).await.is_err() {
        debug!("peer did not answer close before shutdown");
    }
}
