//! Server side of the HTTP upgrade.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SERVER;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async_with_config};
use tracing::debug;

use crate::config::SessionConfig;
use crate::errors::SessionError;

/// Value of the `Server` header on every upgrade response.
pub const SERVER_IDENT: &str = concat!(
    "wsecho/",
    env!("CARGO_PKG_VERSION"),
    " websocket-server-async"
);

/// Protocol limits applied to every session.
pub fn websocket_config(max_message_size: usize) -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(max_message_size);
    config.max_frame_size = Some(max_message_size);
    config
}

/// Handshake callback: stamps the `Server` header on the 101 response.
#[allow(clippy::result_large_err)] // ErrorResponse size is dictated by tungstenite's API
fn announce_server(request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    debug!(uri = %request.uri(), "upgrade request");
    let _ = response
        .headers_mut()
        .insert(SERVER, HeaderValue::from_static(SERVER_IDENT));
    Ok(response)
}

/// Perform the upgrade on `stream`, bounded by the handshake timeout.
pub async fn accept<S>(stream: S, config: &SessionConfig) -> Result<WebSocketStream<S>, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ws_config = websocket_config(config.max_message_size);
    let upgrade = accept_hdr_async_with_config(stream, announce_server, Some(ws_config));

    match time::timeout(config.handshake_timeout, upgrade).await {
        Ok(Ok(ws)) => Ok(ws),
        Ok(Err(e)) => Err(SessionError::Handshake(e)),
        Err(_) => Err(SessionError::HandshakeTimeout(config.handshake_timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config() -> SessionConfig {
        SessionConfig {
            handshake_timeout: Duration::from_secs(5),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn ident_names_crate_and_version() {
        assert!(SERVER_IDENT.starts_with("wsecho/"));
        assert!(SERVER_IDENT.contains(env!("CARGO_PKG_VERSION")));
        assert!(SERVER_IDENT.ends_with(" websocket-server-async"));
    }

    #[test]
    fn config_limits_message_and_frame() {
        let cfg = websocket_config(4096);
        assert_eq!(cfg.max_message_size, Some(4096));
        assert_eq!(cfg.max_frame_size, Some(4096));
    }

    #[tokio::test]
    async fn upgrade_response_carries_server_header() {
        let (server_io, client_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move { accept(server_io, &config()).await.map(|_| ()) });

        let (_ws, response) = tokio_tungstenite::client_async("ws://localhost/", client_io)
            .await
            .unwrap();
        assert_eq!(response.headers()["server"], SERVER_IDENT);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn plain_http_request_is_rejected() {
        let (server_io, mut client_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move { accept(server_io, &config()).await.map(|_| ()) });

        client_io
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let result = server.await.unwrap();
        assert_matches!(result, Err(SessionError::Handshake(_)));

        // The server half is gone; the client sees EOF after any error response.
        let mut rest = Vec::new();
        let _ = client_io.read_to_end(&mut rest).await;
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_times_out() {
        let (server_io, _client_io) = tokio::io::duplex(4096);
        let cfg = SessionConfig {
            handshake_timeout: Duration::from_millis(200),
            ..SessionConfig::default()
        };
        let result = accept(server_io, &cfg).await.map(|_| ());
        assert_matches!(result, Err(SessionError::HandshakeTimeout(d)) if d == Duration::from_millis(200));
    }
}
