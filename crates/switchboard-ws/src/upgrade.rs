//! Turning upgraded streams into hub connections.
//!
//! The host framework performs the HTTP upgrade and hands over the raw
//! stream; [`complete_upgrade`] wraps it as a [`WsTransport`]. For plain TCP
//! listeners without a host framework, [`accept_handshake`] performs the
//! handshake too.

use std::sync::Arc;

use switchboard_core::{Connection, Hub, HubResult, RequestContext, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

use crate::config::WebSocketConfig;
use crate::transport::{transport_error, WsTransport};

/// Wrap a stream whose WebSocket handshake has already completed.
pub async fn complete_upgrade<S>(stream: S, config: &WebSocketConfig) -> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ws_stream = WebSocketStream::from_raw_socket(
        stream,
        tungstenite::protocol::Role::Server,
        Some(config.to_protocol()),
    )
    .await;

    WsTransport::new(ws_stream)
}

/// Perform the server side of the WebSocket handshake on a raw stream.
pub async fn accept_handshake<S>(
    stream: S,
    config: &WebSocketConfig,
) -> Result<WsTransport<S>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ws_stream =
        tokio_tungstenite::accept_async_with_config(stream, Some(config.to_protocol()))
            .await
            .map_err(transport_error)?;
    debug!("WebSocket handshake completed");

    Ok(WsTransport::new(ws_stream))
}

/// Accept an upgraded stream into `hub` and wait until it disconnects.
///
/// `setup` runs once, before any event fires.
pub async fn serve_socket<S, F>(
    hub: &Arc<Hub>,
    stream: S,
    config: &WebSocketConfig,
    context: RequestContext,
    setup: F,
) -> HubResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    F: FnOnce(&Arc<Connection>),
{
    let transport = complete_upgrade(stream, config).await;
    hub.serve(transport, context, setup).await
}
