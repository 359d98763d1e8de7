//! [`Transport`] implementation over a `tokio-tungstenite` stream.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use switchboard_core::{Frame, Transport, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tracing::debug;
use tungstenite::Message;

use crate::message::{from_message, to_message};

/// A WebSocket stream split into independently locked halves.
///
/// Reads and writes take different locks, so the read and send loops of a
/// connection never wait on each other.
///
/// # Example
///
/// ```
/// use switchboard_core::{Frame, Transport};
/// use switchboard_ws::WsTransport;
/// use tokio_tungstenite::WebSocketStream;
/// use tungstenite::protocol::Role;
///
/// # tokio_test::block_on(async {
/// let (client_io, server_io) = tokio::io::duplex(4096);
/// let server = WsTransport::new(
///     WebSocketStream::from_raw_socket(server_io, Role::Server, None).await,
/// );
/// let client = WsTransport::new(
///     WebSocketStream::from_raw_socket(client_io, Role::Client, None).await,
/// );
///
/// server.write_frame(Frame::text("hello")).await.unwrap();
/// assert_eq!(client.read_frame().await.unwrap(), Frame::text("hello"));
/// # });
/// ```
pub struct WsTransport<S> {
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<S>>>,
}

impl<S> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established WebSocket stream.
    pub fn new(stream: WebSocketStream<S>) -> Self {
        let (sink, stream) = stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

impl<S> std::fmt::Debug for WsTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_frame(&self) -> Result<Frame, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(message)) => {
                    if let Some(frame) = from_message(message) {
                        return Ok(frame);
                    }
                }
                Some(Err(e)) => return Err(transport_error(e)),
                None => return Err(TransportError::Closed),
            }
        }
    }

    async fn write_frame(&self, frame: Frame) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.send(to_message(frame)).await.map_err(transport_error)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        match sink.close().await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                debug!("WebSocket already closed");
                Ok(())
            }
            Err(e) => Err(transport_error(e)),
        }
    }
}

/// Map a `tungstenite` error onto the transport error taxonomy.
pub fn transport_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed
        }
        tungstenite::Error::Io(e) => TransportError::Io(e),
        other => TransportError::protocol(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_errors_map_to_closed() {
        assert!(matches!(
            transport_error(tungstenite::Error::ConnectionClosed),
            TransportError::Closed
        ));
        assert!(matches!(
            transport_error(tungstenite::Error::AlreadyClosed),
            TransportError::Closed
        ));
    }

    #[test]
    fn test_io_error_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        match transport_error(tungstenite::Error::Io(io)) {
            TransportError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_are_protocol() {
        let err = transport_error(tungstenite::Error::Protocol(
            tungstenite::error::ProtocolError::ResetWithoutClosingHandshake,
        ));
        assert!(matches!(err, TransportError::Protocol(_)));
    }
}
