//! The transport capability a connection runs over.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::frame::Frame;

/// A bidirectional, frame-oriented transport owned by one connection.
///
/// The runtime calls [`read_frame`](Transport::read_frame) from its read loop
/// and [`write_frame`](Transport::write_frame) from its send loop, so the two
/// may run concurrently. Neither is ever called concurrently with itself.
/// [`close`](Transport::close) is called once, after both loops are cancelled.
///
/// # Example
///
/// ```ignore
/// use switchboard_core::{Frame, Transport, TransportError};
///
/// struct Loopback { /* ... */ }
///
/// #[async_trait::async_trait]
/// impl Transport for Loopback {
///     async fn read_frame(&self) -> Result<Frame, TransportError> { /* ... */ }
///     async fn write_frame(&self, frame: Frame) -> Result<(), TransportError> { /* ... */ }
///     async fn close(&self) -> Result<(), TransportError> { Ok(()) }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Wait for the next inbound frame.
    ///
    /// A stream that ends without a close frame should return
    /// [`TransportError::Closed`].
    async fn read_frame(&self) -> Result<Frame, TransportError>;

    /// Write one frame to the peer.
    async fn write_frame(&self, frame: Frame) -> Result<(), TransportError>;

    /// Release the underlying resource.
    async fn close(&self) -> Result<(), TransportError>;
}
