//! Transport frames.
//!
//! A [`Frame`] is one discrete unit of transport data tagged with a
//! [`FrameKind`]. Kind values follow RFC 6455 §11.8 so transports can map
//! them directly onto their own opcodes.

use std::borrow::Cow;
use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CloseCode;

/// The kind of a frame, valued per RFC 6455 §11.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// UTF-8 text data.
    Text = 1,
    /// Binary data.
    Binary = 2,
    /// Close control frame.
    Close = 8,
    /// Ping control frame.
    Ping = 9,
    /// Pong control frame.
    Pong = 10,
}

impl FrameKind {
    /// Convert from the RFC 6455 opcode value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Text),
            2 => Some(Self::Binary),
            8 => Some(Self::Close),
            9 => Some(Self::Ping),
            10 => Some(Self::Pong),
            _ => None,
        }
    }

    /// Get the RFC 6455 opcode value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name, used as a metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }

    /// Check if this is a control kind (close, ping, pong).
    pub fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single frame read from or written to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame kind.
    pub kind: FrameKind,
    /// The raw payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame of the given kind.
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create a new text frame.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(FrameKind::Text, text.into())
    }

    /// Create a new binary frame.
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Binary, data)
    }

    /// Create a new ping frame.
    pub fn ping(data: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Ping, data)
    }

    /// Create a new pong frame.
    pub fn pong(data: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Pong, data)
    }

    /// Create a close frame with a code and reason.
    pub fn close(code: CloseCode, reason: impl Into<String>) -> Self {
        Self::new(FrameKind::Close, CloseFrame::new(code, reason).encode())
    }

    /// Create an empty close frame.
    pub fn close_empty() -> Self {
        Self::new(FrameKind::Close, Bytes::new())
    }

    /// Check if this is a data frame (text or binary).
    pub fn is_data(&self) -> bool {
        matches!(self.kind, FrameKind::Text | FrameKind::Binary)
    }

    /// Check if this is a control frame (ping, pong, or close).
    pub fn is_control(&self) -> bool {
        self.kind.is_control()
    }

    /// Check if this is a close frame.
    pub fn is_close(&self) -> bool {
        self.kind == FrameKind::Close
    }

    /// Get the payload as text.
    ///
    /// Returns `None` if this is not a text frame or the payload is not UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self.kind {
            FrameKind::Text => std::str::from_utf8(&self.payload).ok(),
            _ => None,
        }
    }

    /// Decode the close payload, if this is a close frame that carries one.
    pub fn close_frame(&self) -> Option<CloseFrame> {
        match self.kind {
            FrameKind::Close => CloseFrame::decode(&self.payload),
            _ => None,
        }
    }

    /// Length of the payload in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<String> for Frame {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(b: Vec<u8>) -> Self {
        Self::binary(b)
    }
}

impl From<Bytes> for Frame {
    fn from(b: Bytes) -> Self {
        Self::binary(b)
    }
}

impl From<&[u8]> for Frame {
    fn from(b: &[u8]) -> Self {
        Self::binary(Bytes::copy_from_slice(b))
    }
}

/// The decoded payload of a close frame: a status code and a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// The close code.
    pub code: u16,
    /// The close reason.
    pub reason: Cow<'static, str>,
}

impl CloseFrame {
    /// Create a new close frame.
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            reason: Cow::Owned(reason.into()),
        }
    }

    /// Create a normal close frame.
    pub fn normal(reason: impl Into<String>) -> Self {
        Self::new(CloseCode::Normal, reason)
    }

    /// Create a close frame for going away.
    pub fn going_away(reason: impl Into<String>) -> Self {
        Self::new(CloseCode::GoingAway, reason)
    }

    /// Get the close code enum value if it's a standard code.
    pub fn close_code(&self) -> Option<CloseCode> {
        CloseCode::from_u16(self.code)
    }

    /// Encode as a close payload: big-endian code followed by the reason.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + self.reason.len());
        buf.put_u16(self.code);
        buf.put_slice(self.reason.as_bytes());
        buf.freeze()
    }

    /// Decode a close payload. Empty or truncated payloads carry no frame.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < 2 {
            return None;
        }
        let code = u16::from_be_bytes([payload[0], payload[1]]);
        let reason = String::from_utf8_lossy(&payload[2..]).into_owned();
        Some(Self {
            code,
            reason: Cow::Owned(reason),
        })
    }
}
