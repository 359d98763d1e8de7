//! Conversions between hub frames and `tungstenite` messages.

use std::borrow::Cow;

use bytes::Bytes;
use switchboard_core::{CloseFrame, Frame, FrameKind};
use tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tungstenite::Message;

/// Convert an outbound frame into a `tungstenite` message.
///
/// Text payloads that are not valid UTF-8 are converted lossily.
pub fn to_message(frame: Frame) -> Message {
    match frame.kind {
        FrameKind::Text => Message::text(String::from_utf8_lossy(&frame.payload).into_owned()),
        FrameKind::Binary => Message::Binary(frame.payload),
        FrameKind::Ping => Message::Ping(frame.payload),
        FrameKind::Pong => Message::Pong(frame.payload),
        FrameKind::Close => Message::Close(frame.close_frame().map(|close| {
            tungstenite::protocol::CloseFrame {
                code: WsCloseCode::from(close.code),
                reason: close.reason.into_owned().into(),
            }
        })),
    }
}

/// Convert an inbound `tungstenite` message into a frame.
///
/// Raw frames are never produced by a reading stream and yield `None`.
pub fn from_message(message: Message) -> Option<Frame> {
    let frame = match message {
        Message::Text(text) => {
            Frame::new(FrameKind::Text, Bytes::copy_from_slice(text.as_str().as_bytes()))
        }
        Message::Binary(data) => Frame::binary(data),
        Message::Ping(data) => Frame::ping(data),
        Message::Pong(data) => Frame::pong(data),
        Message::Close(Some(close)) => {
            let close = CloseFrame {
                code: u16::from(close.code),
                reason: Cow::Owned(close.reason.to_string()),
            };
            Frame::new(FrameKind::Close, close.encode())
        }
        Message::Close(None) => Frame::close_empty(),
        Message::Frame(_) => return None,
    };
    Some(frame)
}
