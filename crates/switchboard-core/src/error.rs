//! Error types for hub operations.
//!
//! [`HubError`] covers addressing failures (unknown or dead targets),
//! identifier problems, admission limits and wrapped [`TransportError`]s.
//! Transport errors always end the connection that produced them.

use std::fmt;
use thiserror::Error;

use crate::id::ConnectionId;

/// Result type for hub operations.
pub type HubResult<T> = Result<T, HubError>;

/// Errors that can occur while addressing or running connections.
#[derive(Debug, Clone, Error)]
pub enum HubError {
    /// The addressed id is not in the registry (reaped, or never existed).
    #[error("connection not found: {id}")]
    NotFound {
        /// The id that was addressed.
        id: ConnectionId,
    },

    /// The id is registered but the connection is no longer live.
    #[error("connection is no longer alive: {id}")]
    Dead {
        /// The id that was addressed.
        id: ConnectionId,
    },

    /// An explicit id was requested that is already registered.
    #[error("connection id already in use: {id}")]
    IdentifierCollision {
        /// The id that collided.
        id: ConnectionId,
    },

    /// The generator could not find a free id within its retry budget.
    #[error("no unique connection id after {attempts} attempts")]
    IdentifierExhausted {
        /// Number of attempts made.
        attempts: usize,
    },

    /// The hub already holds its maximum number of connections.
    #[error("connection limit reached: maximum {max} connections")]
    ConnectionLimitReached {
        /// The configured maximum.
        max: usize,
    },

    /// The hub is shutting down and refuses new connections.
    #[error("hub is shutting down")]
    ShuttingDown,

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl HubError {
    /// Create a new "not found" error.
    pub fn not_found(id: impl Into<ConnectionId>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a new "dead connection" error.
    pub fn dead(id: impl Into<ConnectionId>) -> Self {
        Self::Dead { id: id.into() }
    }

    /// Create a new identifier collision error.
    pub fn collision(id: impl Into<ConnectionId>) -> Self {
        Self::IdentifierCollision { id: id.into() }
    }

    /// Create a new identifier exhaustion error.
    pub fn exhausted(attempts: usize) -> Self {
        Self::IdentifierExhausted { attempts }
    }

    /// Create a new connection limit error.
    pub fn connection_limit(max: usize) -> Self {
        Self::ConnectionLimitReached { max }
    }

    /// The connection id this error refers to, if any.
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        match self {
            Self::NotFound { id } | Self::Dead { id } | Self::IdentifierCollision { id } => Some(id),
            _ => None,
        }
    }

    /// Check if the target is gone (either reaped or awaiting reaping).
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Dead { .. })
    }

    /// Check if the error ends the connection or signals a misconfiguration.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IdentifierExhausted { .. } | Self::Transport(_))
    }

    /// Short, stable label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Dead { .. } => "dead",
            Self::IdentifierCollision { .. } => "identifier_collision",
            Self::IdentifierExhausted { .. } => "identifier_exhausted",
            Self::ConnectionLimitReached { .. } => "connection_limit",
            Self::ShuttingDown => "shutting_down",
            Self::Transport(_) => "transport",
        }
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer went away without a close handshake, or the stream ended.
    #[error("transport closed")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing or protocol violation reported by the transport library.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Create a new protocol error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol(reason.into())
    }
}

// `io::Error` is not `Clone`; copies keep its kind and message.
impl Clone for TransportError {
    fn clone(&self) -> Self {
        match self {
            Self::Closed => Self::Closed,
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Protocol(reason) => Self::Protocol(reason.clone()),
        }
    }
}

/// Close code carried in the payload of a close frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure (1000).
    Normal = 1000,
    /// Going away (1001).
    GoingAway = 1001,
    /// Protocol error (1002).
    Protocol = 1002,
    /// Unsupported data (1003).
    Unsupported = 1003,
    /// No status received (1005).
    NoStatus = 1005,
    /// Abnormal closure (1006).
    Abnormal = 1006,
    /// Invalid payload data (1007).
    InvalidPayload = 1007,
    /// Policy violation (1008).
    PolicyViolation = 1008,
    /// Message too big (1009).
    MessageTooBig = 1009,
    /// Internal error (1011).
    InternalError = 1011,
    /// Service restart (1012).
    ServiceRestart = 1012,
    /// Try again later (1013).
    TryAgainLater = 1013,
}

impl CloseCode {
    /// Convert from a u16 code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::Normal),
            1001 => Some(Self::GoingAway),
            1002 => Some(Self::Protocol),
            1003 => Some(Self::Unsupported),
            1005 => Some(Self::NoStatus),
            1006 => Some(Self::Abnormal),
            1007 => Some(Self::InvalidPayload),
            1008 => Some(Self::PolicyViolation),
            1009 => Some(Self::MessageTooBig),
            1011 => Some(Self::InternalError),
            1012 => Some(Self::ServiceRestart),
            1013 => Some(Self::TryAgainLater),
            _ => None,
        }
    }

    /// Get the u16 value of this close code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "Normal",
            Self::GoingAway => "GoingAway",
            Self::Protocol => "Protocol",
            Self::Unsupported => "Unsupported",
            Self::NoStatus => "NoStatus",
            Self::Abnormal => "Abnormal",
            Self::InvalidPayload => "InvalidPayload",
            Self::PolicyViolation => "PolicyViolation",
            Self::MessageTooBig => "MessageTooBig",
            Self::InternalError => "InternalError",
            Self::ServiceRestart => "ServiceRestart",
            Self::TryAgainLater => "TryAgainLater",
        };
        write!(f, "{} ({})", name, self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_gone() {
        let err = HubError::not_found("abc");
        assert!(err.is_gone());
        assert!(!err.is_fatal());
        assert_eq!(err.reason(), "not_found");
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_dead_is_gone() {
        let err = HubError::dead("abc");
        assert!(err.is_gone());
        assert_eq!(err.connection_id().map(ConnectionId::as_str), Some("abc"));
    }

    #[test]
    fn test_transport_error_is_fatal() {
        let err = HubError::from(TransportError::Closed);
        assert!(err.is_fatal());
        assert!(!err.is_gone());
        assert_eq!(err.reason(), "transport");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: TransportError = io.into();
        assert!(matches!(err, TransportError::Io(_)));
        assert!(err.to_string().contains("pipe"));
    }

    #[test]
    fn test_clone_keeps_io_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = HubError::from(TransportError::from(io));
        let copy = err.clone();
        match copy {
            HubError::Transport(TransportError::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset);
                assert!(e.to_string().contains("reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exhausted_message() {
        let err = HubError::exhausted(16);
        assert!(err.to_string().contains("16"));
        assert!(err.connection_id().is_none());
    }

    #[test]
    fn test_close_code_from_u16() {
        assert_eq!(CloseCode::from_u16(1000), Some(CloseCode::Normal));
        assert_eq!(CloseCode::from_u16(1001), Some(CloseCode::GoingAway));
        assert_eq!(CloseCode::from_u16(9999), None);
    }

    #[test]
    fn test_close_code_display() {
        assert_eq!(CloseCode::Normal.to_string(), "Normal (1000)");
        assert_eq!(CloseCode::Protocol.to_string(), "Protocol (1002)");
    }
}
