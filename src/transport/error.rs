//! Transport layer error types.
//!
//! Almost every error here is local to one connection: the server drops that
//! peer, the client drops its link and reconnects. Only [`TransportError::is_fatal`]
//! errors end the transport thread.

use std::io;
use std::time::Duration;

use thiserror::Error;

use super::frame::FrameError;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Frame encoding or length validation failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// I/O error (socket operations).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the stream between frames.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Peer closed the stream in the middle of a header or body.
    #[error("stream ended after {read} of {expected} bytes")]
    Truncated {
        /// Bytes received.
        read: usize,
        /// Bytes expected.
        expected: usize,
    },

    /// The rest of a header or body did not arrive in time.
    #[error("read deadline elapsed after {read} of {expected} bytes")]
    DeadlineElapsed {
        /// Bytes received.
        read: usize,
        /// Bytes expected.
        expected: usize,
    },

    /// TCP connect did not complete in time.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Host name resolved to no usable address.
    #[error("could not resolve {0}")]
    Unresolved(String),

    /// Listener could not be bound.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The transport's async runtime could not be built.
    #[error("runtime setup failed: {0}")]
    Runtime(#[source] io::Error),

    /// Client role is not connected upstream.
    #[error("link is down")]
    LinkDown,
}

impl TransportError {
    /// Whether this error ends the transport thread instead of one connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Bind { .. } | TransportError::Runtime(_))
    }

    /// Whether the peer closed the stream cleanly between frames.
    pub fn is_peer_close(&self) -> bool {
        matches!(self, TransportError::ConnectionClosed)
    }

    /// Whether the peer violated the framing protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            TransportError::Frame(FrameError::InvalidLength { .. })
                | TransportError::Truncated { .. }
                | TransportError::DeadlineElapsed { .. }
        )
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        let bind = TransportError::Bind {
            addr: "127.0.0.1:300".into(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(bind.is_fatal());
        assert!(TransportError::Runtime(io::Error::other("no reactor")).is_fatal());

        assert!(!TransportError::ConnectionClosed.is_fatal());
        assert!(!TransportError::ConnectTimeout(Duration::from_secs(3)).is_fatal());
        assert!(!TransportError::Io(io::Error::other("reset")).is_fatal());
    }

    #[test]
    fn test_protocol_violations() {
        let invalid = TransportError::Frame(FrameError::InvalidLength {
            length: 2_000_000,
            max: 1_048_576,
        });
        assert!(invalid.is_protocol_violation());
        assert!(TransportError::DeadlineElapsed { read: 2, expected: 4 }.is_protocol_violation());
        assert!(TransportError::Truncated { read: 1, expected: 4 }.is_protocol_violation());

        assert!(!TransportError::ConnectionClosed.is_protocol_violation());
        assert!(TransportError::ConnectionClosed.is_peer_close());
    }

    #[test]
    fn test_bind_message_names_address() {
        let err = TransportError::Bind {
            addr: "0.0.0.0:30000".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "bind failed on 0.0.0.0:30000: denied");
    }
}
