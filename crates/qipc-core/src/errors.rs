//! Session error types.

use qipc_proto::CodecError;
use thiserror::Error;

/// Errors surfaced by the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Underlying socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame failed to decode; terminal for the connection.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The peer answered a sync request with a type `-128` error value.
    #[error("remote error: {0}")]
    Remote(String),

    /// The stream ended, or the writer was closed with requests pending.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer violated the protocol (a response with no outstanding
    /// request, an unknown message type).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Login was rejected: the peer closed the connection without the
    /// version reply.
    #[error("login rejected by peer")]
    Credentials,

    /// A session handler failed; the message is relayed to the peer as a
    /// remote error when the handler served a sync request.
    #[error("{0}")]
    Handler(String),
}

impl SessionError {
    /// Shorthand for a [`SessionError::Handler`].
    #[must_use]
    pub fn handler(msg: &str) -> Self {
        Self::Handler(msg.to_owned())
    }
}
