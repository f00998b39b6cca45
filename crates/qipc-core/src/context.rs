//! Session context: the user object receiving inbound messages.
//!
//! The hooks mirror the reference server's callbacks: `on_sync` answers
//! peer sync requests (`.z.pg`), `on_async` consumes fire-and-forget
//! messages (`.z.ps`), and `connected`/`closing` bracket the connection
//! (`.z.po`/`.z.pc`). Both clients and servers install a context; the
//! wire protocol is symmetric, so either side may field requests.

use async_trait::async_trait;
use qipc_proto::K;

use crate::errors::SessionError;
use crate::session::IpcWriter;

/// Handlers for inbound messages on a session.
///
/// Handlers receive the session's writer and may freely send messages or
/// issue their own sync requests from within a callback; the session
/// keeps servicing inbound frames while a handler runs.
#[async_trait]
pub trait SessionContext: Send + Sync {
    /// Handle a sync request; the returned value becomes the response.
    ///
    /// Errors are converted to a remote-error response carrying the
    /// failure message.
    async fn on_sync(&self, value: K, writer: &IpcWriter) -> Result<K, SessionError> {
        let _ = (value, writer);
        Err(SessionError::handler("nyi handling"))
    }

    /// Handle an async message. Errors are logged, never surfaced to the
    /// peer.
    async fn on_async(&self, value: K, writer: &IpcWriter) -> Result<(), SessionError> {
        let _ = (value, writer);
        Ok(())
    }

    /// Called once the session is up, before any inbound dispatch.
    async fn connected(&self, writer: &IpcWriter) {
        let _ = writer;
    }

    /// Called after the session has shut down.
    async fn closing(&self, writer: &IpcWriter) {
        let _ = writer;
    }
}

/// Context with default behavior only: sync requests are answered with a
/// `nyi handling` remote error, async messages are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullContext;

#[async_trait]
impl SessionContext for NullContext {}
