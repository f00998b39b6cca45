//! Asynchronous session layer for the kdb+/q IPC protocol.
//!
//! Builds on `qipc-proto`'s value model and codec: length-prefixed
//! framing over any byte stream, a FIFO of pending sync-request
//! completions (the wire protocol has no correlation ids), and dispatch
//! of peer-initiated messages to a user [`SessionContext`]. The protocol
//! is symmetric after login, so the same [`run_session`] driver powers
//! both clients and servers, including bidirectional RPC: a handler may
//! issue its own sync requests while later inbound frames keep being
//! serviced.

mod context;
mod errors;
mod session;

pub use context::{NullContext, SessionContext};
pub use errors::SessionError;
pub use session::{IpcReader, IpcWriter, SessionConfig, run_session};
