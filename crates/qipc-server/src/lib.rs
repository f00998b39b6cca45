//! Listening server for the kdb+/q IPC protocol.
//!
//! Binds a TCP port, validates logins (optionally against a password,
//! compared in constant time), negotiates the protocol version, and runs
//! one session task per connection against a user-supplied
//! [`SessionContext`](qipc_core::SessionContext). The session is fully
//! bidirectional: a handler may call back into the connected client with
//! its own sync requests.

mod error;
mod server;

pub use error::ServerError;
pub use server::{MAX_PROTOCOL_VERSION, Server, ServerConfig};
