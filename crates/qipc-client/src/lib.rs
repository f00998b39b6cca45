//! Client connector for the kdb+/q IPC protocol.
//!
//! Opens a TCP connection, performs the credential/version login
//! handshake, and hands back an [`IpcWriter`](qipc_core::IpcWriter) whose
//! session driver runs in the background. Installing a
//! [`SessionContext`](qipc_core::SessionContext) makes the client a full
//! RPC peer: the server may push async messages or call back into it
//! with sync requests.

mod connect;

pub use connect::{
    ClientConfig, ConnectError, Connection, DEFAULT_PORT, MAX_PROTOCOL_VERSION, connect,
    connect_uri, maintain,
};
