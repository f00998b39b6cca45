//! K value model and wire codec for the kdb+/q IPC protocol.
//!
//! This crate is the protocol layer: the polymorphic [`K`] value model
//! with its interning [`SymbolContext`], the bit-exact binary
//! [`encode`]/[`decode`] pair, the proprietary LZ-style
//! [`compress`]/[`decompress`] scheme, text/HTML [formatters](format),
//! and the two-byte-magic [file](file) persistence format.
//!
//! The session layer (framed sockets, sync-request completions, message
//! dispatch) lives in `qipc-core`; this crate is I/O-free and fully
//! deterministic.
//!
//! ```
//! use qipc_proto::{K, MessageType, SymbolContext, decode, encode};
//!
//! let ctx = SymbolContext::new();
//! let dict = K::dict(
//!     K::sym_vec(&ctx, &["a", "b"]),
//!     K::int_vec(vec![2, 3]),
//! )?;
//! let wire = encode(&dict, &ctx, MessageType::Async)?;
//! assert_eq!(decode(&wire, &ctx)?, dict);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
mod compress;
mod context;
mod errors;
pub mod file;
pub mod format;
mod tag;
mod value;

pub use codec::{
    MessageHeader, MessageType, PROTOCOL_VERSION, decode, encode, encode_compressed, read_value,
    write_value,
};
pub use compress::{compress, decompress};
pub use context::SymbolContext;
pub use errors::{CodecError, ValueError};
pub use tag::{Attr, TypeTag};
pub use value::{Atom, Dict, K, Lambda, Table, Vector};
