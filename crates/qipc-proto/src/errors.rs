//! Error types for the value model and codec.

use std::fmt;

use thiserror::Error;

use crate::tag::tag_label;

/// Errors raised by value construction and accessors.
///
/// These never corrupt state: a failed accessor or constructor leaves the
/// value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An accessor or setter was applied to a value of a different tag.
    WrongType {
        /// Accessor or constructor that was requested.
        requested: &'static str,
        /// Raw tag of the value it was applied to.
        actual: i8,
    },

    /// An integer does not fit the fixed-width field of the target tag.
    OutOfRange {
        /// Target tag name.
        tag: &'static str,
        /// Offending value.
        value: i64,
    },

    /// Paired sequences disagree in length (dict sides, table columns).
    LengthMismatch(String),

    /// A container or function body violates its structural rules.
    Malformed(String),
}

impl ValueError {
    /// Shorthand for a [`ValueError::WrongType`].
    #[must_use]
    pub fn wrong_type(requested: &'static str, actual: i8) -> Self {
        Self::WrongType { requested, actual }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongType { requested, actual } => {
                write!(f, "wrong type {} for {requested}", tag_label(*actual))
            },
            Self::OutOfRange { tag, value } => {
                write!(f, "value {value} out of range for {tag}")
            },
            Self::LengthMismatch(detail) => write!(f, "length mismatch: {detail}"),
            Self::Malformed(detail) => write!(f, "malformed value: {detail}"),
        }
    }
}

impl std::error::Error for ValueError {}

/// Errors raised while encoding or decoding wire bytes.
///
/// Any decode error on an inbound frame is terminal for that connection;
/// the decoder itself never panics on malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Type tag outside the supported set.
    #[error("unknown type tag {tag}")]
    UnknownType {
        /// The unrecognized raw tag.
        tag: i8,
    },

    /// Buffer ended before the expected payload.
    #[error("truncated buffer: required {needed} bytes at offset {offset}, got {available}")]
    Truncated {
        /// Offset at which more bytes were required.
        offset: usize,
        /// Bytes required from that offset.
        needed: usize,
        /// Bytes actually available from that offset.
        available: usize,
    },

    /// Declared message length disagrees with the parsed payload.
    #[error("framing error: {0}")]
    Framing(String),

    /// Header flags outside `{0, 1}`.
    #[error("unsupported header flags {flags:#06x}")]
    UnsupportedFlags {
        /// The rejected flags value.
        flags: u16,
    },

    /// The decompressor overran its input or output.
    #[error("decompression failed: {0}")]
    Compression(String),

    /// Symbol, char-vector or error text was not valid UTF-8.
    #[error("invalid utf-8 in {what}")]
    InvalidUtf8 {
        /// What was being decoded.
        what: &'static str,
    },

    /// A symbol index has no entry in the encoding context.
    #[error("symbol index {index} not interned in this context")]
    UnknownSymbol {
        /// The unresolved interning index.
        index: u32,
    },
}
