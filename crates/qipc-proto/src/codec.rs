//! Bit-exact wire codec.
//!
//! Every framed message is an 8-byte little-endian header followed by a
//! recursively encoded payload (type byte first). Nested parses chain
//! offsets instead of slicing into intermediate copies, and the final
//! offset must land exactly on the declared message length.
//!
//! # Frame header
//!
//! | Offset | Width | Field   | Semantics                                |
//! |--------|-------|---------|------------------------------------------|
//! | 0      | u8    | version | protocol byte, fixed 1 on write          |
//! | 1      | u8    | msgtype | 0 async, 1 sync, 2 response              |
//! | 2      | u16   | flags   | 0 raw, 1 compressed payload              |
//! | 4      | u32   | msglen  | total frame length including this header |

use bytes::{BufMut, Bytes};

use crate::compress::{compress, decompress};
use crate::context::SymbolContext;
use crate::errors::CodecError;
use crate::tag::{Attr, TypeTag};
use crate::value::{Atom, Dict, K, Lambda, Table, Vector};

/// Protocol byte written in every outbound header.
pub const PROTOCOL_VERSION: u8 = 1;

/// Message type carried in byte 1 of the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Fire-and-forget message; never answered.
    Async = 0,
    /// Request expecting exactly one response.
    Sync = 1,
    /// Answer to the oldest outstanding sync request.
    Response = 2,
}

impl MessageType {
    /// Parse a message type byte.
    #[must_use]
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0 => Self::Async,
            1 => Self::Sync,
            2 => Self::Response,
            _ => return None,
        })
    }

    /// Wire value of this message type.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Protocol byte (1 from this implementation; inbound values are not
    /// interpreted).
    pub version: u8,
    /// Raw message type byte.
    pub msgtype: u8,
    /// Flags: 0 raw, 1 compressed; anything else fails decoding.
    pub flags: u16,
    /// Total frame length in bytes, header included.
    pub msglen: u32,
}

impl MessageHeader {
    /// Serialized header size.
    pub const SIZE: usize = 8;

    /// Parse the leading 8 bytes of a frame.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] when fewer than 8 bytes are available.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < Self::SIZE {
            return Err(CodecError::Truncated {
                offset: 0,
                needed: Self::SIZE,
                available: bytes.len(),
            });
        }
        Ok(Self {
            version: bytes[0],
            msgtype: bytes[1],
            flags: u16::from_le_bytes([bytes[2], bytes[3]]),
            msglen: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }

    /// Serialize the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.version;
        out[1] = self.msgtype;
        out[2..4].copy_from_slice(&self.flags.to_le_bytes());
        out[4..8].copy_from_slice(&self.msglen.to_le_bytes());
        out
    }
}

/// Encode a value as a raw framed message.
///
/// # Errors
///
/// [`CodecError::UnknownSymbol`] for symbol indices foreign to `ctx`, or
/// [`CodecError::Framing`] when a length field overflows `u32`.
pub fn encode(k: &K, ctx: &SymbolContext, msgtype: MessageType) -> Result<Bytes, CodecError> {
    let mut payload = Vec::with_capacity(64);
    write_value(&mut payload, k, ctx)?;
    frame(&payload, msgtype, 0)
}

/// Encode a value, compressing the payload when the compressor accepts it.
///
/// Falls back to the raw encoding for payloads the compressor refuses
/// (too small, or not shrinking below half).
///
/// # Errors
///
/// As [`encode`].
pub fn encode_compressed(
    k: &K,
    ctx: &SymbolContext,
    msgtype: MessageType,
) -> Result<Bytes, CodecError> {
    let mut payload = Vec::with_capacity(64);
    write_value(&mut payload, k, ctx)?;
    match compress(&payload) {
        Some(compressed) => frame(&compressed, msgtype, 1),
        None => frame(&payload, msgtype, 0),
    }
}

fn frame(body: &[u8], msgtype: MessageType, flags: u16) -> Result<Bytes, CodecError> {
    let msglen = u32::try_from(MessageHeader::SIZE + body.len())
        .map_err(|_| CodecError::Framing("message length exceeds u32".to_owned()))?;
    let header = MessageHeader {
        version: PROTOCOL_VERSION,
        msgtype: msgtype.to_u8(),
        flags,
        msglen,
    };
    let mut out = Vec::with_capacity(msglen as usize);
    out.put_slice(&header.to_bytes());
    out.put_slice(body);
    Ok(Bytes::from(out))
}

/// Decode a complete framed message.
///
/// The buffer must hold at least `msglen` bytes; compressed payloads
/// (flags 1) are expanded first and then parsed as if raw.
///
/// # Errors
///
/// The taxonomy of §frame parsing: [`CodecError::Truncated`],
/// [`CodecError::UnsupportedFlags`], [`CodecError::Framing`] when the
/// payload does not consume exactly the declared length, plus any
/// recursive payload error.
pub fn decode(bytes: &[u8], ctx: &SymbolContext) -> Result<K, CodecError> {
    let header = MessageHeader::parse(bytes)?;
    let msglen = header.msglen as usize;
    if msglen < MessageHeader::SIZE {
        return Err(CodecError::Framing(format!(
            "declared length {msglen} is shorter than the header"
        )));
    }
    if bytes.len() < msglen {
        return Err(CodecError::Truncated { offset: 0, needed: msglen, available: bytes.len() });
    }
    let body = &bytes[MessageHeader::SIZE..msglen];
    match header.flags {
        0 => parse_payload(body, ctx),
        1 => {
            let expanded = decompress(body)?;
            parse_payload(&expanded, ctx)
        },
        flags => Err(CodecError::UnsupportedFlags { flags }),
    }
}

fn parse_payload(body: &[u8], ctx: &SymbolContext) -> Result<K, CodecError> {
    let (k, end) = read_value(body, 0, ctx)?;
    if end != body.len() {
        return Err(CodecError::Framing(format!(
            "payload consumed {end} of {} declared bytes",
            body.len()
        )));
    }
    Ok(k)
}

/// Append the payload encoding of `k` (type byte first) to `buf`.
///
/// # Errors
///
/// As [`encode`].
pub fn write_value(buf: &mut Vec<u8>, k: &K, ctx: &SymbolContext) -> Result<(), CodecError> {
    match k {
        K::Atom(a) => {
            buf.put_i8(a.tag());
            write_atom(buf, a, ctx)
        },
        K::Vector(v) => {
            buf.put_i8(v.tag());
            write_vector(buf, v, ctx)
        },
        K::List { attr, items } => {
            buf.put_i8(0);
            buf.put_u8(attr.to_u8());
            write_len(buf, items.len())?;
            for item in items {
                write_value(buf, item, ctx)?;
            }
            Ok(())
        },
        K::Dict(d) => write_dict(buf, d, ctx),
        K::Table(t) => {
            buf.put_i8(TypeTag::XT.to_i8());
            buf.put_u8(t.attr().to_u8());
            write_dict(buf, t.dict(), ctx)
        },
        K::Lambda(l) => {
            buf.put_i8(TypeTag::FN.to_i8());
            buf.put_slice(l.prelude());
            write_len(buf, l.body().len())?;
            buf.put_slice(l.body().as_bytes());
            Ok(())
        },
        K::Nil => {
            buf.put_i8(TypeTag::NIL.to_i8());
            buf.put_u8(0);
            Ok(())
        },
        K::Operator(op) => {
            buf.put_i8(TypeTag::OP.to_i8());
            buf.put_u8(*op);
            Ok(())
        },
        K::Error(msg) => {
            buf.put_i8(TypeTag::KRR.to_i8());
            buf.put_slice(msg.as_bytes());
            buf.put_u8(0);
            Ok(())
        },
    }
}

fn write_dict(buf: &mut Vec<u8>, d: &Dict, ctx: &SymbolContext) -> Result<(), CodecError> {
    buf.put_i8(if d.is_sorted() { TypeTag::SD.to_i8() } else { TypeTag::XD.to_i8() });
    write_value(buf, d.keys(), ctx)?;
    write_value(buf, d.values(), ctx)
}

fn write_atom(buf: &mut Vec<u8>, a: &Atom, ctx: &SymbolContext) -> Result<(), CodecError> {
    match a {
        Atom::Bool(b) => buf.put_u8(u8::from(*b)),
        Atom::Guid(u) => buf.put_slice(u.as_bytes()),
        Atom::Byte(v) | Atom::Char(v) => buf.put_u8(*v),
        Atom::Short(v) => buf.put_i16_le(*v),
        Atom::Int(v)
        | Atom::Month(v)
        | Atom::Date(v)
        | Atom::Minute(v)
        | Atom::Second(v)
        | Atom::Time(v) => buf.put_i32_le(*v),
        Atom::Long(v) | Atom::Timestamp(v) | Atom::Timespan(v) => buf.put_i64_le(*v),
        Atom::Real(v) => buf.put_f32_le(*v),
        Atom::Float(v) | Atom::Datetime(v) => buf.put_f64_le(*v),
        Atom::Sym(idx) => {
            let wire =
                ctx.wire_bytes(*idx).ok_or(CodecError::UnknownSymbol { index: *idx })?;
            buf.put_slice(&wire);
        },
    }
    Ok(())
}

fn write_vector(buf: &mut Vec<u8>, v: &Vector, ctx: &SymbolContext) -> Result<(), CodecError> {
    buf.put_u8(v.attr().to_u8());
    write_len(buf, v.len())?;
    match v {
        Vector::Bool(_, items) => {
            for b in items {
                buf.put_u8(u8::from(*b));
            }
        },
        Vector::Guid(_, items) => {
            for u in items {
                buf.put_slice(u.as_bytes());
            }
        },
        Vector::Byte(_, items) => buf.put_slice(items),
        Vector::Short(_, items) => {
            for x in items {
                buf.put_i16_le(*x);
            }
        },
        Vector::Int(_, items)
        | Vector::Month(_, items)
        | Vector::Date(_, items)
        | Vector::Minute(_, items)
        | Vector::Second(_, items)
        | Vector::Time(_, items) => {
            for x in items {
                buf.put_i32_le(*x);
            }
        },
        Vector::Long(_, items) | Vector::Timestamp(_, items) | Vector::Timespan(_, items) => {
            for x in items {
                buf.put_i64_le(*x);
            }
        },
        Vector::Real(_, items) => {
            for x in items {
                buf.put_f32_le(*x);
            }
        },
        Vector::Float(_, items) | Vector::Datetime(_, items) => {
            for x in items {
                buf.put_f64_le(*x);
            }
        },
        Vector::Char(_, text) => buf.put_slice(text.as_bytes()),
        Vector::Sym(_, items) => {
            for idx in items {
                let wire =
                    ctx.wire_bytes(*idx).ok_or(CodecError::UnknownSymbol { index: *idx })?;
                buf.put_slice(&wire);
            }
        },
        Vector::EnumSyms { items, .. } => {
            for x in items {
                buf.put_i64_le(*x);
            }
        },
    }
    Ok(())
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len)
        .map_err(|_| CodecError::Framing(format!("sequence length {len} exceeds u32")))?;
    buf.put_u32_le(len);
    Ok(())
}

/// Parse one value (type byte first) at `pos`, returning it together with
/// the offset just past it.
///
/// # Errors
///
/// The payload taxonomy: [`CodecError::UnknownType`],
/// [`CodecError::Truncated`], [`CodecError::InvalidUtf8`] and
/// [`CodecError::Framing`] for structural violations.
pub fn read_value(buf: &[u8], pos: usize, ctx: &SymbolContext) -> Result<(K, usize), CodecError> {
    need(buf, pos, 1)?;
    let t = buf[pos] as i8;
    let pos = pos + 1;
    match t {
        -128 => {
            let (text, pos) = read_nul_terminated(buf, pos)?;
            let msg = std::str::from_utf8(text)
                .map_err(|_| CodecError::InvalidUtf8 { what: "error text" })?;
            Ok((K::Error(msg.to_owned()), pos))
        },
        -19..=-1 => {
            let tag = TypeTag::from_i8(-t).ok_or(CodecError::UnknownType { tag: t })?;
            read_atom(tag, buf, pos, ctx).map(|(a, pos)| (K::Atom(a), pos))
        },
        0 => {
            let (attr, len, mut pos) = read_vector_prefix(buf, pos)?;
            let mut items = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                let (item, next) = read_value(buf, pos, ctx)?;
                items.push(item);
                pos = next;
            }
            Ok((K::List { attr, items }, pos))
        },
        1..=19 => {
            let tag = TypeTag::from_i8(t).ok_or(CodecError::UnknownType { tag: t })?;
            read_vector(tag, buf, pos, ctx)
        },
        20..=39 => {
            let (attr, len, pos) = read_vector_prefix(buf, pos)?;
            let (items, pos) = read_i64s(buf, pos, len)?;
            Ok((K::Vector(Vector::EnumSyms { tag: t, attr, items }), pos))
        },
        98 => {
            need(buf, pos, 1)?;
            let attr = read_attr(buf[pos])?;
            let (inner, pos) = read_value(buf, pos + 1, ctx)?;
            let K::Dict(d) = inner else {
                return Err(CodecError::Framing("table body is not a dictionary".to_owned()));
            };
            let table = Table::new(d).map_err(|e| CodecError::Framing(e.to_string()))?;
            Ok((K::Table(table.with_attr(attr)), pos))
        },
        99 | 127 => {
            let (keys, pos) = read_value(buf, pos, ctx)?;
            let (values, pos) = read_value(buf, pos, ctx)?;
            let d = Dict::from_wire(t == 127, keys, values)
                .map_err(|e| CodecError::Framing(e.to_string()))?;
            Ok((K::Dict(d), pos))
        },
        100 => {
            need(buf, pos, 1)?;
            let prelude_len = if buf[pos] == 0 { 3 } else { 4 };
            need(buf, pos, prelude_len)?;
            let prelude = buf[pos..pos + prelude_len].to_vec();
            let pos = pos + prelude_len;
            let (len, pos) = read_u32(buf, pos)?;
            let len = len as usize;
            need(buf, pos, len)?;
            let body = std::str::from_utf8(&buf[pos..pos + len])
                .map_err(|_| CodecError::InvalidUtf8 { what: "function body" })?;
            Ok((K::Lambda(Lambda::from_wire(prelude, body.to_owned())), pos + len))
        },
        101 => {
            need(buf, pos, 1)?;
            Ok((K::Nil, pos + 1))
        },
        102 => {
            need(buf, pos, 1)?;
            Ok((K::Operator(buf[pos]), pos + 1))
        },
        _ => Err(CodecError::UnknownType { tag: t }),
    }
}

fn read_atom(
    tag: TypeTag,
    buf: &[u8],
    pos: usize,
    ctx: &SymbolContext,
) -> Result<(Atom, usize), CodecError> {
    if tag == TypeTag::KS {
        let (text, pos) = read_nul_terminated(buf, pos)?;
        let idx = ctx.intern_bytes(text)?;
        return Ok((Atom::Sym(idx), pos));
    }
    let width = tag.atom_width().ok_or(CodecError::UnknownType { tag: -tag.to_i8() })?;
    need(buf, pos, width)?;
    let bytes = &buf[pos..pos + width];
    let atom = match tag {
        TypeTag::KB => Atom::Bool(bytes[0] != 0),
        TypeTag::UU => {
            let mut raw = [0u8; 16];
            raw.copy_from_slice(bytes);
            Atom::Guid(uuid::Uuid::from_bytes(raw))
        },
        TypeTag::KG => Atom::Byte(bytes[0]),
        TypeTag::KC => Atom::Char(bytes[0]),
        TypeTag::KH => Atom::Short(i16::from_le_bytes([bytes[0], bytes[1]])),
        TypeTag::KI => Atom::Int(le_i32(bytes)),
        TypeTag::KM => Atom::Month(le_i32(bytes)),
        TypeTag::KD => Atom::Date(le_i32(bytes)),
        TypeTag::KU => Atom::Minute(le_i32(bytes)),
        TypeTag::KV => Atom::Second(le_i32(bytes)),
        TypeTag::KT => Atom::Time(le_i32(bytes)),
        TypeTag::KJ => Atom::Long(le_i64(bytes)),
        TypeTag::KP => Atom::Timestamp(le_i64(bytes)),
        TypeTag::KN => Atom::Timespan(le_i64(bytes)),
        TypeTag::KE => Atom::Real(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        TypeTag::KF => Atom::Float(f64::from_bits(le_i64(bytes) as u64)),
        TypeTag::KZ => Atom::Datetime(f64::from_bits(le_i64(bytes) as u64)),
        _ => return Err(CodecError::UnknownType { tag: -tag.to_i8() }),
    };
    Ok((atom, pos + width))
}

fn read_vector(
    tag: TypeTag,
    buf: &[u8],
    pos: usize,
    ctx: &SymbolContext,
) -> Result<(K, usize), CodecError> {
    let (attr, len, pos) = read_vector_prefix(buf, pos)?;
    match tag {
        TypeTag::KB => {
            need(buf, pos, len)?;
            let items = buf[pos..pos + len].iter().map(|&b| b != 0).collect();
            Ok((K::Vector(Vector::Bool(attr, items)), pos + len))
        },
        TypeTag::UU => {
            let total = checked_total(len, 16, buf, pos)?;
            let items = buf[pos..pos + total]
                .chunks_exact(16)
                .map(|c| {
                    let mut raw = [0u8; 16];
                    raw.copy_from_slice(c);
                    uuid::Uuid::from_bytes(raw)
                })
                .collect();
            Ok((K::Vector(Vector::Guid(attr, items)), pos + total))
        },
        TypeTag::KG => {
            need(buf, pos, len)?;
            Ok((K::Vector(Vector::Byte(attr, buf[pos..pos + len].to_vec())), pos + len))
        },
        TypeTag::KC => {
            need(buf, pos, len)?;
            let text = std::str::from_utf8(&buf[pos..pos + len])
                .map_err(|_| CodecError::InvalidUtf8 { what: "char vector" })?;
            Ok((K::Vector(Vector::Char(attr, text.to_owned())), pos + len))
        },
        TypeTag::KS => {
            let mut items = Vec::with_capacity(len.min(4096));
            let mut pos = pos;
            for _ in 0..len {
                let (text, next) = read_nul_terminated(buf, pos)?;
                items.push(ctx.intern_bytes(text)?);
                pos = next;
            }
            Ok((K::Vector(Vector::Sym(attr, items)), pos))
        },
        TypeTag::KH => {
            let total = checked_total(len, 2, buf, pos)?;
            let items = buf[pos..pos + total]
                .chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]))
                .collect();
            Ok((K::Vector(Vector::Short(attr, items)), pos + total))
        },
        TypeTag::KI => {
            let (items, pos) = read_i32s(buf, pos, len)?;
            Ok((K::Vector(Vector::Int(attr, items)), pos))
        },
        TypeTag::KM => {
            let (items, pos) = read_i32s(buf, pos, len)?;
            Ok((K::Vector(Vector::Month(attr, items)), pos))
        },
        TypeTag::KD => {
            let (items, pos) = read_i32s(buf, pos, len)?;
            Ok((K::Vector(Vector::Date(attr, items)), pos))
        },
        TypeTag::KU => {
            let (items, pos) = read_i32s(buf, pos, len)?;
            Ok((K::Vector(Vector::Minute(attr, items)), pos))
        },
        TypeTag::KV => {
            let (items, pos) = read_i32s(buf, pos, len)?;
            Ok((K::Vector(Vector::Second(attr, items)), pos))
        },
        TypeTag::KT => {
            let (items, pos) = read_i32s(buf, pos, len)?;
            Ok((K::Vector(Vector::Time(attr, items)), pos))
        },
        TypeTag::KE => {
            let total = checked_total(len, 4, buf, pos)?;
            let items = buf[pos..pos + total]
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Ok((K::Vector(Vector::Real(attr, items)), pos + total))
        },
        TypeTag::KJ => {
            let (items, pos) = read_i64s(buf, pos, len)?;
            Ok((K::Vector(Vector::Long(attr, items)), pos))
        },
        TypeTag::KP => {
            let (items, pos) = read_i64s(buf, pos, len)?;
            Ok((K::Vector(Vector::Timestamp(attr, items)), pos))
        },
        TypeTag::KN => {
            let (items, pos) = read_i64s(buf, pos, len)?;
            Ok((K::Vector(Vector::Timespan(attr, items)), pos))
        },
        TypeTag::KF => {
            let (items, pos) = read_f64s(buf, pos, len)?;
            Ok((K::Vector(Vector::Float(attr, items)), pos))
        },
        TypeTag::KZ => {
            let (items, pos) = read_f64s(buf, pos, len)?;
            Ok((K::Vector(Vector::Datetime(attr, items)), pos))
        },
        _ => Err(CodecError::UnknownType { tag: tag.to_i8() }),
    }
}

fn read_vector_prefix(buf: &[u8], pos: usize) -> Result<(Attr, usize, usize), CodecError> {
    need(buf, pos, 5)?;
    let attr = read_attr(buf[pos])?;
    let len = u32::from_le_bytes([buf[pos + 1], buf[pos + 2], buf[pos + 3], buf[pos + 4]]);
    Ok((attr, len as usize, pos + 5))
}

fn read_attr(b: u8) -> Result<Attr, CodecError> {
    Attr::from_u8(b).ok_or_else(|| CodecError::Framing(format!("unknown attribute byte {b}")))
}

fn read_u32(buf: &[u8], pos: usize) -> Result<(u32, usize), CodecError> {
    need(buf, pos, 4)?;
    Ok((u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]), pos + 4))
}

fn read_i32s(buf: &[u8], pos: usize, len: usize) -> Result<(Vec<i32>, usize), CodecError> {
    let total = checked_total(len, 4, buf, pos)?;
    Ok((buf[pos..pos + total].chunks_exact(4).map(le_i32).collect(), pos + total))
}

fn read_i64s(buf: &[u8], pos: usize, len: usize) -> Result<(Vec<i64>, usize), CodecError> {
    let total = checked_total(len, 8, buf, pos)?;
    let items = buf[pos..pos + total].chunks_exact(8).map(le_i64).collect();
    Ok((items, pos + total))
}

fn read_f64s(buf: &[u8], pos: usize, len: usize) -> Result<(Vec<f64>, usize), CodecError> {
    let total = checked_total(len, 8, buf, pos)?;
    let items =
        buf[pos..pos + total].chunks_exact(8).map(|c| f64::from_bits(le_i64(c) as u64)).collect();
    Ok((items, pos + total))
}

fn le_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn le_i64(bytes: &[u8]) -> i64 {
    i64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

// element-count x width with overflow protection, verified against the
// remaining buffer before anything is allocated
fn checked_total(len: usize, width: usize, buf: &[u8], pos: usize) -> Result<usize, CodecError> {
    let total = len
        .checked_mul(width)
        .ok_or_else(|| CodecError::Framing(format!("vector of {len} x {width} bytes overflows")))?;
    need(buf, pos, total)?;
    Ok(total)
}

fn need(buf: &[u8], pos: usize, n: usize) -> Result<(), CodecError> {
    let available = buf.len().saturating_sub(pos);
    if available < n {
        return Err(CodecError::Truncated { offset: pos, needed: n, available });
    }
    Ok(())
}

fn read_nul_terminated(buf: &[u8], pos: usize) -> Result<(&[u8], usize), CodecError> {
    let rel = buf
        .get(pos..)
        .and_then(|tail| tail.iter().position(|&b| b == 0))
        .ok_or_else(|| CodecError::Truncated {
            offset: pos,
            needed: 1,
            available: buf.len().saturating_sub(pos),
        })?;
    Ok((&buf[pos..pos + rel], pos + rel + 1))
}
