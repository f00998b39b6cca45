//! The IPC compression format.
//!
//! An LZ-family scheme tuned for the protocol's repetitive typed
//! payloads: a 256-slot hash table keyed by the XOR of two adjacent
//! output bytes, a control byte of eight LSB-first instruction bits, and
//! two-byte `{slot, extra}` back-references copying `extra + 2` bytes of
//! already-produced output.
//!
//! Back-references may overlap their own output (start 8 bytes back, copy
//! 64 bytes, get a repeating pattern), so the copy loop moves one byte at
//! a time; a block move produces wrong output whenever the shift is
//! smaller than the length.
//!
//! The compressed stream opens with a little-endian `u32` holding the
//! uncompressed size plus 8.

use crate::errors::CodecError;

fn overrun(what: &str, at: usize) -> CodecError {
    CodecError::Compression(format!("{what} at offset {at}"))
}

/// Decompress a complete compressed payload.
///
/// Produces exactly `header - 8` bytes, where `header` is the leading
/// little-endian `u32`.
///
/// # Errors
///
/// [`CodecError::Compression`] when the stream runs out of input bytes,
/// a back-reference escapes the produced output, or the size header is
/// shorter than its own bias.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    if data.len() < 4 {
        return Err(overrun("missing size header", 0));
    }
    let raw = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let Some(uncomp_sz) = (raw as usize).checked_sub(8) else {
        return Err(CodecError::Compression(format!("size header {raw} below bias")));
    };

    let mut dst = vec![0u8; uncomp_sz];
    let mut hashpos = [0usize; 256];
    let mut d = 4; // read position in data
    let mut s = 0; // write position in dst
    let mut p = 0; // hash cursor in dst
    let mut f = 0u8; // current instruction byte
    let mut i = 0u8; // one-hot bit position within f

    while s < uncomp_sz {
        if i == 0 {
            f = *data.get(d).ok_or_else(|| overrun("instruction byte past input", d))?;
            d += 1;
            i = 1;
        }

        let copied;
        if f & i != 0 {
            // {slot}{extra}: copy extra + 2 bytes of produced output
            let slot = *data.get(d).ok_or_else(|| overrun("back-reference past input", d))?;
            let extra =
                *data.get(d + 1).ok_or_else(|| overrun("back-reference past input", d + 1))? as usize;
            let r = hashpos[slot as usize];
            if s + 2 + extra > uncomp_sz {
                return Err(overrun("back-reference past output", s));
            }
            // overlapping self-copy: must move bytewise
            for m in 0..2 + extra {
                dst[s + m] = dst[r + m];
            }
            d += 2;
            s += 2;
            copied = extra;
        } else {
            let b = *data.get(d).ok_or_else(|| overrun("literal past input", d))?;
            dst[s] = b;
            d += 1;
            s += 1;
            copied = 0;
        }

        // hash every adjacent pair produced so far, except that only the
        // first two bytes of a back-copy participate
        while p + 1 < s {
            hashpos[(dst[p] ^ dst[p + 1]) as usize] = p;
            p += 1;
        }
        s += copied;
        if f & i != 0 {
            p = s;
        }

        i = i.wrapping_shl(1);
    }

    Ok(dst)
}

/// Compress a payload, or report that it is not worth compressing.
///
/// Returns `None` for inputs shorter than 8 bytes and whenever the
/// compressed form would reach half the input size (the caller falls back
/// to the raw encoding).
#[must_use]
pub fn compress(y: &[u8]) -> Option<Vec<u8>> {
    if y.len() < 8 {
        return None;
    }

    let t = y.len();
    let mut wr = vec![0u8; t / 2];
    wr[0..4].copy_from_slice(&((t + 8) as u32).to_le_bytes());

    let mut i = 128u32; // one-hot bit position, forces a flush on entry
    let mut f = 0u8; // pending instruction bits
    let mut h0 = 0usize; // deferred hash-slot writeback
    let mut s0 = 0usize;
    let mut s = 0; // read position in y
    let mut d = 4; // write position in wr
    let mut c = 4; // position of the current control byte
    let mut a = [0usize; 256]; // hash buckets

    while s < t {
        i *= 2;
        if i == 256 {
            // 8 x 2 data bytes plus the next control byte must fit
            if d > wr.len().saturating_sub(17) {
                return None;
            }
            i = 1;
            wr[c] = f;
            c = d;
            d += 1;
            f = 0;
        }

        let mut h = 0usize;
        let mut p = 0usize;
        let literal = if s > t - 3 {
            true
        } else {
            h = (y[s] ^ y[s + 1]) as usize;
            p = a[h];
            // the hash covers both bytes, so a matching hash with a
            // matching first byte cannot be a collision
            p == 0 || y[s] != y[p]
        };

        if s0 > 0 {
            a[h0] = s0;
            s0 = 0;
        }

        if literal {
            h0 = h;
            s0 = s;
            wr[d] = y[s];
            d += 1;
            s += 1;
        } else {
            a[h] = s;
            f |= i as u8;
            p += 2;
            s += 2;
            let run_start = s;
            let q = (s + 255).min(t) - 1;
            while y[p] == y[s] && s < q {
                p += 1;
                s += 1;
            }
            wr[d] = h as u8;
            wr[d + 1] = (s - run_start) as u8;
            d += 2;
        }
    }

    wr[c] = f;
    wr.truncate(d);
    Some(wr)
}

#[cfg(test)]
mod tests {
    use super::*;

    // captured from a q process returning 500#0j
    const ZEROS_500: &str = "ae0f0000c00700f401000000ff00ffff00ff00ff00ff00ff00ff00ff00ff00ff3f00ff00ff00ff00ff00ff008f";

    #[test]
    fn decompress_all_zero_longs() {
        let data = hex::decode(ZEROS_500).unwrap();
        let out = decompress(&data).unwrap();
        // attr byte + u32 count + 500 longs, plus the payload type byte
        assert_eq!(out.len(), 0x0fae - 8);
        assert_eq!(out[0], 7);
        assert!(out[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn decompress_rejects_truncated_stream() {
        let data = hex::decode(ZEROS_500).unwrap();
        let err = decompress(&data[..data.len() - 4]).unwrap_err();
        assert!(matches!(err, CodecError::Compression(_)));
    }

    #[test]
    fn decompress_rejects_short_header() {
        assert!(decompress(&[1, 0]).is_err());
        assert!(decompress(&[4, 0, 0, 0]).is_err());
    }

    #[test]
    fn round_trip_repetitive_buffer() {
        let y: Vec<u8> = (0..4096u32).map(|i| (i % 16) as u8).collect();
        let c = compress(&y).expect("repetitive data should compress");
        assert!(c.len() <= y.len() / 2);
        assert_eq!(decompress(&c).unwrap(), y);
    }

    #[test]
    fn round_trip_self_referential_runs() {
        // long zero runs force back-references that copy their own output
        let mut y = vec![0u8; 3000];
        y[0] = 9;
        y[1500] = 7;
        let c = compress(&y).expect("zero runs should compress");
        assert_eq!(decompress(&c).unwrap(), y);
    }

    #[test]
    fn incompressible_input_is_refused() {
        // a de Bruijn-ish ramp never repeats a 2-byte window usefully
        let y: Vec<u8> = (0..512u32).map(|i| (i * 7 + (i >> 3)) as u8).collect();
        if let Some(c) = compress(&y) {
            assert_eq!(decompress(&c).unwrap(), y);
        }
    }

    #[test]
    fn tiny_inputs_are_refused() {
        assert_eq!(compress(&[1, 2, 3]), None);
        assert_eq!(compress(&[]), None);
    }
}
