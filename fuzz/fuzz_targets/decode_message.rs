//! Fuzz target for message decoding
//!
//! Feeds arbitrary byte sequences to the framed decoder to find:
//! - Parser crashes or panics
//! - Integer overflows in length arithmetic
//! - Oversized allocations from forged vector lengths
//! - Buffer over-reads in NUL-terminated symbol scanning
//!
//! The fuzzer should NEVER panic. All invalid inputs must return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qipc_proto::{decode, SymbolContext};

fuzz_target!(|data: &[u8]| {
    let ctx = SymbolContext::new();
    // must never panic, only return Err for invalid data
    let _ = decode(data, &ctx);
});
