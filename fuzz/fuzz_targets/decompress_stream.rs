//! Fuzz target for the LZ-style decompressor
//!
//! Malformed control bytes and back-references must surface as
//! `CodecError::Compression`, never as slice panics: the copy loop is
//! self-referential and every cursor is attacker-controlled.

#![no_main]

use libfuzzer_sys::fuzz_target;
use qipc_proto::decompress;

fuzz_target!(|data: &[u8]| {
    let _ = decompress(data);
});
