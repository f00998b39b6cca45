//! Fuzz target for decode/encode agreement
//!
//! Any bytes the decoder accepts must re-encode to a value the decoder
//! accepts again, and the two decoded values must be equal. This catches
//! asymmetries between the read and write paths (attribute bytes,
//! enumeration tags, lambda preludes).

#![no_main]

use libfuzzer_sys::fuzz_target;
use qipc_proto::{decode, encode, MessageType, SymbolContext};

fuzz_target!(|data: &[u8]| {
    let ctx = SymbolContext::new();
    if let Ok(value) = decode(data, &ctx) {
        let wire = encode(&value, &ctx, MessageType::Async).expect("re-encode decoded value");
        let again = decode(&wire, &ctx).expect("decode re-encoded value");
        assert_eq!(value, again);
    }
});
