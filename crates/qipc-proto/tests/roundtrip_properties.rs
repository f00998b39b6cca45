//! Property-based round-trip tests.
//!
//! Every constructible value must survive `decode(encode(v)) == v`, and
//! the compressor must invert exactly whenever it accepts an input.

use proptest::collection::vec;
use proptest::prelude::*;
use qipc_proto::{
    Attr, Dict, K, MessageType, SymbolContext, compress, decode, decompress, encode,
    encode_compressed,
};

// symbol indices in generated values refer to this fixed pool
const SYM_POOL: [&str; 5] = ["", "a", "b", "price", "sym"];

fn ctx_with_pool() -> SymbolContext {
    let ctx = SymbolContext::new();
    for s in SYM_POOL {
        ctx.intern(s);
    }
    ctx
}

fn arb_attr() -> impl Strategy<Value = Attr> {
    prop_oneof![
        Just(Attr::None),
        Just(Attr::Sorted),
        Just(Attr::Unique),
        Just(Attr::Parted),
        Just(Attr::Grouped),
    ]
}

fn arb_atom() -> impl Strategy<Value = K> {
    let numeric = prop_oneof![
        any::<bool>().prop_map(K::bool_atom),
        any::<u8>().prop_map(K::byte),
        any::<i16>().prop_map(K::short),
        any::<i32>().prop_map(K::int),
        any::<i64>().prop_map(K::long),
        (-1.0e12f32..1.0e12).prop_map(K::real),
        (-1.0e12f64..1.0e12).prop_map(K::float),
        any::<u8>().prop_map(K::char_atom),
        (0..SYM_POOL.len() as u32).prop_map(K::sym_index),
        prop::array::uniform16(any::<u8>()).prop_map(|b| K::guid(uuid::Uuid::from_bytes(b))),
    ];
    let temporal = prop_oneof![
        any::<i64>().prop_map(K::timestamp),
        any::<i32>().prop_map(K::month),
        any::<i32>().prop_map(K::date),
        (-1.0e6f64..1.0e6).prop_map(K::datetime),
        any::<i64>().prop_map(K::timespan),
        any::<i32>().prop_map(K::minute),
        any::<i32>().prop_map(K::second),
        any::<i32>().prop_map(K::time),
    ];
    prop_oneof![numeric, temporal]
}

fn arb_vector() -> impl Strategy<Value = K> {
    let numeric = prop_oneof![
        vec(any::<bool>(), 0..8).prop_map(K::bool_vec),
        vec(any::<u8>(), 0..16).prop_map(K::byte_vec),
        vec(any::<i16>(), 0..8).prop_map(K::short_vec),
        vec(any::<i32>(), 0..8).prop_map(K::int_vec),
        vec(any::<i64>(), 0..8).prop_map(K::long_vec),
        vec(-1.0e12f32..1.0e12, 0..8).prop_map(K::real_vec),
        vec(-1.0e12f64..1.0e12, 0..8).prop_map(K::float_vec),
        "[a-z0-9 +*]{0,12}".prop_map(|s| K::char_vec(&s)),
        vec(0..SYM_POOL.len() as u32, 0..6).prop_map(K::sym_index_vec),
        vec(prop::array::uniform16(any::<u8>()), 0..4).prop_map(|raw| {
            K::guid_vec(raw.into_iter().map(uuid::Uuid::from_bytes).collect())
        }),
    ];
    let temporal = prop_oneof![
        vec(any::<i64>(), 0..8).prop_map(K::timestamp_vec),
        vec(any::<i32>(), 0..8).prop_map(K::date_vec),
        vec(any::<i64>(), 0..8).prop_map(K::timespan_vec),
        vec(any::<i32>(), 0..8).prop_map(K::minute_vec),
        (20i8..=39, vec(any::<i64>(), 0..6))
            .prop_map(|(t, items)| K::enum_sym_vec(t, items).unwrap()),
    ];
    (prop_oneof![numeric, temporal], arb_attr()).prop_map(|(v, attr)| v.with_attr(attr))
}

fn arb_lambda() -> impl Strategy<Value = K> {
    let prelude = prop_oneof![Just(vec![0u8, 10, 0]), Just(vec![1u8, 0, 10, 0])];
    (prelude, "[ -~]{0,24}").prop_map(|(p, body)| K::lambda(p, &body).unwrap())
}

fn arb_table() -> impl Strategy<Value = K> {
    (0usize..4, 0usize..4)
        .prop_flat_map(|(cols, rows)| {
            (
                vec(0..SYM_POOL.len() as u32, cols..=cols),
                vec(vec(any::<i64>(), rows..=rows), cols..=cols),
            )
        })
        .prop_map(|(names, columns)| {
            let values = K::list(columns.into_iter().map(K::long_vec).collect());
            K::table(Dict::new(K::sym_index_vec(names), values).unwrap()).unwrap()
        })
}

fn arb_dict() -> impl Strategy<Value = K> {
    (0usize..5)
        .prop_flat_map(|n| {
            (vec(0..SYM_POOL.len() as u32, n..=n), vec(any::<i64>(), n..=n))
        })
        .prop_map(|(keys, values)| {
            K::dict(K::sym_index_vec(keys), K::long_vec(values)).unwrap()
        })
}

fn arb_k() -> impl Strategy<Value = K> {
    let leaf = prop_oneof![
        arb_atom(),
        arb_vector(),
        arb_lambda(),
        Just(K::Nil),
        any::<u8>().prop_map(K::Operator),
        "[ -~]{0,16}".prop_map(|s| K::error(&s)),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            vec(inner, 0..4).prop_map(K::list),
            arb_dict(),
            arb_table(),
        ]
    })
}

proptest! {
    #[test]
    fn encode_decode_round_trip(k in arb_k()) {
        let ctx = ctx_with_pool();
        let wire = encode(&k, &ctx, MessageType::Async).unwrap();
        prop_assert_eq!(decode(&wire, &ctx).unwrap(), k);
    }

    #[test]
    fn encoding_is_deterministic(k in arb_k()) {
        let ctx = ctx_with_pool();
        let a = encode(&k, &ctx, MessageType::Sync).unwrap();
        let b = encode(&k, &ctx, MessageType::Sync).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn compressed_encoding_round_trips(k in arb_k()) {
        let ctx = ctx_with_pool();
        let wire = encode_compressed(&k, &ctx, MessageType::Response).unwrap();
        prop_assert_eq!(decode(&wire, &ctx).unwrap(), k);
    }

    #[test]
    fn compress_inverts_on_random_bytes(data in vec(any::<u8>(), 8..2048)) {
        if let Some(c) = compress(&data) {
            prop_assert_eq!(decompress(&c).unwrap(), data);
        }
    }

    /// Sparse buffers: mostly zeros with random patches, the shape the
    /// compressor is actually built for.
    #[test]
    fn compress_inverts_on_sparse_buffers(
        size in 8usize..10_000,
        patches in vec((any::<prop::sample::Index>(), any::<u8>()), 0..64),
    ) {
        let mut data = vec![0u8; size];
        for (idx, value) in patches {
            let i = idx.index(size);
            data[i] = value;
        }
        // incompressible is a valid outcome; only Some must invert
        if let Some(c) = compress(&data) {
            prop_assert_eq!(decompress(&c).unwrap(), data);
        }
    }

    #[test]
    fn decode_never_panics_on_noise(data in vec(any::<u8>(), 0..256)) {
        let ctx = SymbolContext::new();
        let _ = decode(&data, &ctx);
    }
}
