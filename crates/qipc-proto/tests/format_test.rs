//! Formatter output contracts.

use qipc_proto::format::{AsciiFormatter, HtmlFormatter};
use qipc_proto::{Dict, K, SymbolContext, decode};

fn table(ctx: &SymbolContext, names: &[&str], columns: Vec<K>) -> K {
    K::table(Dict::new(K::sym_vec(ctx, names), K::list(columns)).unwrap()).unwrap()
}

#[test]
fn unkeyed_table() {
    let fmt = AsciiFormatter::new().height(8);
    let ctx = SymbolContext::new();

    // ([]a:enlist 2i;b:enlist 3i)
    let t = table(&ctx, &["a", "b"], vec![K::int_vec(vec![2]), K::int_vec(vec![3])]);
    assert_eq!(fmt.format(&t, &ctx), "a b\n---\n2 3");

    // first column pushed out by its name, second by a value width
    let t = table(
        &ctx,
        &["alpha", "b", "cheese"],
        vec![
            K::int_vec(vec![0, 1, 2]),
            K::int_vec(vec![0, 17, 0]),
            K::int_vec(vec![0, 0, 0]),
        ],
    );
    let expected =
        "alpha b  cheese\n---------------\n0     0  0     \n1     17 0     \n2     0  0     ";
    assert_eq!(fmt.format(&t, &ctx), expected);
}

#[test]
fn unkeyed_table_elides_the_middle() {
    let fmt = AsciiFormatter::new().height(8);
    let ctx = SymbolContext::new();

    let mut column = vec![0i32; 50];
    column[49] = 49;
    let t = table(&ctx, &["long"], vec![K::int_vec(column)]);
    let expected = "long\n----\n0   \n0   \n... \n0   \n49  ";
    assert_eq!(fmt.format(&t, &ctx), expected);
}

#[test]
fn unkeyed_table_html() {
    let fmt = HtmlFormatter::new().table_class("table table-striped table-condensed").indent(2);
    let ctx = SymbolContext::new();

    // ([]a:2 1i;b:3 4i)
    let t = table(&ctx, &["a", "b"], vec![K::int_vec(vec![2, 1]), K::int_vec(vec![3, 4])]);
    let expected = r#"<table class="table table-striped table-condensed">
  <thead>
    <tr>
      <th>a</th>
      <th>b</th>
    </tr>
  </thead>
  <tr>
    <td>2</td>
    <td>3</td>
  </tr>
  <tr>
    <td>1</td>
    <td>4</td>
  </tr>
</table>"#;
    assert_eq!(fmt.format(&t, &ctx), expected);
}

#[test]
fn html_escapes_cells() {
    let fmt = HtmlFormatter::new().indent(2);
    let ctx = SymbolContext::new();

    let t = table(
        &ctx,
        &["a", "b"],
        vec![
            K::int_vec(vec![2, 1]),
            K::sym_vec(&ctx, &["hi", "<script>alert(1)</script>"]),
        ],
    );
    let expected = r#"<table>
  <thead>
    <tr>
      <th>a</th>
      <th>b</th>
    </tr>
  </thead>
  <tr>
    <td>2</td>
    <td>hi</td>
  </tr>
  <tr>
    <td>1</td>
    <td>&lt;script&gt;alert(1)&lt;/script&gt;</td>
  </tr>
</table>"#;
    assert_eq!(fmt.format(&t, &ctx), expected);
}

#[test]
fn keyed_table() {
    let ctx = SymbolContext::new();
    // ([a:enlist 2i]b:enlist 3i), decoded from captured bytes
    let t = decode(
        &hex::decode(
            "010000003f000000636200630b00010000006100000001000000060001000000020000006200630b0001000000620000000100000006000100000003000000",
        )
        .unwrap(),
        &ctx,
    )
    .unwrap();
    assert_eq!(AsciiFormatter::new().format(&t, &ctx), "a| b\n-|--\n2| 3");
}

#[test]
fn keyed_table_html() {
    let ctx = SymbolContext::new();
    let t = decode(
        &hex::decode(
            "010000003f000000636200630b00010000006100000001000000060001000000020000006200630b0001000000620000000100000006000100000003000000",
        )
        .unwrap(),
        &ctx,
    )
    .unwrap();
    let expected = r#"<table class="table">
  <thead>
    <tr>
      <th>a</th>
      <th>b</th>
    </tr>
  </thead>
  <tr>
    <th>2</th>
    <td>3</td>
  </tr>
</table>"#;
    assert_eq!(HtmlFormatter::new().table_class("table").format(&t, &ctx), expected);
}

#[test]
fn keyed_table_with_nested_and_temporal_columns() {
    let ctx = SymbolContext::new();

    let key_table = table(
        &ctx,
        &["envelope_id"],
        vec![K::guid_vec(vec![
            uuid::Uuid::parse_str("2d948578-e9d6-79a2-8207-9df7a71f0b3b").unwrap(),
            uuid::Uuid::parse_str("409031f3-b19c-6770-ee84-6e9369c98697").unwrap(),
        ])],
    );
    let val_table = table(
        &ctx,
        &["payload", "time"],
        vec![
            K::list(vec![K::char_vec("abc"), K::char_vec("xy")]),
            K::timestamp_vec(vec![769_043_599_044_908_000, 769_043_599_044_908_000]),
        ],
    );
    let kt = K::dict(key_table, val_table).unwrap();

    let expected = "envelope_id                         | payload time                         \n------------------------------------|--------------------------------------\n2d948578-e9d6-79a2-8207-9df7a71f0b3b| abc     2024.05.14D23:13:19:044908000\n409031f3-b19c-6770-ee84-6e9369c98697| xy      2024.05.14D23:13:19:044908000";
    assert_eq!(AsciiFormatter::new().format(&kt, &ctx), expected);
}

#[test]
fn dict_layouts() {
    let ctx = SymbolContext::new();
    let fmt = AsciiFormatter::new();

    let d = K::dict(K::long_vec(vec![3, 612, 6]), K::sym_vec(&ctx, &["hi", "p", "dog"])).unwrap();
    assert_eq!(fmt.format(&d, &ctx), "3  | hi\n612| p\n6  | dog");

    let d = K::dict(
        K::long_vec(vec![3, 612, 6]),
        K::list(vec![K::long(56), K::sym(&ctx, "xray"), K::guid(uuid::Uuid::nil())]),
    )
    .unwrap();
    assert_eq!(
        fmt.format(&d, &ctx),
        "3  | 56\n612| xray\n6  | 00000000-0000-0000-0000-000000000000"
    );
}

#[test]
fn dict_html() {
    let ctx = SymbolContext::new();
    let d = K::dict(
        K::long_vec(vec![3, 612, 6]),
        K::list(vec![K::long(56), K::sym(&ctx, "xray"), K::guid(uuid::Uuid::nil())]),
    )
    .unwrap();
    let expected = r#"<dl>
  <dt>3</dt>
  <dd>56</dd>
  <dt>612</dt>
  <dd>xray</dd>
  <dt>6</dt>
  <dd>00000000-0000-0000-0000-000000000000</dd>
</dl>"#;
    assert_eq!(HtmlFormatter::new().format(&d, &ctx), expected);
}

#[test]
fn atoms_vectors_and_sentinels() {
    let ctx = SymbolContext::new();
    let fmt = AsciiFormatter::new().height(8);

    let p = K::timestamp(1_000_000_000);
    assert_eq!(fmt.format(&p, &ctx), "2000.01.01D00:00:01:000000000");

    // square brackets expose the mixed-type nature of lists
    let p = K::list(vec![K::long(5), K::sym(&ctx, "hello")]);
    assert_eq!(fmt.format(&p, &ctx), "[5, hello]");

    let p = K::long_vec((0..20).collect());
    assert_eq!(fmt.format(&p, &ctx), "0 1 ... 18 19");

    assert_eq!(fmt.format(&K::long(-9_223_372_036_854_775_807), &ctx), "-0W");
    assert_eq!(fmt.format(&K::long(i64::MIN), &ctx), "");
    assert_eq!(fmt.format(&K::long(i64::MAX), &ctx), "0W");
}
