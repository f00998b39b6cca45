//! Dictionaries, tables and functions.
//!
//! Containers are composition of values: a dictionary pairs two sequences
//! of equal count, and a table wraps a dictionary whose keys are column
//! names and whose values are equal-length columns. Keyed tables are
//! ordinary dictionaries whose both sides are tables.

use crate::context::SymbolContext;
use crate::errors::ValueError;
use crate::tag::Attr;
use crate::value::{K, Vector};

/// A dictionary: parallel keys and values of equal count.
///
/// `sorted` selects the sorted/stepped wire tag (127) instead of the plain
/// one (99); sorted construction additionally requires the keys side to be
/// a table or to carry the `SORTED` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Dict {
    sorted: bool,
    keys: Box<K>,
    values: Box<K>,
}

impl Dict {
    /// Build a plain dictionary.
    ///
    /// # Errors
    ///
    /// - [`ValueError::Malformed`] when a side has no count (an atom).
    /// - [`ValueError::LengthMismatch`] when the sides disagree in count.
    pub fn new(keys: K, values: K) -> Result<Self, ValueError> {
        Self::build(false, keys, values)
    }

    /// Build a sorted/stepped dictionary.
    ///
    /// # Errors
    ///
    /// As [`Dict::new`], plus [`ValueError::Malformed`] when the keys side
    /// is neither a table nor a `SORTED`-attributed vector.
    pub fn sorted(keys: K, values: K) -> Result<Self, ValueError> {
        let ordered = match &keys {
            K::Table(_) => true,
            K::Vector(v) => v.attr() == Attr::Sorted,
            K::List { attr, .. } => *attr == Attr::Sorted,
            _ => false,
        };
        if !ordered {
            return Err(ValueError::Malformed(
                "sorted dictionary keys must be a table or carry the SORTED attribute".to_owned(),
            ));
        }
        Self::build(true, keys, values)
    }

    // Wire-side construction: count equality only, the peer's attribute
    // bytes are taken at face value.
    pub(crate) fn from_wire(sorted: bool, keys: K, values: K) -> Result<Self, ValueError> {
        Self::build(sorted, keys, values)
    }

    fn build(sorted: bool, keys: K, values: K) -> Result<Self, ValueError> {
        let nk = keys
            .count()
            .ok_or_else(|| ValueError::Malformed("dictionary keys must be a sequence".to_owned()))?;
        let nv = values.count().ok_or_else(|| {
            ValueError::Malformed("dictionary values must be a sequence".to_owned())
        })?;
        if nk != nv {
            return Err(ValueError::LengthMismatch(format!(
                "dictionary keys have {nk} elements, values have {nv}"
            )));
        }
        Ok(Self { sorted, keys: Box::new(keys), values: Box::new(values) })
    }

    /// Whether this is the sorted/stepped variant (wire tag 127).
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Keys side.
    #[must_use]
    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Values side.
    #[must_use]
    pub fn values(&self) -> &K {
        &self.values
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.count().unwrap_or(0)
    }

    /// Whether the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a value by key.
    ///
    /// Keys are compared by value; a heterogeneous keys side matches when
    /// it contains an equal atom (e.g. a symbol atom inside a list). The
    /// parallel values element is returned, cloned.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<K> {
        for i in 0..self.len() {
            if element(&self.keys, i).is_some_and(|candidate| candidate == *key) {
                return element(&self.values, i);
            }
        }
        None
    }

    /// Look up a symbol-keyed entry by its string form.
    ///
    /// Returns `None` when `name` was never interned in `ctx` (no symbol
    /// can compare equal then) or when no key matches.
    #[must_use]
    pub fn get_str(&self, ctx: &SymbolContext, name: &str) -> Option<K> {
        let idx = ctx.find(name)?;
        self.get(&K::sym_index(idx))
    }
}

/// Element `i` of a sequence-shaped value, cloned into a standalone `K`.
fn element(side: &K, i: usize) -> Option<K> {
    match side {
        K::Vector(v) => v.get_atom(i).map(K::Atom),
        K::List { items, .. } => items.get(i).cloned(),
        _ => None,
    }
}

/// A table: symbol column names over a list of equal-length columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    attr: Attr,
    dict: Dict,
}

impl Table {
    /// Build a table from a column dictionary.
    ///
    /// # Errors
    ///
    /// - [`ValueError::Malformed`] when the keys side is not a symbol
    ///   vector, the values side is not a list, or a column has no count.
    /// - [`ValueError::LengthMismatch`] when columns differ in length.
    pub fn new(dict: Dict) -> Result<Self, ValueError> {
        if !matches!(dict.keys(), K::Vector(Vector::Sym(..))) {
            return Err(ValueError::Malformed("table columns must be named by symbols".to_owned()));
        }
        let K::List { items: columns, .. } = dict.values() else {
            return Err(ValueError::Malformed("table values must be a column list".to_owned()));
        };
        let mut rows = None;
        for (i, column) in columns.iter().enumerate() {
            let n = column
                .count()
                .ok_or_else(|| ValueError::Malformed(format!("table column {i} is not a sequence")))?;
            match rows {
                None => rows = Some(n),
                Some(r) if r != n => {
                    return Err(ValueError::LengthMismatch(format!(
                        "table column {i} has {n} rows, expected {r}"
                    )));
                },
                Some(_) => {},
            }
        }
        Ok(Self { attr: Attr::None, dict })
    }

    /// Attribute byte (`SORTED` for `` `s# `` tables).
    #[must_use]
    pub fn attr(&self) -> Attr {
        self.attr
    }

    /// Replace the attribute byte.
    pub fn set_attr(&mut self, attr: Attr) {
        self.attr = attr;
    }

    /// Builder-style [`Table::set_attr`].
    #[must_use]
    pub fn with_attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }

    /// The underlying column dictionary.
    #[must_use]
    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    /// Row count: the length of the first column, 0 for no columns.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.dict.values() {
            K::List { items, .. } => items.first().and_then(K::count).unwrap_or(0),
            _ => 0,
        }
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column count.
    #[must_use]
    pub fn width(&self) -> usize {
        self.dict.len()
    }

    /// A column by name.
    #[must_use]
    pub fn column(&self, ctx: &SymbolContext, name: &str) -> Option<&K> {
        let idx = ctx.find(name)?;
        let K::Vector(Vector::Sym(_, names)) = self.dict.keys() else {
            return None;
        };
        let pos = names.iter().position(|&n| n == idx)?;
        match self.dict.values() {
            K::List { items, .. } => items.get(pos),
            _ => None,
        }
    }

    /// Column names, resolved through the context.
    #[must_use]
    pub fn column_names(&self, ctx: &SymbolContext) -> Vec<String> {
        match self.dict.keys() {
            K::Vector(Vector::Sym(_, names)) => {
                names.iter().map(|&n| ctx.lookup_str(n).unwrap_or_default()).collect()
            },
            _ => Vec::new(),
        }
    }
}

/// A function value (tag 100): opaque prelude bytes plus an ASCII body.
///
/// The prelude is 3 bytes when its first byte is 0, otherwise 4; that
/// observed behavior is preserved rather than interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
    prelude: Vec<u8>,
    body: String,
}

impl Lambda {
    /// Build a function value.
    ///
    /// # Errors
    ///
    /// [`ValueError::Malformed`] when the prelude shape is inconsistent
    /// (3 bytes iff the first byte is 0) or the body is not ASCII.
    pub fn new(prelude: Vec<u8>, body: &str) -> Result<Self, ValueError> {
        let expected = if prelude.first() == Some(&0) { 3 } else { 4 };
        if prelude.len() != expected {
            return Err(ValueError::Malformed(format!(
                "function prelude must be {expected} bytes for leading byte {:?}, got {}",
                prelude.first(),
                prelude.len()
            )));
        }
        if !body.is_ascii() {
            return Err(ValueError::Malformed("function body must be ASCII".to_owned()));
        }
        Ok(Self { prelude, body: body.to_owned() })
    }

    // Decoder-side construction; the shape is already enforced by the
    // prelude-length rule applied while reading.
    pub(crate) fn from_wire(prelude: Vec<u8>, body: String) -> Self {
        Self { prelude, body }
    }

    /// Prelude bytes (3 or 4).
    #[must_use]
    pub fn prelude(&self) -> &[u8] {
        &self.prelude
    }

    /// ASCII body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_rejects_unequal_sides() {
        let keys = K::long_vec(vec![1, 2, 3]);
        let values = K::long_vec(vec![1]);
        assert!(matches!(Dict::new(keys, values), Err(ValueError::LengthMismatch(_))));
    }

    #[test]
    fn dict_rejects_atom_sides() {
        assert!(matches!(
            Dict::new(K::long(1), K::long_vec(vec![1])),
            Err(ValueError::Malformed(_))
        ));
    }

    #[test]
    fn empty_dict_and_table() {
        let ctx = SymbolContext::new();
        let d = Dict::new(K::sym_vec(&ctx, &[]), K::list(vec![])).unwrap();
        assert_eq!(d.len(), 0);
        let t = Table::new(d).unwrap();
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn dict_lookup() {
        let ctx = SymbolContext::new();
        let keys = K::sym_vec(&ctx, &["a", "b"]);
        let values = K::int_vec(vec![2, 3]);
        let d = Dict::new(keys, values).unwrap();
        assert_eq!(d.get_str(&ctx, "a"), Some(K::int(2)));
        assert_eq!(d.get_str(&ctx, "b"), Some(K::int(3)));
        assert_eq!(d.get_str(&ctx, "z"), None);
    }

    #[test]
    fn dict_lookup_heterogeneous_keys() {
        let ctx = SymbolContext::new();
        let keys = K::list(vec![K::long(7), K::sym(&ctx, "name")]);
        let values = K::list(vec![K::long(1), K::char_vec("x")]);
        let d = Dict::new(keys, values).unwrap();
        assert_eq!(d.get_str(&ctx, "name"), Some(K::char_vec("x")));
        assert_eq!(d.get(&K::long(7)), Some(K::long(1)));
    }

    #[test]
    fn sorted_dict_requires_order_evidence() {
        let ctx = SymbolContext::new();
        let plain = K::sym_vec(&ctx, &["a", "b"]);
        assert!(Dict::sorted(plain, K::int_vec(vec![1, 2])).is_err());

        let sorted = K::sym_vec(&ctx, &["a", "b"]).with_attr(Attr::Sorted);
        assert!(Dict::sorted(sorted, K::int_vec(vec![1, 2])).is_ok());
    }

    #[test]
    fn table_conformance() {
        let ctx = SymbolContext::new();
        let keys = K::sym_vec(&ctx, &["a", "b"]);
        let values = K::list(vec![K::int_vec(vec![1, 2]), K::int_vec(vec![3])]);
        let d = Dict::new(keys, values).unwrap();
        assert!(matches!(Table::new(d), Err(ValueError::LengthMismatch(_))));

        let keys = K::sym_vec(&ctx, &["a", "b"]);
        let values = K::list(vec![K::int_vec(vec![1, 2]), K::int_vec(vec![3, 4])]);
        let t = Table::new(Dict::new(keys, values).unwrap()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.width(), 2);
        assert_eq!(t.column(&ctx, "b"), Some(&K::int_vec(vec![3, 4])));
    }

    #[test]
    fn table_requires_symbol_columns() {
        let d = Dict::new(K::short_vec(vec![]), K::short_vec(vec![])).unwrap();
        assert!(matches!(Table::new(d), Err(ValueError::Malformed(_))));
    }

    #[test]
    fn lambda_prelude_shape() {
        assert!(Lambda::new(vec![0, 10, 0], "{x+y}").is_ok());
        assert!(Lambda::new(vec![1, 0, 10, 0], "{x+y}").is_ok());
        assert!(Lambda::new(vec![0, 10, 0, 0], "{x+y}").is_err());
        assert!(Lambda::new(vec![1, 10, 0], "{x+y}").is_err());
        assert!(Lambda::new(vec![0, 10, 0], "caf\u{e9}").is_err());
    }
}
