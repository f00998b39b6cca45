//! The polymorphic K value model.
//!
//! A [`K`] is a tagged variant spanning the protocol's atoms, homogeneous
//! vectors, heterogeneous lists, dictionaries, tables, functions and the
//! remaining one-byte oddities. All accessors are pattern matches: calling
//! an accessor on a value of a different tag is a clean
//! [`ValueError::WrongType`], never a coercion.
//!
//! Equality is structural. Within a shared [`SymbolContext`] this
//! coincides with byte-equality of the canonical encodings, because
//! symbols are stored as interning indices and everything else serializes
//! from its in-memory representation.

mod atom;
mod dict;
mod vector;

pub use atom::Atom;
pub use dict::{Dict, Lambda, Table};
pub use vector::Vector;

use uuid::Uuid;

use crate::context::SymbolContext;
use crate::errors::ValueError;
use crate::tag::{Attr, TypeTag};

/// A value of the kdb+ IPC value model.
#[derive(Debug, Clone, PartialEq)]
pub enum K {
    /// A scalar (negative wire tag).
    Atom(Atom),
    /// A homogeneous vector (positive wire tag).
    Vector(Vector),
    /// A heterogeneous list (tag 0).
    List {
        /// Attribute byte.
        attr: Attr,
        /// The elements, each a full value.
        items: Vec<K>,
    },
    /// A dictionary (tag 99) or sorted dictionary (tag 127).
    Dict(Dict),
    /// A table (tag 98).
    Table(Table),
    /// A function (tag 100).
    Lambda(Lambda),
    /// Nil / generic identity (tag 101).
    Nil,
    /// A built-in operator (tag 102).
    Operator(u8),
    /// A remote error (tag -128).
    Error(String),
}

macro_rules! atom_ctors {
    ($($(#[$doc:meta])* $name:ident: $variant:ident => $ty:ty,)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(v: $ty) -> Self {
                Self::Atom(Atom::$variant(v))
            }
        )*
    };
}

macro_rules! vector_ctors {
    ($($(#[$doc:meta])* $name:ident: $variant:ident => $ty:ty,)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(items: Vec<$ty>) -> Self {
                Self::Vector(Vector::$variant(Attr::None, items))
            }
        )*
    };
}

macro_rules! atom_accessors {
    ($($(#[$doc:meta])* $name:ident: $variant:ident => $ty:ty,)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<$ty, ValueError> {
                match self {
                    Self::Atom(Atom::$variant(v)) => Ok(*v),
                    other => Err(ValueError::wrong_type(stringify!($name), other.tag())),
                }
            }
        )*
    };
}

macro_rules! vector_accessors {
    ($($(#[$doc:meta])* $name:ident, $name_mut:ident: $variant:ident => $ty:ty,)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<&[$ty], ValueError> {
                match self {
                    Self::Vector(Vector::$variant(_, v)) => Ok(v),
                    other => Err(ValueError::wrong_type(stringify!($name), other.tag())),
                }
            }

            #[doc = concat!("Mutable counterpart of [`K::", stringify!($name), "`].")]
            pub fn $name_mut(&mut self) -> Result<&mut Vec<$ty>, ValueError> {
                match self {
                    Self::Vector(Vector::$variant(_, v)) => Ok(v),
                    other => Err(ValueError::wrong_type(stringify!($name_mut), other.tag())),
                }
            }
        )*
    };
}

impl K {
    atom_ctors! {
        /// Boolean atom.
        bool_atom: Bool => bool,
        /// GUID atom.
        guid: Guid => Uuid,
        /// Byte atom.
        byte: Byte => u8,
        /// Short atom.
        short: Short => i16,
        /// Int atom.
        int: Int => i32,
        /// Long atom.
        long: Long => i64,
        /// Real atom.
        real: Real => f32,
        /// Float atom.
        float: Float => f64,
        /// Char atom (one byte on the wire).
        char_atom: Char => u8,
        /// Symbol atom from an existing interning index.
        sym_index: Sym => u32,
        /// Timestamp atom, nanoseconds from 2000.01.01.
        timestamp: Timestamp => i64,
        /// Month atom, months from 2000.01.
        month: Month => i32,
        /// Date atom, days from 2000.01.01.
        date: Date => i32,
        /// Datetime atom, fractional days from 2000.01.01.
        datetime: Datetime => f64,
        /// Timespan atom, nanoseconds.
        timespan: Timespan => i64,
        /// Minute atom.
        minute: Minute => i32,
        /// Second atom.
        second: Second => i32,
        /// Time atom, milliseconds.
        time: Time => i32,
    }

    /// Symbol atom, interning `s` in `ctx`.
    #[must_use]
    pub fn sym(ctx: &SymbolContext, s: &str) -> Self {
        Self::Atom(Atom::Sym(ctx.intern(s)))
    }

    /// Integer-valued atom built dynamically with range checking.
    ///
    /// # Errors
    ///
    /// See [`Atom::from_i64`].
    pub fn atom_from_i64(tag: TypeTag, value: i64) -> Result<Self, ValueError> {
        Atom::from_i64(tag, value).map(Self::Atom)
    }

    vector_ctors! {
        /// Boolean vector.
        bool_vec: Bool => bool,
        /// GUID vector.
        guid_vec: Guid => Uuid,
        /// Byte vector.
        byte_vec: Byte => u8,
        /// Short vector.
        short_vec: Short => i16,
        /// Int vector.
        int_vec: Int => i32,
        /// Long vector.
        long_vec: Long => i64,
        /// Real vector.
        real_vec: Real => f32,
        /// Float vector.
        float_vec: Float => f64,
        /// Timestamp vector.
        timestamp_vec: Timestamp => i64,
        /// Month vector.
        month_vec: Month => i32,
        /// Date vector.
        date_vec: Date => i32,
        /// Datetime vector.
        datetime_vec: Datetime => f64,
        /// Timespan vector.
        timespan_vec: Timespan => i64,
        /// Minute vector.
        minute_vec: Minute => i32,
        /// Second vector.
        second_vec: Second => i32,
        /// Time vector.
        time_vec: Time => i32,
    }

    /// Char vector from UTF-8 text (wire length is the byte count).
    #[must_use]
    pub fn char_vec(text: &str) -> Self {
        Self::Vector(Vector::Char(Attr::None, text.to_owned()))
    }

    /// Symbol vector, interning every element in `ctx`.
    #[must_use]
    pub fn sym_vec(ctx: &SymbolContext, names: &[&str]) -> Self {
        Self::Vector(Vector::Sym(Attr::None, names.iter().map(|s| ctx.intern(s)).collect()))
    }

    /// Symbol vector from existing interning indices.
    #[must_use]
    pub fn sym_index_vec(indices: Vec<u32>) -> Self {
        Self::Vector(Vector::Sym(Attr::None, indices))
    }

    /// Enumerated-symbol vector (wire tags `20..=39`).
    ///
    /// # Errors
    ///
    /// [`ValueError::Malformed`] when `tag` is outside `20..=39`.
    pub fn enum_sym_vec(tag: i8, items: Vec<i64>) -> Result<Self, ValueError> {
        Ok(Self::Vector(Vector::EnumSyms { tag: Vector::enum_tag(tag)?, attr: Attr::None, items }))
    }

    /// Heterogeneous list.
    #[must_use]
    pub fn list(items: Vec<K>) -> Self {
        Self::List { attr: Attr::None, items }
    }

    /// Dictionary from parallel sequences.
    ///
    /// # Errors
    ///
    /// See [`Dict::new`].
    pub fn dict(keys: K, values: K) -> Result<Self, ValueError> {
        Dict::new(keys, values).map(Self::Dict)
    }

    /// Sorted/stepped dictionary from parallel sequences.
    ///
    /// # Errors
    ///
    /// See [`Dict::sorted`].
    pub fn sorted_dict(keys: K, values: K) -> Result<Self, ValueError> {
        Dict::sorted(keys, values).map(Self::Dict)
    }

    /// Table from a column dictionary.
    ///
    /// # Errors
    ///
    /// See [`Table::new`].
    pub fn table(dict: Dict) -> Result<Self, ValueError> {
        Table::new(dict).map(Self::Table)
    }

    /// Function value.
    ///
    /// # Errors
    ///
    /// See [`Lambda::new`].
    pub fn lambda(prelude: Vec<u8>, body: &str) -> Result<Self, ValueError> {
        Lambda::new(prelude, body).map(Self::Lambda)
    }

    /// Remote error value.
    #[must_use]
    pub fn error(message: &str) -> Self {
        Self::Error(message.to_owned())
    }

    /// Raw wire tag of this value.
    #[must_use]
    pub fn tag(&self) -> i8 {
        match self {
            Self::Atom(a) => a.tag(),
            Self::Vector(v) => v.tag(),
            Self::List { .. } => 0,
            Self::Dict(d) => {
                if d.is_sorted() {
                    TypeTag::SD.to_i8()
                } else {
                    TypeTag::XD.to_i8()
                }
            },
            Self::Table(_) => TypeTag::XT.to_i8(),
            Self::Lambda(_) => TypeTag::FN.to_i8(),
            Self::Nil => TypeTag::NIL.to_i8(),
            Self::Operator(_) => TypeTag::OP.to_i8(),
            Self::Error(_) => TypeTag::KRR.to_i8(),
        }
    }

    /// Element count for sequence-shaped values.
    ///
    /// Vectors and lists count elements, dictionaries count entries,
    /// tables count rows. Atoms and the one-byte values have no count.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Vector(v) => Some(v.len()),
            Self::List { items, .. } => Some(items.len()),
            Self::Dict(d) => Some(d.len()),
            Self::Table(t) => Some(t.len()),
            _ => None,
        }
    }

    /// Attribute byte for vectors, lists and tables.
    #[must_use]
    pub fn attr(&self) -> Option<Attr> {
        match self {
            Self::Vector(v) => Some(v.attr()),
            Self::List { attr, .. } => Some(*attr),
            Self::Table(t) => Some(t.attr()),
            _ => None,
        }
    }

    /// Builder-style attribute assignment; no-op on attribute-less values.
    #[must_use]
    pub fn with_attr(mut self, new: Attr) -> Self {
        match &mut self {
            Self::Vector(v) => v.set_attr(new),
            Self::List { attr, .. } => *attr = new,
            Self::Table(t) => t.set_attr(new),
            _ => {},
        }
        self
    }

    atom_accessors! {
        /// Boolean atom value.
        as_bool: Bool => bool,
        /// GUID atom value.
        as_guid: Guid => Uuid,
        /// Byte atom value.
        as_byte: Byte => u8,
        /// Short atom value.
        as_short: Short => i16,
        /// Int atom value.
        as_int: Int => i32,
        /// Long atom value.
        as_long: Long => i64,
        /// Real atom value.
        as_real: Real => f32,
        /// Float atom value.
        as_float: Float => f64,
        /// Char atom value.
        as_char: Char => u8,
        /// Symbol atom interning index.
        as_sym: Sym => u32,
        /// Timestamp atom value.
        as_timestamp: Timestamp => i64,
        /// Month atom value.
        as_month: Month => i32,
        /// Date atom value.
        as_date: Date => i32,
        /// Datetime atom value.
        as_datetime: Datetime => f64,
        /// Timespan atom value.
        as_timespan: Timespan => i64,
        /// Minute atom value.
        as_minute: Minute => i32,
        /// Second atom value.
        as_second: Second => i32,
        /// Time atom value.
        as_time: Time => i32,
    }

    /// String form of a symbol atom, resolved through `ctx`.
    ///
    /// # Errors
    ///
    /// [`ValueError::WrongType`] off a symbol atom;
    /// [`ValueError::Malformed`] when the index is not interned in `ctx`.
    pub fn sym_str(&self, ctx: &SymbolContext) -> Result<String, ValueError> {
        let idx = self.as_sym()?;
        ctx.lookup_str(idx)
            .ok_or_else(|| ValueError::Malformed(format!("symbol index {idx} not in context")))
    }

    vector_accessors! {
        /// Boolean vector elements.
        bools, bools_mut: Bool => bool,
        /// GUID vector elements.
        guids, guids_mut: Guid => Uuid,
        /// Byte vector elements.
        bytes, bytes_mut: Byte => u8,
        /// Short vector elements.
        shorts, shorts_mut: Short => i16,
        /// Int vector elements.
        ints, ints_mut: Int => i32,
        /// Long vector elements.
        longs, longs_mut: Long => i64,
        /// Real vector elements.
        reals, reals_mut: Real => f32,
        /// Float vector elements.
        floats, floats_mut: Float => f64,
        /// Symbol vector interning indices.
        syms, syms_mut: Sym => u32,
        /// Timestamp vector elements.
        timestamps, timestamps_mut: Timestamp => i64,
        /// Month vector elements.
        months, months_mut: Month => i32,
        /// Date vector elements.
        dates, dates_mut: Date => i32,
        /// Datetime vector elements.
        datetimes, datetimes_mut: Datetime => f64,
        /// Timespan vector elements.
        timespans, timespans_mut: Timespan => i64,
        /// Minute vector elements.
        minutes, minutes_mut: Minute => i32,
        /// Second vector elements.
        seconds, seconds_mut: Second => i32,
        /// Time vector elements.
        times, times_mut: Time => i32,
    }

    /// Char vector text.
    pub fn chars(&self) -> Result<&str, ValueError> {
        match self {
            Self::Vector(Vector::Char(_, s)) => Ok(s),
            other => Err(ValueError::wrong_type("chars", other.tag())),
        }
    }

    /// Symbol vector elements, resolved through `ctx`.
    ///
    /// # Errors
    ///
    /// [`ValueError::WrongType`] off a symbol vector;
    /// [`ValueError::Malformed`] for an index not interned in `ctx`.
    pub fn sym_strs(&self, ctx: &SymbolContext) -> Result<Vec<String>, ValueError> {
        self.syms()?
            .iter()
            .map(|&idx| {
                ctx.lookup_str(idx)
                    .ok_or_else(|| ValueError::Malformed(format!("symbol index {idx} not in context")))
            })
            .collect()
    }

    /// List elements.
    pub fn items(&self) -> Result<&[K], ValueError> {
        match self {
            Self::List { items, .. } => Ok(items),
            other => Err(ValueError::wrong_type("items", other.tag())),
        }
    }

    /// Mutable counterpart of [`K::items`].
    pub fn items_mut(&mut self) -> Result<&mut Vec<K>, ValueError> {
        match self {
            Self::List { items, .. } => Ok(items),
            other => Err(ValueError::wrong_type("items_mut", other.tag())),
        }
    }

    /// Dictionary view of this value.
    pub fn as_dict(&self) -> Result<&Dict, ValueError> {
        match self {
            Self::Dict(d) => Ok(d),
            other => Err(ValueError::wrong_type("as_dict", other.tag())),
        }
    }

    /// Table view of this value.
    pub fn as_table(&self) -> Result<&Table, ValueError> {
        match self {
            Self::Table(t) => Ok(t),
            other => Err(ValueError::wrong_type("as_table", other.tag())),
        }
    }

    /// Message text of a remote error value.
    pub fn error_msg(&self) -> Result<&str, ValueError> {
        match self {
            Self::Error(msg) => Ok(msg),
            other => Err(ValueError::wrong_type("error_msg", other.tag())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_round_trip() {
        assert_eq!(K::int(1).as_int(), Ok(1));
        assert_eq!(K::long(1).as_long(), Ok(1));
        assert_eq!(K::short(-3).as_short(), Ok(-3));
        assert_eq!(K::byte(0xff).as_byte(), Ok(0xff));
        assert_eq!(K::bool_atom(true).as_bool(), Ok(true));
        assert_eq!(K::real(1.5).as_real(), Ok(1.5));
        assert_eq!(K::float(-2.25).as_float(), Ok(-2.25));
        assert_eq!(K::char_atom(b'C').as_char(), Ok(b'C'));
        assert_eq!(K::timestamp(7).as_timestamp(), Ok(7));
        assert_eq!(K::timespan(7).as_timespan(), Ok(7));
        assert_eq!(K::date(7).as_date(), Ok(7));
    }

    #[test]
    fn mismatched_accessors_fail() {
        let err = K::int(1).as_long().unwrap_err();
        assert_eq!(err, ValueError::wrong_type("as_long", -6));
        assert_eq!(format!("{err}"), "wrong type KI (-6) for as_long");

        let err = K::long(1).as_int().unwrap_err();
        assert_eq!(format!("{err}"), "wrong type KJ (-7) for as_int");

        // temporal kinds never cross into their machine representation
        assert!(K::timestamp(1).as_long().is_err());
        assert!(K::long(1).as_timestamp().is_err());
    }

    #[test]
    fn symbols_resolve_through_context() {
        let ctx = SymbolContext::new();
        let k = K::sym(&ctx, "hello");
        assert_eq!(k.sym_str(&ctx), Ok("hello".to_owned()));
        assert_eq!(K::sym(&ctx, "hello"), k);

        let v = K::sym_vec(&ctx, &["ab", "c"]);
        assert_eq!(v.sym_strs(&ctx), Ok(vec!["ab".to_owned(), "c".to_owned()]));
    }

    #[test]
    fn vector_mutation() {
        let mut k = K::int_vec(vec![0, 0]);
        k.ints_mut().unwrap()[0] = 1;
        assert_eq!(k.ints(), Ok(&[1, 0][..]));
        assert!(k.longs_mut().is_err());
    }

    #[test]
    fn counts() {
        assert_eq!(K::int(1).count(), None);
        assert_eq!(K::int_vec(vec![1, 2, 3]).count(), Some(3));
        assert_eq!(K::list(vec![K::Nil]).count(), Some(1));
        assert_eq!(K::Nil.count(), None);
    }

    #[test]
    fn enum_sym_vectors_keep_their_tag() {
        let k = K::enum_sym_vec(20, vec![1, 2]).unwrap();
        assert_eq!(k.tag(), 20);
        assert!(K::enum_sym_vec(40, vec![]).is_err());
        // the long accessor does not cross into enumerations
        assert!(k.longs().is_err());
    }
}
