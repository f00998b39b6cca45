//! Type tags and vector attributes.
//!
//! Every value on the wire carries a signed 8-bit type tag: negative for
//! atoms, the matching positive value for homogeneous vectors, `0` for
//! heterogeneous lists, and a handful of special values for containers.
//! Tags `20..=39` are reserved for enumerated-symbol vectors, which travel
//! as long vectors with their original tag preserved.

/// Type tag for vectors and containers (atoms use the negated value).
///
/// The numeric values are fixed by the wire protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum TypeTag {
    /// Boolean (1 byte).
    KB = 1,
    /// GUID (16 bytes).
    UU = 2,
    /// Byte (1 byte).
    KG = 4,
    /// Short (2 bytes).
    KH = 5,
    /// Int (4 bytes).
    KI = 6,
    /// Long (8 bytes).
    KJ = 7,
    /// Real, 32-bit float (4 bytes).
    KE = 8,
    /// Float, 64-bit (8 bytes).
    KF = 9,
    /// Char (1 byte).
    KC = 10,
    /// Symbol (NUL-terminated UTF-8).
    KS = 11,
    /// Timestamp, nanoseconds from 2000.01.01 (8 bytes).
    KP = 12,
    /// Month, months from 2000.01 (4 bytes).
    KM = 13,
    /// Date, days from 2000.01.01 (4 bytes).
    KD = 14,
    /// Datetime, fractional days from 2000.01.01 (8 bytes, deprecated).
    KZ = 15,
    /// Timespan, nanoseconds (8 bytes).
    KN = 16,
    /// Minute (4 bytes).
    KU = 17,
    /// Second (4 bytes).
    KV = 18,
    /// Time, milliseconds (4 bytes).
    KT = 19,
    /// Table.
    XT = 98,
    /// Dictionary.
    XD = 99,
    /// Function: prelude bytes plus a length-prefixed ASCII body.
    FN = 100,
    /// Nil / generic identity.
    NIL = 101,
    /// Built-in operator (single opcode byte).
    OP = 102,
    /// Sorted/stepped dictionary.
    SD = 127,
    /// Remote error (NUL-terminated message, atom-only).
    KRR = -128,
}

impl TypeTag {
    /// Look up a tag from its non-negative wire value (or `KRR`).
    #[must_use]
    pub fn from_i8(t: i8) -> Option<Self> {
        Some(match t {
            1 => Self::KB,
            2 => Self::UU,
            4 => Self::KG,
            5 => Self::KH,
            6 => Self::KI,
            7 => Self::KJ,
            8 => Self::KE,
            9 => Self::KF,
            10 => Self::KC,
            11 => Self::KS,
            12 => Self::KP,
            13 => Self::KM,
            14 => Self::KD,
            15 => Self::KZ,
            16 => Self::KN,
            17 => Self::KU,
            18 => Self::KV,
            19 => Self::KT,
            98 => Self::XT,
            99 => Self::XD,
            100 => Self::FN,
            101 => Self::NIL,
            102 => Self::OP,
            127 => Self::SD,
            -128 => Self::KRR,
            _ => return None,
        })
    }

    /// Wire value of this tag.
    #[must_use]
    pub fn to_i8(self) -> i8 {
        self as i8
    }

    /// Fixed payload width of the matching atom, in bytes.
    ///
    /// `None` for variable-width (`KS`) and non-atom tags.
    #[must_use]
    pub fn atom_width(self) -> Option<usize> {
        Some(match self {
            Self::KB | Self::KG | Self::KC => 1,
            Self::KH => 2,
            Self::KI | Self::KM | Self::KD | Self::KU | Self::KV | Self::KT | Self::KE => 4,
            Self::KJ | Self::KP | Self::KN | Self::KF | Self::KZ => 8,
            Self::UU => 16,
            _ => return None,
        })
    }

    /// Short name used in error messages, e.g. `"KJ"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::KB => "KB",
            Self::UU => "UU",
            Self::KG => "KG",
            Self::KH => "KH",
            Self::KI => "KI",
            Self::KJ => "KJ",
            Self::KE => "KE",
            Self::KF => "KF",
            Self::KC => "KC",
            Self::KS => "KS",
            Self::KP => "KP",
            Self::KM => "KM",
            Self::KD => "KD",
            Self::KZ => "KZ",
            Self::KN => "KN",
            Self::KU => "KU",
            Self::KV => "KV",
            Self::KT => "KT",
            Self::XT => "XT",
            Self::XD => "XD",
            Self::FN => "FN",
            Self::NIL => "NIL",
            Self::OP => "OP",
            Self::SD => "SD",
            Self::KRR => "KRR",
        }
    }
}

/// Label for a raw wire tag, e.g. `"KJ (-7)"`, used in error messages.
#[must_use]
pub fn tag_label(t: i8) -> String {
    match TypeTag::from_i8(t.unsigned_abs() as i8).or_else(|| TypeTag::from_i8(t)) {
        Some(tag) => format!("{} ({t})", tag.name()),
        None => format!("#{t}"),
    }
}

/// Vector attribute byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Attr {
    /// No attribute.
    #[default]
    None = 0,
    /// Elements are in ascending order.
    Sorted = 1,
    /// Elements are distinct.
    Unique = 2,
    /// Equal elements are adjacent.
    Parted = 3,
    /// Grouped index attached.
    Grouped = 4,
}

impl Attr {
    /// Parse an attribute byte.
    #[must_use]
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0 => Self::None,
            1 => Self::Sorted,
            2 => Self::Unique,
            3 => Self::Parted,
            4 => Self::Grouped,
            _ => return None,
        })
    }

    /// Wire value of this attribute.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for t in [1i8, 2, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 98, 99, 100, 101, 102, 127, -128]
        {
            let tag = TypeTag::from_i8(t).unwrap();
            assert_eq!(tag.to_i8(), t);
        }
        assert_eq!(TypeTag::from_i8(3), None);
        assert_eq!(TypeTag::from_i8(42), None);
    }

    #[test]
    fn atom_widths() {
        assert_eq!(TypeTag::KB.atom_width(), Some(1));
        assert_eq!(TypeTag::KH.atom_width(), Some(2));
        assert_eq!(TypeTag::KE.atom_width(), Some(4));
        assert_eq!(TypeTag::KP.atom_width(), Some(8));
        assert_eq!(TypeTag::UU.atom_width(), Some(16));
        assert_eq!(TypeTag::KS.atom_width(), None);
        assert_eq!(TypeTag::XT.atom_width(), None);
    }

    #[test]
    fn attr_round_trip() {
        for b in 0u8..=4 {
            assert_eq!(Attr::from_u8(b).unwrap().to_u8(), b);
        }
        assert_eq!(Attr::from_u8(5), None);
    }

    #[test]
    fn labels() {
        assert_eq!(tag_label(-7), "KJ (-7)");
        assert_eq!(tag_label(6), "KI (6)");
        assert_eq!(tag_label(-128), "KRR (-128)");
        assert_eq!(tag_label(77), "#77");
    }
}
