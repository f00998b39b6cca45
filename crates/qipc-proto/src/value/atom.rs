//! Scalar atoms.

use uuid::Uuid;

use crate::errors::ValueError;
use crate::tag::TypeTag;

/// A scalar value. On the wire an atom carries the negated vector tag.
///
/// Temporal kinds share machine representations with the plain integer
/// kinds (`Timestamp` is an `i64` like `Long`) but remain distinct tags:
/// accessors never cross kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Atom {
    /// Boolean (`KB`).
    Bool(bool),
    /// GUID (`UU`).
    Guid(Uuid),
    /// Byte (`KG`).
    Byte(u8),
    /// Short (`KH`).
    Short(i16),
    /// Int (`KI`).
    Int(i32),
    /// Long (`KJ`).
    Long(i64),
    /// Real (`KE`).
    Real(f32),
    /// Float (`KF`).
    Float(f64),
    /// Char (`KC`), a single byte on the wire.
    Char(u8),
    /// Symbol (`KS`), an index into the owning context.
    Sym(u32),
    /// Timestamp (`KP`), nanoseconds from 2000.01.01.
    Timestamp(i64),
    /// Month (`KM`), months from 2000.01.
    Month(i32),
    /// Date (`KD`), days from 2000.01.01.
    Date(i32),
    /// Datetime (`KZ`), fractional days from 2000.01.01.
    Datetime(f64),
    /// Timespan (`KN`), nanoseconds.
    Timespan(i64),
    /// Minute (`KU`).
    Minute(i32),
    /// Second (`KV`).
    Second(i32),
    /// Time (`KT`), milliseconds.
    Time(i32),
}

impl Atom {
    /// The vector tag this atom corresponds to.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::KB,
            Self::Guid(_) => TypeTag::UU,
            Self::Byte(_) => TypeTag::KG,
            Self::Short(_) => TypeTag::KH,
            Self::Int(_) => TypeTag::KI,
            Self::Long(_) => TypeTag::KJ,
            Self::Real(_) => TypeTag::KE,
            Self::Float(_) => TypeTag::KF,
            Self::Char(_) => TypeTag::KC,
            Self::Sym(_) => TypeTag::KS,
            Self::Timestamp(_) => TypeTag::KP,
            Self::Month(_) => TypeTag::KM,
            Self::Date(_) => TypeTag::KD,
            Self::Datetime(_) => TypeTag::KZ,
            Self::Timespan(_) => TypeTag::KN,
            Self::Minute(_) => TypeTag::KU,
            Self::Second(_) => TypeTag::KV,
            Self::Time(_) => TypeTag::KT,
        }
    }

    /// Wire tag of this atom (negative).
    #[must_use]
    pub fn tag(&self) -> i8 {
        -self.type_tag().to_i8()
    }

    /// Build an integer-valued atom dynamically, checking the tag's range.
    ///
    /// # Errors
    ///
    /// - [`ValueError::OutOfRange`] when `value` does not fit the tag's
    ///   fixed-width field.
    /// - [`ValueError::WrongType`] for tags without an integer payload
    ///   (`KE`, `KF`, `KZ`, `UU`, `KS`).
    pub fn from_i64(tag: TypeTag, value: i64) -> Result<Self, ValueError> {
        let out_of_range = || ValueError::OutOfRange { tag: tag.name(), value };
        Ok(match tag {
            TypeTag::KB => match value {
                0 => Self::Bool(false),
                1 => Self::Bool(true),
                _ => return Err(out_of_range()),
            },
            TypeTag::KG => Self::Byte(u8::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KC => Self::Char(u8::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KH => Self::Short(i16::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KI => Self::Int(i32::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KM => Self::Month(i32::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KD => Self::Date(i32::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KU => Self::Minute(i32::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KV => Self::Second(i32::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KT => Self::Time(i32::try_from(value).map_err(|_| out_of_range())?),
            TypeTag::KJ => Self::Long(value),
            TypeTag::KP => Self::Timestamp(value),
            TypeTag::KN => Self::Timespan(value),
            _ => {
                return Err(ValueError::wrong_type("integer-valued atom", tag.to_i8()));
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_negate() {
        assert_eq!(Atom::Int(0).tag(), -6);
        assert_eq!(Atom::Long(0).tag(), -7);
        assert_eq!(Atom::Sym(0).tag(), -11);
        assert_eq!(Atom::Timestamp(0).tag(), -12);
    }

    #[test]
    fn from_i64_checks_ranges() {
        assert_eq!(Atom::from_i64(TypeTag::KG, 255), Ok(Atom::Byte(255)));
        assert_eq!(
            Atom::from_i64(TypeTag::KG, 256),
            Err(ValueError::OutOfRange { tag: "KG", value: 256 })
        );
        assert_eq!(
            Atom::from_i64(TypeTag::KG, -1),
            Err(ValueError::OutOfRange { tag: "KG", value: -1 })
        );

        assert_eq!(Atom::from_i64(TypeTag::KH, 32767), Ok(Atom::Short(32767)));
        assert_eq!(Atom::from_i64(TypeTag::KH, -32768), Ok(Atom::Short(-32768)));
        assert_eq!(
            Atom::from_i64(TypeTag::KH, 32768),
            Err(ValueError::OutOfRange { tag: "KH", value: 32768 })
        );
        assert_eq!(
            Atom::from_i64(TypeTag::KH, -80912),
            Err(ValueError::OutOfRange { tag: "KH", value: -80912 })
        );

        assert_eq!(Atom::from_i64(TypeTag::KJ, i64::MIN), Ok(Atom::Long(i64::MIN)));
        assert!(matches!(Atom::from_i64(TypeTag::KF, 1), Err(ValueError::WrongType { .. })));
    }
}
