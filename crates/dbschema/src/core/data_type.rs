//! Canonical data type catalog.
//!
//! [`DbDataType`] is the engine-independent type of a field. Engine adapters
//! map it to and from their native type names. Classification (integer,
//! float, length-bearing, collation-bearing) is derived from the variant and
//! never stored.

use serde::{Deserialize, Serialize};

/// Canonical field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DbDataType {
    // ===== Floating Point =====
    /// Single precision floating point.
    Float,
    /// Real number; a synonym of double precision on most engines.
    Real,
    /// Double precision floating point.
    Double,
    /// Exact decimal, fixed at precision 19, scale 4.
    Decimal,

    // ===== Integer Types =====
    /// 8-bit integer.
    IntegerTiny,
    /// 16-bit integer.
    IntegerSmall,
    /// 24-bit integer.
    IntegerMedium,
    /// 32-bit integer.
    #[default]
    Integer,
    /// 64-bit integer.
    IntegerBig,

    // ===== Date/Time Types =====
    TimeStamp,
    Date,
    DateTime,
    Time,

    // ===== String Types =====
    /// Fixed-length character string, see `FieldSchema::length`.
    Char,
    /// Variable-length character string, see `FieldSchema::length`.
    VarChar,
    Text,
    TextMedium,
    TextLong,

    // ===== Binary Types =====
    BlobTiny,
    Blob,
    BlobMedium,
    BlobLong,

    /// One of a fixed list of string values, see `FieldSchema::enum_values`.
    Enum,
}

/// Precision used for [`DbDataType::Decimal`].
pub const DECIMAL_PRECISION: u8 = 19;
/// Scale used for [`DbDataType::Decimal`].
pub const DECIMAL_SCALE: u8 = 4;

impl DbDataType {
    /// Every canonical type, in declaration order.
    pub const ALL: [DbDataType; 23] = [
        DbDataType::Float,
        DbDataType::Real,
        DbDataType::Double,
        DbDataType::Decimal,
        DbDataType::IntegerTiny,
        DbDataType::IntegerSmall,
        DbDataType::IntegerMedium,
        DbDataType::Integer,
        DbDataType::IntegerBig,
        DbDataType::TimeStamp,
        DbDataType::Date,
        DbDataType::DateTime,
        DbDataType::Time,
        DbDataType::Char,
        DbDataType::VarChar,
        DbDataType::Text,
        DbDataType::TextMedium,
        DbDataType::TextLong,
        DbDataType::BlobTiny,
        DbDataType::Blob,
        DbDataType::BlobMedium,
        DbDataType::BlobLong,
        DbDataType::Enum,
    ];

    /// Integer types; the only types that may be autoincrement.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DbDataType::IntegerTiny
                | DbDataType::IntegerSmall
                | DbDataType::IntegerMedium
                | DbDataType::Integer
                | DbDataType::IntegerBig
        )
    }

    /// Approximate (floating point) numeric types.
    pub fn is_float(&self) -> bool {
        matches!(self, DbDataType::Float | DbDataType::Real | DbDataType::Double)
    }

    /// Any numeric type; the types for which UNSIGNED is meaningful.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || *self == DbDataType::Decimal
    }

    /// Types whose definition carries `FieldSchema::length`.
    pub fn has_length(&self) -> bool {
        matches!(self, DbDataType::Char | DbDataType::VarChar)
    }

    /// Types whose definition carries a collation.
    pub fn has_collation(&self) -> bool {
        matches!(
            self,
            DbDataType::Char
                | DbDataType::VarChar
                | DbDataType::Text
                | DbDataType::TextMedium
                | DbDataType::TextLong
                | DbDataType::Enum
        )
    }

    /// Character types (everything with a collation except Enum).
    pub fn is_text(&self) -> bool {
        self.has_collation() && *self != DbDataType::Enum
    }

    /// Binary large object types.
    pub fn is_blob(&self) -> bool {
        matches!(
            self,
            DbDataType::BlobTiny | DbDataType::Blob | DbDataType::BlobMedium | DbDataType::BlobLong
        )
    }

    /// Date and time types.
    pub fn is_date_time(&self) -> bool {
        matches!(
            self,
            DbDataType::TimeStamp | DbDataType::Date | DbDataType::DateTime | DbDataType::Time
        )
    }
}

impl std::fmt::Display for DbDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
