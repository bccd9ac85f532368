//! SQLite type families.
//!
//! SQLite has no length, unsigned or enum types: every canonical type maps
//! to one of a few declared type names, and types sharing a declared name
//! are equivalent.

use crate::core::data_type::DbDataType;
use crate::core::field::CollationType;

/// Declared type family of a canonical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Real,
    Numeric,
    Text,
    Blob,
    Date,
    DateTime,
    Time,
}

impl TypeFamily {
    pub fn of(data_type: DbDataType) -> Self {
        match data_type {
            DbDataType::IntegerTiny
            | DbDataType::IntegerSmall
            | DbDataType::IntegerMedium
            | DbDataType::Integer
            | DbDataType::IntegerBig => TypeFamily::Integer,
            DbDataType::Float | DbDataType::Real | DbDataType::Double => TypeFamily::Real,
            DbDataType::Decimal => TypeFamily::Numeric,
            DbDataType::Char
            | DbDataType::VarChar
            | DbDataType::Text
            | DbDataType::TextMedium
            | DbDataType::TextLong
            | DbDataType::Enum => TypeFamily::Text,
            DbDataType::BlobTiny | DbDataType::Blob | DbDataType::BlobMedium | DbDataType::BlobLong => {
                TypeFamily::Blob
            }
            DbDataType::Date => TypeFamily::Date,
            DbDataType::DateTime | DbDataType::TimeStamp => TypeFamily::DateTime,
            DbDataType::Time => TypeFamily::Time,
        }
    }

    /// Declared type name used in CREATE TABLE.
    pub fn declared_type(&self) -> &'static str {
        match self {
            TypeFamily::Integer => "INTEGER",
            TypeFamily::Real => "REAL",
            TypeFamily::Numeric => "NUMERIC",
            TypeFamily::Text => "TEXT",
            TypeFamily::Blob => "BLOB",
            TypeFamily::Date => "DATE",
            TypeFamily::DateTime => "DATETIME",
            TypeFamily::Time => "TIME",
        }
    }

    /// Literal used as DEFAULT when adding a NOT NULL column to a populated
    /// table. Blobs have none.
    pub fn default_literal(&self) -> Option<&'static str> {
        match self {
            TypeFamily::Integer | TypeFamily::Real | TypeFamily::Numeric => Some("0"),
            TypeFamily::Text => Some("''"),
            TypeFamily::Date => Some("'1970-01-01'"),
            TypeFamily::DateTime => Some("'1970-01-01 00:00:00'"),
            TypeFamily::Time => Some("'00:00:00'"),
            TypeFamily::Blob => None,
        }
    }
}

/// Canonical type of a declared column type, by SQLite affinity rules.
///
/// Date and time names are recognised before the affinity rules since SQLite
/// itself gives them NUMERIC affinity.
pub fn parse_declared_type(declared: &str) -> Option<DbDataType> {
    let declared = declared.trim().to_uppercase();
    if declared.is_empty() {
        return None;
    }

    if declared.contains("INT") {
        Some(DbDataType::Integer)
    } else if declared.contains("CHAR") || declared.contains("CLOB") || declared.contains("TEXT") {
        Some(DbDataType::Text)
    } else if declared.contains("BLOB") {
        Some(DbDataType::Blob)
    } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
        Some(DbDataType::Double)
    } else if declared.contains("DATETIME") || declared.contains("TIMESTAMP") {
        Some(DbDataType::DateTime)
    } else if declared.contains("DATE") {
        Some(DbDataType::Date)
    } else if declared.contains("TIME") {
        Some(DbDataType::Time)
    } else if declared.contains("NUMERIC") || declared.contains("DECIMAL") {
        Some(DbDataType::Decimal)
    } else {
        None
    }
}

/// Collation name used in COLLATE clauses.
pub fn collation_name(collation: CollationType) -> Option<&'static str> {
    match collation {
        CollationType::Default => None,
        CollationType::AsciiBinary => Some("BINARY"),
        CollationType::AsciiCaseInsensitive => Some("NOCASE"),
    }
}

/// Canonical collation of a COLLATE clause name.
pub fn collation_from_name(name: &str) -> CollationType {
    match name.trim().to_uppercase().as_str() {
        "BINARY" => CollationType::AsciiBinary,
        "NOCASE" => CollationType::AsciiCaseInsensitive,
        _ => CollationType::Default,
    }
}
