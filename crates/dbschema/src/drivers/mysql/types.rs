//! Type mapping between the canonical model and MySQL column types.

use crate::core::data_type::{DbDataType, DECIMAL_PRECISION, DECIMAL_SCALE};
use crate::core::field::{CollationType, FieldSchema};
use crate::core::identifier::quote_literal;

/// Map a canonical field type to a MySQL column type.
pub fn mysql_type(field: &FieldSchema) -> String {
    match field.data_type {
        DbDataType::Float => "FLOAT".to_string(),
        // MySQL stores REAL as DOUBLE unless REAL_AS_FLOAT is set.
        DbDataType::Real | DbDataType::Double => "DOUBLE".to_string(),
        DbDataType::Decimal => format!("DECIMAL({},{})", DECIMAL_PRECISION, DECIMAL_SCALE),

        DbDataType::IntegerTiny => "TINYINT".to_string(),
        DbDataType::IntegerSmall => "SMALLINT".to_string(),
        DbDataType::IntegerMedium => "MEDIUMINT".to_string(),
        DbDataType::Integer => "INT".to_string(),
        DbDataType::IntegerBig => "BIGINT".to_string(),

        DbDataType::TimeStamp => "TIMESTAMP".to_string(),
        DbDataType::Date => "DATE".to_string(),
        DbDataType::DateTime => "DATETIME".to_string(),
        DbDataType::Time => "TIME".to_string(),

        DbDataType::Char => format!("CHAR({})", field.length),
        DbDataType::VarChar => format!("VARCHAR({})", field.length),
        DbDataType::Text => "TEXT".to_string(),
        DbDataType::TextMedium => "MEDIUMTEXT".to_string(),
        DbDataType::TextLong => "LONGTEXT".to_string(),

        DbDataType::BlobTiny => "TINYBLOB".to_string(),
        DbDataType::Blob => "BLOB".to_string(),
        DbDataType::BlobMedium => "MEDIUMBLOB".to_string(),
        DbDataType::BlobLong => "LONGBLOB".to_string(),

        DbDataType::Enum => {
            let values: Vec<String> = field
                .enum_value_list()
                .iter()
                .map(|v| quote_literal(v))
                .collect();
            format!("ENUM({})", values.join(","))
        }
    }
}

/// Whether two canonical types produce the same MySQL column type.
pub fn equivalent_types(a: DbDataType, b: DbDataType) -> bool {
    let normalize = |t: DbDataType| if t == DbDataType::Real { DbDataType::Double } else { t };
    normalize(a) == normalize(b)
}

/// Character set and collation clause for a collation type.
pub fn collation_clause(collation: CollationType) -> Option<&'static str> {
    match collation {
        CollationType::Default => None,
        CollationType::AsciiBinary => Some("CHARACTER SET ascii COLLATE ascii_bin"),
        CollationType::AsciiCaseInsensitive => Some("CHARACTER SET ascii COLLATE ascii_general_ci"),
    }
}

/// Canonical collation of an INFORMATION_SCHEMA collation name.
pub fn collation_from_name(name: &str) -> CollationType {
    match name.trim().to_lowercase().as_str() {
        "ascii_bin" => CollationType::AsciiBinary,
        "ascii_general_ci" => CollationType::AsciiCaseInsensitive,
        _ => CollationType::Default,
    }
}

/// Parsed form of an INFORMATION_SCHEMA `COLUMN_TYPE` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub data_type: DbDataType,
    pub length: i32,
    pub unsigned: bool,
    pub enum_values: String,
}

/// Parse a MySQL `COLUMN_TYPE` such as `int(10) unsigned`, `varchar(50)` or
/// `enum('a','b')`.
///
/// Returns `None` for types without a canonical mapping (json, year, bit,
/// set, tinytext, spatial types).
pub fn parse_column_type(column_type: &str) -> Option<ColumnType> {
    let column_type = column_type.trim();
    let (base, args, rest) = match (column_type.find('('), column_type.rfind(')')) {
        (Some(open), Some(close)) if close > open => (
            &column_type[..open],
            &column_type[open + 1..close],
            &column_type[close + 1..],
        ),
        _ => match column_type.split_once(' ') {
            Some((base, rest)) => (base, "", rest),
            None => (column_type, "", ""),
        },
    };

    let base = base.trim().to_lowercase();
    let unsigned = rest
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case("unsigned"));

    let data_type = match base.as_str() {
        "tinyint" => DbDataType::IntegerTiny,
        "smallint" => DbDataType::IntegerSmall,
        "mediumint" => DbDataType::IntegerMedium,
        "int" | "integer" => DbDataType::Integer,
        "bigint" => DbDataType::IntegerBig,
        "float" => DbDataType::Float,
        "double" | "real" => DbDataType::Double,
        "decimal" | "numeric" => DbDataType::Decimal,
        "timestamp" => DbDataType::TimeStamp,
        "date" => DbDataType::Date,
        "datetime" => DbDataType::DateTime,
        "time" => DbDataType::Time,
        "char" => DbDataType::Char,
        "varchar" => DbDataType::VarChar,
        "text" => DbDataType::Text,
        "mediumtext" => DbDataType::TextMedium,
        "longtext" => DbDataType::TextLong,
        "tinyblob" => DbDataType::BlobTiny,
        "blob" => DbDataType::Blob,
        "mediumblob" => DbDataType::BlobMedium,
        "longblob" => DbDataType::BlobLong,
        "enum" => DbDataType::Enum,
        _ => return None,
    };

    let length = if data_type.has_length() {
        args.trim().parse().ok()?
    } else {
        0
    };

    let enum_values = if data_type == DbDataType::Enum {
        parse_enum_literals(args).join(",")
    } else {
        String::new()
    };

    Some(ColumnType {
        data_type,
        length,
        unsigned: unsigned && data_type.is_numeric(),
        enum_values,
    })
}

/// Split a quoted literal list (`'a','b''c'`) into its values.
fn parse_enum_literals(list: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        match (in_literal, c) {
            (false, '\'') => in_literal = true,
            (true, '\'') => {
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_literal = false;
                    values.push(std::mem::take(&mut current));
                }
            }
            (true, c) => current.push(c),
            (false, _) => {}
        }
    }

    values
}
