//! Shared name handling: comparison, validation, quoting and literals.
//!
//! Table, field and index names are compared case-insensitively after
//! trimming, everywhere in the crate. All comparisons go through
//! [`names_equal`] / [`name_key`] so that uniqueness checks, lookups and the
//! diff engine agree on what "the same name" means.
//!
//! Identifiers cannot be bound as statement parameters, so DDL is assembled as
//! text. Before quoting, identifiers are validated for suspicious content (null
//! bytes, excessive length) and the engine's quote character is escaped.

use crate::error::{DbSchemaError, Result};

/// Maximum identifier length (MySQL limit, the stricter of the two engines).
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Normalized lookup key for a name: trimmed and lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Compare two names by convention: trimmed, case-insensitive.
pub fn names_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a.eq_ignore_ascii_case(b) || name_key(a) == name_key(b)
}

/// Validate an identifier for security issues.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DbSchemaError::InvalidOperation(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(DbSchemaError::InvalidOperation(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(DbSchemaError::InvalidOperation(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a MySQL identifier using backticks.
///
/// ```ignore
/// assert_eq!(quote_mysql("users")?, "`users`");
/// assert_eq!(quote_mysql("table`name")?, "`table``name`");
/// ```
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.trim().replace('`', "``")))
}

/// Quote a SQLite identifier using double quotes.
///
/// ```ignore
/// assert_eq!(quote_sqlite("users")?, "\"users\"");
/// ```
pub fn quote_sqlite(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.trim().replace('"', "\"\"")))
}

/// Quote a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_equal_ignores_case_and_padding() {
        assert!(names_equal("Users", "users"));
        assert!(names_equal("  users ", "USERS"));
        assert!(names_equal("Ärzte", "ärzte"));
        assert!(!names_equal("users", "user"));
    }

    #[test]
    fn test_name_key() {
        assert_eq!(name_key(" Orders "), "orders");
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("   ").is_err());
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        assert!(validate_identifier("us\0ers").is_err());
    }

    #[test]
    fn test_validate_identifier_length_limit() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_quote_mysql_escapes_backtick() {
        assert_eq!(quote_mysql("users").unwrap(), "`users`");
        assert_eq!(quote_mysql("table`name").unwrap(), "`table``name`");
    }

    #[test]
    fn test_quote_sqlite_escapes_double_quote() {
        assert_eq!(quote_sqlite("users").unwrap(), "\"users\"");
        assert_eq!(quote_sqlite("a\"b").unwrap(), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }
}
