//! Types for schema comparison results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of difference between a gauge and an actual schema.
///
/// The declaration order is the order in which repairs are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaErrorType {
    /// Gauge table absent from the actual schema.
    TableMissing,
    /// Actual table absent from the gauge schema.
    TableObsolete,
    /// Gauge field absent from the actual table.
    FieldMissing,
    /// Actual field absent from the gauge table (redundant).
    FieldObsolete,
    /// Field present on both sides with a different definition.
    FieldDefinitionObsolete,
    /// Gauge index absent from the actual field.
    IndexMissing,
    /// Actual index of a different type than the gauge's, or redundant.
    IndexObsolete,
}

impl fmt::Display for SchemaErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One difference found by [`compare`](super::compare), with its repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    pub error_type: SchemaErrorType,

    /// Human-readable description of the difference.
    pub description: String,

    pub table: String,

    /// Field concerned, `None` for table-level errors.
    pub field: Option<String>,

    /// False when the engine cannot repair the difference automatically.
    pub is_repairable: bool,

    /// Repair statements, to be executed in order. Empty when unrepairable.
    pub sql_statements: Vec<String>,
}

impl SchemaError {
    /// Create an error; `statements` is `None` for unrepairable differences.
    pub fn new(
        error_type: SchemaErrorType,
        table: &str,
        field: Option<&str>,
        description: impl Into<String>,
        statements: Option<Vec<String>>,
    ) -> Self {
        Self {
            error_type,
            description: description.into(),
            table: table.trim().to_string(),
            field: field.map(|f| f.trim().to_string()),
            is_repairable: statements.is_some(),
            sql_statements: statements.unwrap_or_default(),
        }
    }

    /// The same difference, without repair statements.
    pub fn unrepairable(mut self) -> Self {
        self.is_repairable = false;
        self.sql_statements.clear();
        self
    }

    /// `table` or `table.field`.
    pub fn location(&self) -> String {
        match &self.field {
            Some(field) => format!("{}.{}", self.table, field),
            None => self.table.clone(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            if self.is_repairable { "repairable" } else { "UNREPAIRABLE" },
            self.error_type,
            self.location(),
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_order() {
        assert!(SchemaErrorType::TableMissing < SchemaErrorType::TableObsolete);
        assert!(SchemaErrorType::FieldObsolete < SchemaErrorType::FieldDefinitionObsolete);
        assert!(SchemaErrorType::IndexMissing < SchemaErrorType::IndexObsolete);
    }

    #[test]
    fn test_unrepairable_error() {
        let error = SchemaError::new(
            SchemaErrorType::FieldMissing,
            " users ",
            Some("photo"),
            "Field is missing",
            None,
        );
        assert!(!error.is_repairable);
        assert!(error.sql_statements.is_empty());
        assert_eq!(error.location(), "users.photo");
        assert_eq!(
            error.to_string(),
            "[UNREPAIRABLE] FieldMissing users.photo: Field is missing"
        );
    }
}
