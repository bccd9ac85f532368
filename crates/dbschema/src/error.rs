//! Error types for the schema library.

use thiserror::Error;

/// Main error type for schema operations.
///
/// Validation problems found by `data_errors()` and unrepairable diff results
/// are returned as data, not through this type.
#[derive(Error, Debug)]
pub enum DbSchemaError {
    /// Configuration error (invalid YAML, unknown engine, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Precondition violation by the caller (programming error).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A field attribute cannot be expressed in the target engine's DDL.
    #[error("{feature} on field {table}.{field} is not supported by the {engine} engine")]
    UnsupportedFeature {
        engine: String,
        table: String,
        field: String,
        feature: String,
    },

    /// An introspected native type has no canonical mapping.
    #[error("Native type '{native_type}' of field {table}.{field} is not supported by the {engine} adapter")]
    UnsupportedNativeType {
        engine: String,
        table: String,
        field: String,
        native_type: String,
    },

    /// An introspected foreign key action has no canonical mapping.
    #[error("Foreign key action '{action}' is not supported by the {engine} adapter")]
    UnsupportedForeignKeyAction { engine: String, action: String },

    /// Schema aggregation failed; one entry per conflict found.
    #[error("Schema aggregation failed:\n{}", .0.join("\n"))]
    Aggregation(Vec<String>),

    /// Schema data is invalid for the requested operation.
    #[error("Schema validation failed:\n{0}")]
    Validation(String),

    /// Live schema could not be reconstructed from catalog data.
    #[error("Schema introspection failed: {0}")]
    Introspection(String),

    /// SQL executor error with context
    #[error("Executor error: {message}\n  Context: {context}")]
    Executor { message: String, context: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for invalid schema data or failed aggregation.
pub const EXIT_VALIDATION_ERROR: u8 = 2;
/// Exit code for model/engine mismatches.
pub const EXIT_UNSUPPORTED: u8 = 3;
/// Exit code for database errors.
pub const EXIT_DATABASE_ERROR: u8 = 4;
/// Exit code for IO errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code for everything else.
pub const EXIT_INTERNAL_ERROR: u8 = 10;

impl DbSchemaError {
    /// Create an Executor error with context about where it occurred
    pub fn executor(message: impl ToString, context: impl Into<String>) -> Self {
        DbSchemaError::Executor {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create an InvalidOperation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        DbSchemaError::InvalidOperation(message.into())
    }

    /// Create an UnsupportedFeature error
    pub fn unsupported_feature(
        engine: impl Into<String>,
        table: impl Into<String>,
        field: impl Into<String>,
        feature: impl Into<String>,
    ) -> Self {
        DbSchemaError::UnsupportedFeature {
            engine: engine.into(),
            table: table.into(),
            field: field.into(),
            feature: feature.into(),
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            DbSchemaError::Config(_) | DbSchemaError::Yaml(_) | DbSchemaError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            DbSchemaError::Validation(_) | DbSchemaError::Aggregation(_) => EXIT_VALIDATION_ERROR,
            DbSchemaError::UnsupportedFeature { .. }
            | DbSchemaError::UnsupportedNativeType { .. }
            | DbSchemaError::UnsupportedForeignKeyAction { .. } => EXIT_UNSUPPORTED,
            DbSchemaError::Executor { .. } | DbSchemaError::Introspection(_) => {
                EXIT_DATABASE_ERROR
            }
            DbSchemaError::Io(_) => EXIT_IO_ERROR,
            DbSchemaError::InvalidOperation(_) => EXIT_INTERNAL_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, DbSchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_lists_every_conflict() {
        let err = DbSchemaError::Aggregation(vec![
            "first conflict".to_string(),
            "second conflict".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("first conflict"));
        assert!(msg.contains("second conflict"));
        assert_eq!(err.exit_code(), EXIT_VALIDATION_ERROR);
    }

    #[test]
    fn test_unsupported_feature_message() {
        let err = DbSchemaError::unsupported_feature("sqlite", "lines", "line_no", "AUTOINCREMENT");
        assert_eq!(
            err.to_string(),
            "AUTOINCREMENT on field lines.line_no is not supported by the sqlite engine"
        );
        assert_eq!(err.exit_code(), EXIT_UNSUPPORTED);
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err = DbSchemaError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
    }
}
