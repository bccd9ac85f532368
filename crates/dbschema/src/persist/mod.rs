//! Schema file persistence.
//!
//! Schemas are stored as YAML, or as JSON when the file name ends in
//! `.json`. Every attribute is written, empty strings included, and missing
//! attributes load as their defaults.

use std::path::Path;

use tracing::debug;

use crate::core::schema::Schema;
use crate::error::Result;

/// On-disk schema file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Yaml,
    Json,
}

impl SchemaFormat {
    /// Format implied by a file extension; YAML unless it is `.json`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SchemaFormat::Json,
            _ => SchemaFormat::Yaml,
        }
    }
}

/// Parse a schema from text.
pub fn from_str(content: &str, format: SchemaFormat) -> Result<Schema> {
    Ok(match format {
        SchemaFormat::Yaml => serde_yaml::from_str(content)?,
        SchemaFormat::Json => serde_json::from_str(content)?,
    })
}

/// Render a schema as text.
pub fn to_string(schema: &Schema, format: SchemaFormat) -> Result<String> {
    Ok(match format {
        SchemaFormat::Yaml => serde_yaml::to_string(schema)?,
        SchemaFormat::Json => serde_json::to_string_pretty(schema)?,
    })
}

/// Load a schema file.
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<Schema> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let schema = from_str(&content, SchemaFormat::from_path(path))?;
    debug!(
        "Loaded schema '{}' with {} tables from {}",
        schema.description,
        schema.tables.len(),
        path.display()
    );
    Ok(schema)
}

/// Save a schema file, replacing it atomically.
pub fn save_schema<P: AsRef<Path>>(schema: &Schema, path: P) -> Result<()> {
    let path = path.as_ref();
    let content = to_string(schema, SchemaFormat::from_path(path))?;

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, &content)?;
    std::fs::rename(&temp_path, path)?;

    debug!("Saved schema '{}' to {}", schema.description, path.display());
    Ok(())
}
