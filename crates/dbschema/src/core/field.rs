//! Canonical field (column) definition.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::data_errors::DataErrors;
use super::data_type::DbDataType;

/// Index or key role carried by a single field.
///
/// A field carries at most one role; multi-column indexes are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    #[default]
    None,
    Primary,
    Unique,
    Simple,
    ForeignKey,
    /// Primary key that is also a foreign key (one-to-one extension tables).
    ForeignPrimary,
}

impl IndexType {
    /// Roles that reference another table.
    pub fn is_foreign(&self) -> bool {
        matches!(self, IndexType::ForeignKey | IndexType::ForeignPrimary)
    }

    /// Roles that make the field (part of) the primary key.
    pub fn is_primary(&self) -> bool {
        matches!(self, IndexType::Primary | IndexType::ForeignPrimary)
    }

    /// Roles that require an explicit index name.
    pub fn requires_name(&self) -> bool {
        !matches!(self, IndexType::None | IndexType::Primary)
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Referential action for ON UPDATE / ON DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForeignKeyActionType {
    Cascade,
    #[default]
    Restrict,
    SetNull,
}

impl ForeignKeyActionType {
    /// SQL keyword(s) for the action.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyActionType::Cascade => "CASCADE",
            ForeignKeyActionType::Restrict => "RESTRICT",
            ForeignKeyActionType::SetNull => "SET NULL",
        }
    }

    /// Parse a catalog action name. `NO ACTION` is treated as `RESTRICT`.
    pub fn from_sql(action: &str) -> Option<Self> {
        match action.trim().to_uppercase().as_str() {
            "CASCADE" => Some(ForeignKeyActionType::Cascade),
            "RESTRICT" | "NO ACTION" => Some(ForeignKeyActionType::Restrict),
            "SET NULL" => Some(ForeignKeyActionType::SetNull),
            _ => None,
        }
    }
}

/// Collation of character fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollationType {
    /// Table/database default collation.
    #[default]
    Default,
    /// ASCII, compared byte-wise.
    AsciiBinary,
    /// ASCII, compared case-insensitively.
    AsciiCaseInsensitive,
}

/// Canonical definition of one table column.
///
/// Constructed with defaults and mutated freely; invariants are checked on
/// demand by [`FieldSchema::data_errors`], never on assignment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    /// Field name; trimmed, non-empty, no blank space.
    pub name: String,

    pub data_type: DbDataType,

    /// Length of Char/VarChar fields; ignored for other types.
    pub length: i32,

    pub not_null: bool,

    /// Only valid on integer types.
    pub autoincrement: bool,

    pub unsigned: bool,

    /// Comma-separated values of an Enum field (at least two).
    pub enum_values: String,

    pub description: String,

    /// Only meaningful on collation-bearing types.
    pub collation_type: CollationType,

    pub index_type: IndexType,

    /// Required unless the index type is None or Primary.
    pub index_name: String,

    pub on_update_foreign_key: ForeignKeyActionType,

    pub on_delete_foreign_key: ForeignKeyActionType,

    /// Referenced table of a foreign key.
    pub ref_table: String,

    /// Referenced field of a foreign key.
    pub ref_field: String,
}

impl FieldSchema {
    /// Create a nullable field with no index.
    pub fn new(name: impl Into<String>, data_type: DbDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            ..Default::default()
        }
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub fn with_enum_values(mut self, values: impl Into<String>) -> Self {
        self.enum_values = values.into();
        self
    }

    pub fn with_collation(mut self, collation: CollationType) -> Self {
        self.collation_type = collation;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Make the field (part of) the primary key.
    pub fn primary(mut self) -> Self {
        self.index_type = IndexType::Primary;
        self
    }

    /// Give the field a Simple or Unique index.
    pub fn indexed(mut self, index_type: IndexType, index_name: impl Into<String>) -> Self {
        self.index_type = index_type;
        self.index_name = index_name.into();
        self
    }

    /// Make the field a foreign key to `ref_table.ref_field`.
    pub fn references(
        mut self,
        index_name: impl Into<String>,
        ref_table: impl Into<String>,
        ref_field: impl Into<String>,
    ) -> Self {
        self.index_type = if self.index_type.is_primary() {
            IndexType::ForeignPrimary
        } else {
            IndexType::ForeignKey
        };
        self.index_name = index_name.into();
        self.ref_table = ref_table.into();
        self.ref_field = ref_field.into();
        self
    }

    pub fn on_update(mut self, action: ForeignKeyActionType) -> Self {
        self.on_update_foreign_key = action;
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyActionType) -> Self {
        self.on_delete_foreign_key = action;
        self
    }

    /// Enum values normalized for comparison: trimmed, lowercased, de-duplicated.
    pub fn enum_value_set(&self) -> BTreeSet<String> {
        split_enum_values(&self.enum_values)
            .into_iter()
            .map(|v| v.to_lowercase())
            .collect()
    }

    /// Enum values as written, trimmed, empty entries dropped.
    pub fn enum_value_list(&self) -> Vec<String> {
        split_enum_values(&self.enum_values)
    }

    /// Engine-agnostic textual definition for display and debugging.
    ///
    /// Not executable DDL; engine adapters produce that.
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name.trim(), self.data_type.to_string().to_uppercase());

        if self.data_type.has_length() {
            def.push_str(&format!("({})", self.length));
        } else if self.data_type == DbDataType::Enum {
            def.push_str(&format!("({})", self.enum_value_list().join(", ")));
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.unsigned && self.data_type.is_numeric() {
            def.push_str(" UNSIGNED");
        }
        if self.autoincrement && self.data_type.is_integer() {
            def.push_str(" AUTOINCREMENT");
        }
        if self.index_type.is_primary() {
            def.push_str(" PRIMARY KEY");
        }
        if self.data_type.has_collation() && self.collation_type != CollationType::Default {
            def.push_str(&format!(" COLLATE {:?}", self.collation_type));
        }

        match self.index_type {
            IndexType::Simple => def.push_str(&format!(" INDEX {}", self.index_name)),
            IndexType::Unique => def.push_str(&format!(" UNIQUE INDEX {}", self.index_name)),
            IndexType::ForeignKey | IndexType::ForeignPrimary => def.push_str(&format!(
                " FOREIGN KEY {} REFERENCES {}({}) ON UPDATE {} ON DELETE {}",
                self.index_name,
                self.ref_table,
                self.ref_field,
                self.on_update_foreign_key.as_sql(),
                self.on_delete_foreign_key.as_sql()
            )),
            IndexType::None | IndexType::Primary => {}
        }

        def
    }

    /// Check the field invariants.
    ///
    /// Returns an empty map when the field is valid.
    pub fn data_errors(&self) -> DataErrors {
        let mut errors = DataErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "Field name is not specified.");
        } else if self.name.trim().contains(char::is_whitespace) {
            errors.add(
                "name",
                format!("Field name '{}' contains blank space.", self.name.trim()),
            );
        }

        if self.length < 0 {
            errors.add(
                "length",
                format!("Field length cannot be negative ({}).", self.length),
            );
        }

        if self.autoincrement && !self.data_type.is_integer() {
            errors.add(
                "autoincrement",
                format!(
                    "Autoincrement is only allowed for integer types, not {}.",
                    self.data_type
                ),
            );
        }

        if self.data_type == DbDataType::Enum {
            match self.enum_value_list().len() {
                0 => errors.add("enum_values", "Enum values are not specified."),
                1 => errors.add("enum_values", "Enum requires at least two values."),
                _ => {}
            }
        }

        if self.index_type.requires_name() && self.index_name.trim().is_empty() {
            errors.add(
                "index_name",
                format!("Index name is required for index type {}.", self.index_type),
            );
        }

        if self.index_type.is_foreign() {
            if self.ref_table.trim().is_empty() {
                errors.add("ref_table", "Foreign key requires a referenced table.");
            }
            if self.ref_field.trim().is_empty() {
                errors.add("ref_field", "Foreign key requires a referenced field.");
            }
        }

        errors
    }

    /// Derive a deterministic index name from the table and field names.
    ///
    /// `{table}_{field}_fk` for foreign roles, `{table}_{field}_idx` for other
    /// indexes, lowercased. No-op for None and Primary.
    pub fn set_safe_index_name(&mut self, table_name: &str) {
        if !self.index_type.requires_name() {
            return;
        }
        let suffix = if self.index_type.is_foreign() { "fk" } else { "idx" };
        self.index_name = format!("{}_{}_{}", table_name.trim(), self.name.trim(), suffix)
            .to_lowercase();
    }
}

fn split_enum_values(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
