//! Canonical database schema: a set of tables, optionally extended.
//!
//! A schema is either a base schema (empty `extension_guid`) or an extension
//! schema identified by a GUID. Applications ship one base schema plus any
//! number of extensions and aggregate them with [`Schema::aggregate`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbSchemaError, Result};

use super::data_errors::DataErrors;
use super::field::IndexType;
use super::identifier::{name_key, names_equal};
use super::table::TableSchema;

/// Canonical database schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub description: String,

    /// Empty for a base schema; the GUID (string form) of an extension schema.
    pub extension_guid: String,

    /// Tables; names are unique (case-insensitive).
    pub tables: Vec<TableSchema>,
}

impl Schema {
    /// Create an empty base schema.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Append a table.
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    /// Whether this is a base (non-extension) schema.
    pub fn is_base(&self) -> bool {
        self.extension_guid.trim().is_empty()
    }

    /// Parsed extension GUID; `None` for a base schema or an unparsable GUID.
    pub fn extension_id(&self) -> Option<Uuid> {
        Uuid::parse_str(self.extension_guid.trim()).ok()
    }

    /// Find a table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| names_equal(&t.name, name))
    }

    /// Find a table by name for mutation (case-insensitive).
    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableSchema> {
        self.tables.iter_mut().find(|t| names_equal(&t.name, name))
    }

    /// Merge one base schema with extension schemas.
    ///
    /// Exactly one schema in `schemas` must be a base schema. Every extension
    /// GUID must parse. Extension table names must not collide with the base
    /// tables nor with tables of extensions merged before them. When
    /// `extensions` is given, only extensions whose GUID is listed are merged.
    ///
    /// All conflicts are collected before failing, so the error lists every
    /// one of them.
    pub fn aggregate(schemas: &[Schema], extensions: Option<&[Uuid]>) -> Result<Schema> {
        let mut conflicts = Vec::new();

        let bases: Vec<&Schema> = schemas.iter().filter(|s| s.is_base()).collect();
        match bases.len() {
            0 => conflicts.push("No base schema (empty extension GUID) was supplied.".to_string()),
            1 => {}
            n => conflicts.push(format!(
                "{} base schemas were supplied ({}); exactly one is allowed.",
                n,
                bases
                    .iter()
                    .map(|s| schema_label(s))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }

        let mut result = Schema {
            description: bases.first().map(|b| b.description.clone()).unwrap_or_default(),
            extension_guid: String::new(),
            tables: Vec::new(),
        };

        // table key -> owner label
        let mut owners: HashMap<String, String> = HashMap::new();
        if let Some(base) = bases.first() {
            let label = schema_label(base);
            for table in &base.tables {
                owners.entry(name_key(&table.name)).or_insert_with(|| label.clone());
                result.tables.push(table.clone());
            }
        }

        for ext in schemas.iter().filter(|s| !s.is_base()) {
            let Some(guid) = ext.extension_id() else {
                conflicts.push(format!(
                    "Extension schema '{}' has an invalid GUID '{}'.",
                    ext.description,
                    ext.extension_guid.trim()
                ));
                continue;
            };

            if let Some(filter) = extensions {
                if !filter.contains(&guid) {
                    debug!("Skipping extension schema {} (not requested)", guid);
                    continue;
                }
            }

            let label = schema_label(ext);
            let mut accepted = Vec::new();
            let mut seen = HashSet::new();
            for table in &ext.tables {
                let key = name_key(&table.name);
                if !seen.insert(key.clone()) {
                    conflicts.push(format!(
                        "Table '{}' appears more than once in {}.",
                        table.name.trim(),
                        label
                    ));
                } else if let Some(owner) = owners.get(&key) {
                    conflicts.push(format!(
                        "Table '{}' of {} conflicts with the table of {}.",
                        table.name.trim(),
                        label,
                        owner
                    ));
                } else {
                    accepted.push((key, table));
                }
            }
            for (key, table) in accepted {
                owners.insert(key, label.clone());
                result.tables.push(table.clone());
            }
        }

        if !conflicts.is_empty() {
            return Err(DbSchemaError::Aggregation(conflicts));
        }

        debug!(
            "Aggregated schema with {} tables from {} source schemas",
            result.tables.len(),
            schemas.len()
        );
        Ok(result)
    }

    /// Check the schema invariants and those of every table and field.
    ///
    /// Table errors are keyed `{table}.{property}`, field errors
    /// `{table}.{field}.{property}`.
    pub fn data_errors(&self) -> DataErrors {
        let mut errors = DataErrors::new();

        if self.tables.is_empty() {
            errors.add("tables", "Schema has no tables.");
        }

        if !self.is_base() && self.extension_id().is_none() {
            errors.add(
                "extension_guid",
                format!(
                    "Extension GUID '{}' is not a valid GUID.",
                    self.extension_guid.trim()
                ),
            );
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if !table.name.trim().is_empty() && !seen.insert(name_key(&table.name)) {
                errors.add(
                    "tables",
                    format!("Table name '{}' is not unique.", table.name.trim()),
                );
            }
        }

        for (i, table) in self.tables.iter().enumerate() {
            let prefix = if table.name.trim().is_empty() {
                format!("tables[{}]", i)
            } else {
                table.name.trim().to_string()
            };
            errors.merge_prefixed(&prefix, table.data_errors());
        }

        errors
    }

    /// Validation report, one violation per line; empty when valid.
    pub fn data_errors_string(&self) -> String {
        self.data_errors().to_report()
    }

    /// Whether no two Simple/Unique index names repeat in the schema.
    pub fn all_indexes_unique(&self) -> bool {
        let mut seen = HashSet::new();
        self.tables
            .iter()
            .flat_map(|t| t.fields.iter())
            .filter(|f| matches!(f.index_type, IndexType::Simple | IndexType::Unique))
            .all(|f| seen.insert(name_key(&f.index_name)))
    }

    /// Derive deterministic index names for every field of every table.
    pub fn set_safe_index_names(&mut self) {
        for table in &mut self.tables {
            table.set_safe_index_names();
        }
    }

    /// Tables ordered so referenced tables precede referencing ones.
    ///
    /// Foreign-key cycles are handled best effort, see
    /// [`TableSchema::list_ordered_by_foreign_key`].
    pub fn tables_in_create_order(&self) -> Vec<&TableSchema> {
        TableSchema::list_ordered_by_foreign_key(&self.tables)
    }
}

fn schema_label(schema: &Schema) -> String {
    if schema.is_base() {
        format!("base schema '{}'", schema.description)
    } else {
        format!(
            "extension schema {} '{}'",
            schema.extension_guid.trim(),
            schema.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_type::DbDataType;
    use crate::core::field::FieldSchema;

    const EXT_A: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
    const EXT_B: &str = "0e984725-c51c-4bf4-9960-e1c80e27aba0";

    fn table(name: &str) -> TableSchema {
        TableSchema::new(name)
            .with_field(FieldSchema::new("id", DbDataType::Integer).not_null().primary())
    }

    fn base(tables: &[&str]) -> Schema {
        let mut schema = Schema::new("base");
        schema.tables = tables.iter().map(|t| table(t)).collect();
        schema
    }

    fn extension(guid: &str, tables: &[&str]) -> Schema {
        let mut schema = base(tables);
        schema.description = format!("ext {}", guid);
        schema.extension_guid = guid.to_string();
        schema
    }

    #[test]
    fn test_aggregate_single_base_is_identity() {
        let b = base(&["users", "orders"]);
        let result = Schema::aggregate(std::slice::from_ref(&b), None).unwrap();
        assert_eq!(result, b);
    }

    #[test]
    fn test_aggregate_merges_extensions() {
        let schemas = vec![
            extension(EXT_A, &["ext_a"]),
            base(&["users"]),
            extension(EXT_B, &["ext_b"]),
        ];
        let result = Schema::aggregate(&schemas, None).unwrap();
        let names: Vec<_> = result.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["users", "ext_a", "ext_b"]);
        assert!(result.is_base());
    }

    #[test]
    fn test_aggregate_respects_extension_filter() {
        let schemas = vec![
            base(&["users"]),
            extension(EXT_A, &["ext_a"]),
            extension(EXT_B, &["ext_b"]),
        ];
        let only_b = [Uuid::parse_str(EXT_B).unwrap()];
        let result = Schema::aggregate(&schemas, Some(&only_b)).unwrap();
        assert!(result.table("ext_b").is_some());
        assert!(result.table("ext_a").is_none());
    }

    #[test]
    fn test_aggregate_reports_both_owners_on_collision() {
        let schemas = vec![base(&["users"]), extension(EXT_A, &["USERS"])];
        let err = Schema::aggregate(&schemas, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("USERS"), "{msg}");
        assert!(msg.contains("base schema 'base'"), "{msg}");
        assert!(msg.contains(EXT_A), "{msg}");
    }

    #[test]
    fn test_aggregate_reports_every_conflict() {
        let schemas = vec![
            base(&["users"]),
            extension(EXT_A, &["users", "shared"]),
            extension(EXT_B, &["shared"]),
            extension("not-a-guid", &["other"]),
        ];
        match Schema::aggregate(&schemas, None) {
            Err(DbSchemaError::Aggregation(conflicts)) => {
                assert_eq!(conflicts.len(), 3, "{conflicts:?}");
                assert!(conflicts.iter().any(|c| c.contains("not-a-guid")));
                assert!(conflicts.iter().any(|c| c.contains("'shared'") && c.contains(EXT_B)));
            }
            other => panic!("expected aggregation error, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_rejects_table_repeated_within_extension() {
        let schemas = vec![base(&["users"]), extension(EXT_A, &["points", "Points"])];
        match Schema::aggregate(&schemas, None) {
            Err(DbSchemaError::Aggregation(conflicts)) => {
                assert_eq!(conflicts.len(), 1, "{conflicts:?}");
                assert!(conflicts[0].contains("'Points' appears more than once"), "{conflicts:?}");
                assert!(conflicts[0].contains(EXT_A));
            }
            other => panic!("expected aggregation error, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_requires_exactly_one_base() {
        assert!(Schema::aggregate(&[extension(EXT_A, &["a"])], None).is_err());
        assert!(Schema::aggregate(&[base(&["a"]), base(&["b"])], None).is_err());
    }

    #[test]
    fn test_data_errors() {
        let empty = Schema::new("empty");
        assert!(empty.data_errors().contains("tables"));

        let mut bad_guid = base(&["users"]);
        bad_guid.extension_guid = "xyz".to_string();
        assert!(bad_guid.data_errors().contains("extension_guid"));

        let dup = base(&["users", "Users"]);
        assert!(dup.data_errors().contains("tables"));

        let valid = base(&["users"]);
        assert!(valid.data_errors().is_empty());
        assert_eq!(valid.data_errors_string(), "");
    }

    #[test]
    fn test_data_errors_string_nests_field_errors() {
        let mut schema = base(&["users"]);
        schema.tables[0]
            .fields
            .push(FieldSchema::new("full name", DbDataType::Text));
        let report = schema.data_errors_string();
        assert!(report.contains("users.full name.name: "), "{report}");
    }

    #[test]
    fn test_all_indexes_unique() {
        let mut schema = base(&["users", "orders"]);
        schema.tables[0].fields.push(
            FieldSchema::new("email", DbDataType::VarChar)
                .with_length(100)
                .indexed(IndexType::Unique, "email_idx"),
        );
        assert!(schema.all_indexes_unique());

        schema.tables[1].fields.push(
            FieldSchema::new("email", DbDataType::VarChar)
                .with_length(100)
                .indexed(IndexType::Simple, "EMAIL_IDX"),
        );
        assert!(!schema.all_indexes_unique());

        schema.set_safe_index_names();
        assert!(schema.all_indexes_unique());
        assert_eq!(schema.tables[1].fields[1].index_name, "orders_email_idx");
    }

    #[test]
    fn test_tables_in_create_order() {
        let mut schema = base(&["orders", "customers"]);
        schema.tables[0].fields.push(
            FieldSchema::new("customer_id", DbDataType::Integer)
                .references("orders_customer_id_fk", "customers", "id"),
        );
        let order: Vec<_> = schema
            .tables_in_create_order()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(order, vec!["customers", "orders"]);
    }
}
