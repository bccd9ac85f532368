//! Canonical table definition and foreign-key creation order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data_errors::DataErrors;
use super::field::FieldSchema;
use super::identifier::{name_key, names_equal};

/// Canonical definition of a table.
///
/// Field order is kept for DDL output but carries no meaning; field names
/// must be unique within the table (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub name: String,

    pub description: String,

    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a field.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Find a field by name (case-insensitive).
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| names_equal(&f.name, name))
    }

    /// Find a field by name for mutation (case-insensitive).
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldSchema> {
        self.fields.iter_mut().find(|f| names_equal(&f.name, name))
    }

    /// Fields forming the primary key, in declaration order.
    pub fn primary_key_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.index_type.is_primary())
    }

    /// Names of the tables this table references through foreign keys.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.index_type.is_foreign() && !f.ref_table.trim().is_empty())
            .map(|f| f.ref_table.as_str())
    }

    /// Check the table invariants and those of every field.
    ///
    /// Field errors are keyed `{field}.{property}`.
    pub fn data_errors(&self) -> DataErrors {
        let mut errors = DataErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "Table name is not specified.");
        } else if self.name.trim().contains(char::is_whitespace) {
            errors.add(
                "name",
                format!("Table name '{}' contains blank space.", self.name.trim()),
            );
        }

        if self.fields.is_empty() {
            errors.add("fields", "Table has no fields.");
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !field.name.trim().is_empty() && !seen.insert(name_key(&field.name)) {
                errors.add(
                    "fields",
                    format!("Field name '{}' is not unique.", field.name.trim()),
                );
            }
        }

        for (i, field) in self.fields.iter().enumerate() {
            let prefix = if field.name.trim().is_empty() {
                format!("fields[{}]", i)
            } else {
                field.name.trim().to_string()
            };
            errors.merge_prefixed(&prefix, field.data_errors());
        }

        errors
    }

    /// Rewrite the index names of every field, see
    /// [`FieldSchema::set_safe_index_name`].
    pub fn set_safe_index_names(&mut self) {
        let table_name = self.name.clone();
        for field in &mut self.fields {
            field.set_safe_index_name(&table_name);
        }
    }

    /// Order `all_tables` so that every referenced table precedes the tables
    /// referencing it.
    ///
    /// Depth-first: before a table is emitted, every table it references
    /// (looked up case-insensitively within `all_tables`) is emitted. A table
    /// is marked as processed when it is entered, so each table is emitted
    /// exactly once. Foreign-key cycles are tolerated, not resolved: the
    /// tables of a cycle come out in first-encountered order, which is not a
    /// valid creation order for the cycle itself. A warning is logged for
    /// each cycle edge found.
    pub fn list_ordered_by_foreign_key(all_tables: &[TableSchema]) -> Vec<&TableSchema> {
        let by_name: HashMap<String, &TableSchema> =
            all_tables.iter().map(|t| (name_key(&t.name), t)).collect();

        let mut state = OrderState {
            by_name,
            processed: HashSet::new(),
            emitted: HashSet::new(),
            ordered: Vec::with_capacity(all_tables.len()),
        };

        for table in all_tables {
            state.visit(table);
        }

        state.ordered
    }
}

/// Traversal bookkeeping for [`TableSchema::list_ordered_by_foreign_key`].
///
/// Kept outside `TableSchema` so each computation starts from a clean state.
struct OrderState<'a> {
    by_name: HashMap<String, &'a TableSchema>,
    processed: HashSet<String>,
    emitted: HashSet<String>,
    ordered: Vec<&'a TableSchema>,
}

impl<'a> OrderState<'a> {
    fn visit(&mut self, table: &'a TableSchema) {
        let key = name_key(&table.name);
        if !self.processed.insert(key.clone()) {
            return;
        }

        for ref_table in table.referenced_tables() {
            let ref_key = name_key(ref_table);
            match self.by_name.get(&ref_key).copied() {
                Some(referenced) => {
                    if self.processed.contains(&ref_key) && !self.emitted.contains(&ref_key) {
                        if ref_key != key {
                            warn!(
                                "Foreign key cycle between tables '{}' and '{}'; creation order is best effort",
                                table.name.trim(),
                                referenced.name.trim()
                            );
                        }
                        continue;
                    }
                    self.visit(referenced);
                }
                None => debug!(
                    "Table '{}' references '{}' which is not part of the schema",
                    table.name.trim(),
                    ref_table.trim()
                ),
            }
        }

        self.emitted.insert(key);
        self.ordered.push(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_type::DbDataType;
    use crate::core::field::IndexType;

    fn table_with_fk(name: &str, refs: &[&str]) -> TableSchema {
        let mut table = TableSchema::new(name)
            .with_field(FieldSchema::new("id", DbDataType::Integer).not_null().primary());
        for r in refs {
            table.fields.push(
                FieldSchema::new(format!("{}_id", r), DbDataType::Integer).references(
                    format!("{}_{}_id_fk", name, r),
                    *r,
                    "id",
                ),
            );
        }
        table
    }

    fn names(tables: &[&TableSchema]) -> Vec<String> {
        tables.iter().map(|t| t.name.clone()).collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_create_order_for_every_permutation() {
        let a = table_with_fk("a", &[]);
        let b = table_with_fk("b", &["a"]);
        let c = table_with_fk("c", &["b"]);

        let permutations = [
            [&a, &b, &c],
            [&a, &c, &b],
            [&b, &a, &c],
            [&b, &c, &a],
            [&c, &a, &b],
            [&c, &b, &a],
        ];

        for perm in permutations {
            let tables: Vec<TableSchema> = perm.iter().map(|t| (*t).clone()).collect();
            let order = names(&TableSchema::list_ordered_by_foreign_key(&tables));
            assert_eq!(order.len(), 3);
            assert!(position(&order, "a") < position(&order, "b"), "{order:?}");
            assert!(position(&order, "b") < position(&order, "c"), "{order:?}");
        }
    }

    #[test]
    fn test_reference_lookup_is_case_insensitive() {
        let tables = vec![table_with_fk("Orders", &["CUSTOMERS"]), table_with_fk("customers", &[])];
        let order = names(&TableSchema::list_ordered_by_foreign_key(&tables));
        assert_eq!(order, vec!["customers", "Orders"]);
    }

    #[test]
    fn test_unknown_reference_is_ignored() {
        let tables = vec![table_with_fk("orders", &["external"])];
        let order = names(&TableSchema::list_ordered_by_foreign_key(&tables));
        assert_eq!(order, vec!["orders"]);
    }

    // Cycles are best effort: each table is emitted once, no error is raised.
    #[test]
    fn test_self_reference_emitted_once() {
        let tables = vec![table_with_fk("nodes", &["nodes"])];
        let order = names(&TableSchema::list_ordered_by_foreign_key(&tables));
        assert_eq!(order, vec!["nodes"]);
    }

    #[test]
    fn test_mutual_reference_emitted_once_each() {
        let tables = vec![table_with_fk("x", &["y"]), table_with_fk("y", &["x"])];
        let order = names(&TableSchema::list_ordered_by_foreign_key(&tables));
        assert_eq!(order, vec!["y", "x"]);
    }

    #[test]
    fn test_repeated_computation_is_stable() {
        let tables = vec![table_with_fk("b", &["a"]), table_with_fk("a", &[])];
        let first = names(&TableSchema::list_ordered_by_foreign_key(&tables));
        let second = names(&TableSchema::list_ordered_by_foreign_key(&tables));
        assert_eq!(first, second);
    }

    #[test]
    fn test_data_errors_duplicate_fields() {
        let table = TableSchema::new("users")
            .with_field(FieldSchema::new("id", DbDataType::Integer))
            .with_field(FieldSchema::new("ID", DbDataType::Integer));
        let errors = table.data_errors();
        assert!(errors.contains("fields"));
    }

    #[test]
    fn test_data_errors_include_field_errors() {
        let mut field = FieldSchema::new("email", DbDataType::VarChar).with_length(10);
        field.index_type = IndexType::Simple;
        let table = TableSchema::new("users").with_field(field);
        let errors = table.data_errors();
        assert!(errors.contains("email.index_name"));
    }

    #[test]
    fn test_data_errors_empty_table() {
        let errors = TableSchema::new("users").data_errors();
        assert!(errors.contains("fields"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn test_set_safe_index_names() {
        let mut table = table_with_fk("orders", &["customers"]);
        table.set_safe_index_names();
        assert_eq!(table.fields[1].index_name, "orders_customers_id_fk");
        assert_eq!(table.fields[0].index_name, "");
    }
}
