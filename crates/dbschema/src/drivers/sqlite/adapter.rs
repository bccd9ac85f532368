//! SQLite engine adapter.
//!
//! SQLite folds keys into the column definition: PRIMARY KEY and REFERENCES
//! are column constraints, and ALTER TABLE can only add columns. Only plain
//! and unique indexes exist as separate objects.

use async_trait::async_trait;

use crate::core::field::{FieldSchema, IndexType};
use crate::core::identifier::quote_sqlite;
use crate::core::schema::Schema;
use crate::core::table::TableSchema;
use crate::core::traits::{ensure_same_field, EngineAdapter, SqlExecutor};
use crate::drivers::common::{column_attributes_match, foreign_details_match, MatchRules};
use crate::error::{DbSchemaError, Result};

use super::introspect;
use super::types::{collation_name, TypeFamily};

/// Engine identifier used in configuration and error messages.
pub const ENGINE_NAME: &str = "sqlite";

const MATCH_RULES: MatchRules = MatchRules {
    unsigned: false,
    length: false,
    enum_values: false,
    collation: true,
    primary_implies_not_null: false,
};

/// SQLite 3 adapter.
#[derive(Debug, Clone, Default)]
pub struct SqliteAdapter;

impl SqliteAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Column definition including key constraints.
    ///
    /// `inline_primary` is set when the table has a single-column primary
    /// key, which is then declared on the column itself.
    fn column_definition(&self, field: &FieldSchema, inline_primary: bool) -> Result<String> {
        let family = TypeFamily::of(field.data_type);
        let mut def = format!("{} {}", quote_sqlite(&field.name)?, family.declared_type());

        if field.not_null {
            def.push_str(" NOT NULL");
        }
        if inline_primary && field.index_type.is_primary() {
            def.push_str(" PRIMARY KEY");
            if field.autoincrement && family == TypeFamily::Integer {
                def.push_str(" AUTOINCREMENT");
            }
        }
        if field.data_type.has_collation() {
            if let Some(collation) = collation_name(field.collation_type) {
                def.push_str(" COLLATE ");
                def.push_str(collation);
            }
        }
        if field.index_type.is_foreign() {
            def.push_str(&format!(
                " CONSTRAINT {} REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
                quote_sqlite(&field.index_name)?,
                quote_sqlite(&field.ref_table)?,
                quote_sqlite(&field.ref_field)?,
                field.on_update_foreign_key.as_sql(),
                field.on_delete_foreign_key.as_sql()
            ));
        }

        Ok(def)
    }

    fn create_index_statement(&self, table: &str, field: &FieldSchema) -> Result<Option<String>> {
        let keyword = match field.index_type {
            IndexType::Unique => "CREATE UNIQUE INDEX",
            IndexType::Simple => "CREATE INDEX",
            _ => return Ok(None),
        };
        Ok(Some(format!(
            "{} {} ON {} ({})",
            keyword,
            quote_sqlite(&field.index_name)?,
            quote_sqlite(table)?,
            quote_sqlite(&field.name)?
        )))
    }
}

/// Index role that exists as a separate index object.
fn standalone_index(field: &FieldSchema) -> Option<IndexType> {
    matches!(field.index_type, IndexType::Unique | IndexType::Simple).then_some(field.index_type)
}

#[async_trait]
impl EngineAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_sqlite(name)
    }

    fn native_data_type(&self, field: &FieldSchema) -> Result<String> {
        Ok(TypeFamily::of(field.data_type).declared_type().to_string())
    }

    fn field_schema_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool> {
        ensure_same_field(gauge, actual)?;
        let (g, a) = (gauge.index_type, actual.index_type);
        Ok(TypeFamily::of(gauge.data_type) == TypeFamily::of(actual.data_type)
            && column_attributes_match(gauge, actual, MATCH_RULES)
            && g.is_primary() == a.is_primary()
            && g.is_foreign() == a.is_foreign()
            && (!g.is_foreign() || foreign_details_match(gauge, actual)))
    }

    fn field_index_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool> {
        ensure_same_field(gauge, actual)?;
        Ok(standalone_index(gauge) == standalone_index(actual))
    }

    fn create_table_statements(&self, table: &TableSchema) -> Result<Vec<String>> {
        let primary: Vec<&FieldSchema> = table.primary_key_fields().collect();
        let inline_primary = primary.len() == 1;

        // AUTOINCREMENT only exists on a column-level INTEGER PRIMARY KEY.
        if let Some(field) = table.fields.iter().find(|f| {
            f.autoincrement && f.data_type.is_integer() && !(inline_primary && f.index_type.is_primary())
        }) {
            return Err(DbSchemaError::unsupported_feature(
                ENGINE_NAME,
                table.name.trim(),
                field.name.trim(),
                "AUTOINCREMENT outside a single-column primary key",
            ));
        }

        let mut lines = Vec::with_capacity(table.fields.len() + 1);
        for field in &table.fields {
            lines.push(self.column_definition(field, inline_primary)?);
        }
        if primary.len() > 1 {
            let columns: Vec<String> = primary
                .iter()
                .map(|f| quote_sqlite(&f.name))
                .collect::<Result<_>>()?;
            lines.push(format!("PRIMARY KEY ({})", columns.join(", ")));
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n    {}\n)",
            quote_sqlite(&table.name)?,
            lines.join(",\n    ")
        )];
        for field in &table.fields {
            if let Some(index) = self.create_index_statement(&table.name, field)? {
                statements.push(index);
            }
        }
        Ok(statements)
    }

    fn drop_table_statements(&self, table: &TableSchema) -> Result<Vec<String>> {
        Ok(vec![format!("DROP TABLE {}", quote_sqlite(&table.name)?)])
    }

    fn add_field_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        let family = TypeFamily::of(field.data_type);

        // ADD COLUMN cannot add a key, and a NOT NULL foreign key would need
        // a default that references an existing row.
        if field.index_type.is_primary()
            || (field.not_null && field.index_type.is_foreign())
            || (field.autoincrement && family == TypeFamily::Integer)
        {
            return Ok(None);
        }

        let mut column = self.column_definition(field, false)?;
        if field.not_null {
            match family.default_literal() {
                Some(default) => column.push_str(&format!(" DEFAULT {}", default)),
                None => return Ok(None),
            }
        }

        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_sqlite(table)?,
            column
        )];
        if let Some(index) = self.create_index_statement(table, field)? {
            statements.push(index);
        }
        Ok(Some(statements))
    }

    fn alter_field_statements(
        &self,
        _table: &str,
        gauge: &FieldSchema,
        actual: &FieldSchema,
    ) -> Result<Option<Vec<String>>> {
        ensure_same_field(gauge, actual)?;
        Ok(None)
    }

    fn drop_field_statements(&self, _table: &str, _field: &FieldSchema) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    fn add_index_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        match field.index_type {
            IndexType::None => Ok(Some(Vec::new())),
            IndexType::Unique | IndexType::Simple => {
                Ok(self.create_index_statement(table, field)?.map(|s| vec![s]))
            }
            _ => Ok(None),
        }
    }

    fn drop_index_statements(&self, _table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        match field.index_type {
            IndexType::None => Ok(Some(Vec::new())),
            IndexType::Unique | IndexType::Simple => Ok(Some(vec![format!(
                "DROP INDEX {}",
                quote_sqlite(&field.index_name)?
            )])),
            _ => Ok(None),
        }
    }

    fn suspend_foreign_keys_statements(&self) -> Vec<String> {
        vec!["PRAGMA foreign_keys = OFF".to_string()]
    }

    fn resume_foreign_keys_statements(&self) -> Vec<String> {
        vec!["PRAGMA foreign_keys = ON".to_string()]
    }

    async fn introspect_schema(&self, executor: &dyn SqlExecutor) -> Result<Schema> {
        introspect::read_schema(executor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_type::DbDataType;
    use crate::core::field::{CollationType, ForeignKeyActionType};

    fn user_fk() -> FieldSchema {
        FieldSchema::new("user_id", DbDataType::Integer)
            .references("orders_user_id_fk", "users", "id")
            .on_delete(ForeignKeyActionType::SetNull)
    }

    #[test]
    fn test_create_table() {
        let adapter = SqliteAdapter::new();
        let table = TableSchema::new("orders")
            .with_field(
                FieldSchema::new("id", DbDataType::IntegerBig)
                    .not_null()
                    .autoincrement()
                    .primary(),
            )
            .with_field(user_fk())
            .with_field(
                FieldSchema::new("code", DbDataType::VarChar)
                    .with_length(8)
                    .not_null()
                    .with_collation(CollationType::AsciiCaseInsensitive)
                    .indexed(IndexType::Unique, "orders_code_idx"),
            );

        let statements = adapter.create_table_statements(&table).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE \"orders\" (\n    \
                 \"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,\n    \
                 \"user_id\" INTEGER CONSTRAINT \"orders_user_id_fk\" REFERENCES \"users\" (\"id\") ON UPDATE RESTRICT ON DELETE SET NULL,\n    \
                 \"code\" TEXT NOT NULL COLLATE NOCASE\n\
                 )",
                "CREATE UNIQUE INDEX \"orders_code_idx\" ON \"orders\" (\"code\")",
            ]
        );
    }

    #[test]
    fn test_composite_primary_key() {
        let adapter = SqliteAdapter::new();
        let table = TableSchema::new("memberships")
            .with_field(FieldSchema::new("group_id", DbDataType::Integer).not_null().primary())
            .with_field(FieldSchema::new("user_id", DbDataType::Integer).not_null().primary());
        let sql = &adapter.create_table_statements(&table).unwrap()[0];
        assert!(sql.contains("PRIMARY KEY (\"group_id\", \"user_id\")"));
        assert!(!sql.contains("INTEGER NOT NULL PRIMARY KEY"));
    }

    #[test]
    fn test_autoincrement_needs_single_primary_key() {
        let adapter = SqliteAdapter::new();
        let composite = TableSchema::new("lines")
            .with_field(FieldSchema::new("order_id", DbDataType::Integer).not_null().primary())
            .with_field(
                FieldSchema::new("line_no", DbDataType::Integer)
                    .not_null()
                    .autoincrement()
                    .primary(),
            );
        let err = adapter.create_table_statements(&composite).unwrap_err();
        assert!(matches!(
            &err,
            DbSchemaError::UnsupportedFeature { table, field, .. } if table == "lines" && field == "line_no"
        ));

        let not_a_key = TableSchema::new("counters")
            .with_field(FieldSchema::new("id", DbDataType::Integer).not_null().primary())
            .with_field(FieldSchema::new("seq", DbDataType::IntegerBig).autoincrement());
        assert!(matches!(
            adapter.create_table_statements(&not_a_key),
            Err(DbSchemaError::UnsupportedFeature { .. })
        ));
    }

    #[test]
    fn test_text_family_matches() {
        let adapter = SqliteAdapter::new();
        let gauge = FieldSchema::new("name", DbDataType::VarChar).with_length(50);
        let actual = FieldSchema::new("name", DbDataType::Text);
        assert!(adapter.field_schema_match(&gauge, &actual).unwrap());

        let gauge = FieldSchema::new("n", DbDataType::Integer).unsigned();
        let actual = FieldSchema::new("n", DbDataType::IntegerBig);
        assert!(adapter.field_schema_match(&gauge, &actual).unwrap());

        let gauge = FieldSchema::new("n", DbDataType::Integer);
        let actual = FieldSchema::new("n", DbDataType::Text);
        assert!(!adapter.field_schema_match(&gauge, &actual).unwrap());
    }

    #[test]
    fn test_key_role_is_part_of_schema_match() {
        let adapter = SqliteAdapter::new();
        let gauge = user_fk();
        let actual = FieldSchema::new("user_id", DbDataType::Integer);
        assert!(!adapter.field_schema_match(&gauge, &actual).unwrap());
        assert!(adapter.field_index_match(&gauge, &actual).unwrap());

        let actual = user_fk().on_delete(ForeignKeyActionType::Cascade);
        assert!(!adapter.field_schema_match(&gauge, &actual).unwrap());

        let gauge = FieldSchema::new("id", DbDataType::Integer).primary();
        let actual = FieldSchema::new("id", DbDataType::Integer);
        assert!(!adapter.field_schema_match(&gauge, &actual).unwrap());
        assert!(adapter.field_index_match(&gauge, &actual).unwrap());
    }

    #[test]
    fn test_index_match_compares_standalone_indexes() {
        let adapter = SqliteAdapter::new();
        let gauge = FieldSchema::new("email", DbDataType::Text).indexed(IndexType::Unique, "users_email_idx");
        let actual = FieldSchema::new("email", DbDataType::Text).indexed(IndexType::Simple, "users_email_idx");
        assert!(adapter.field_schema_match(&gauge, &actual).unwrap());
        assert!(!adapter.field_index_match(&gauge, &actual).unwrap());
    }

    #[test]
    fn test_add_field_uses_type_default() {
        let adapter = SqliteAdapter::new();
        let field = FieldSchema::new("created", DbDataType::Date)
            .not_null()
            .indexed(IndexType::Simple, "users_created_idx");
        let statements = adapter.add_field_statements("users", &field).unwrap().unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE \"users\" ADD COLUMN \"created\" DATE NOT NULL DEFAULT '1970-01-01'",
                "CREATE INDEX \"users_created_idx\" ON \"users\" (\"created\")",
            ]
        );
    }

    #[test]
    fn test_add_field_unrepairable_cases() {
        let adapter = SqliteAdapter::new();
        let blob = FieldSchema::new("photo", DbDataType::Blob).not_null();
        assert!(adapter.add_field_statements("users", &blob).unwrap().is_none());

        let fk = user_fk().not_null();
        assert!(adapter.add_field_statements("orders", &fk).unwrap().is_none());

        let pk = FieldSchema::new("id", DbDataType::Integer).primary();
        assert!(adapter.add_field_statements("orders", &pk).unwrap().is_none());

        let nullable_fk = adapter.add_field_statements("orders", &user_fk()).unwrap().unwrap();
        assert_eq!(nullable_fk.len(), 1);
        assert!(nullable_fk[0].contains("REFERENCES \"users\""));
    }

    #[test]
    fn test_alter_and_drop_are_unrepairable() {
        let adapter = SqliteAdapter::new();
        let gauge = FieldSchema::new("name", DbDataType::Text).not_null();
        let actual = FieldSchema::new("name", DbDataType::Text);
        assert!(adapter.alter_field_statements("users", &gauge, &actual).unwrap().is_none());
        assert!(adapter.drop_field_statements("users", &actual).unwrap().is_none());
        assert!(adapter.replace_field_statements("users", &gauge, &actual).unwrap().is_none());
    }

    #[test]
    fn test_index_statements() {
        let adapter = SqliteAdapter::new();
        let field = FieldSchema::new("email", DbDataType::Text).indexed(IndexType::Simple, "users_email_idx");
        assert_eq!(
            adapter.drop_index_statements("users", &field).unwrap(),
            Some(vec!["DROP INDEX \"users_email_idx\"".to_string()])
        );
        assert!(adapter.add_index_statements("orders", &user_fk()).unwrap().is_none());
        assert_eq!(
            adapter
                .add_index_statements("users", &FieldSchema::new("x", DbDataType::Text))
                .unwrap(),
            Some(vec![])
        );
    }
}
