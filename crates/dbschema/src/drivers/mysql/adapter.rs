//! MySQL engine adapter.
//!
//! Keys are separate index objects in MySQL: the column definition carries
//! type, nullability, collation and AUTO_INCREMENT only, while PRIMARY KEY,
//! UNIQUE/plain indexes and FOREIGN KEY constraints are added and dropped on
//! their own. Compatible with MySQL 5.7+, 8.0+ and MariaDB 10.2+.

use async_trait::async_trait;

use crate::core::field::{FieldSchema, IndexType};
use crate::core::identifier::{quote_literal, quote_mysql};
use crate::core::schema::Schema;
use crate::core::table::TableSchema;
use crate::core::traits::{ensure_same_field, EngineAdapter, SqlExecutor};
use crate::drivers::common::{column_attributes_match, foreign_details_match, MatchRules};
use crate::error::Result;

use super::introspect;
use super::types::{collation_clause, equivalent_types, mysql_type};

/// Engine identifier used in configuration and error messages.
pub const ENGINE_NAME: &str = "mysql";

/// Prefix length for indexes on TEXT/BLOB columns (MySQL requires one).
const INDEX_PREFIX_LENGTH: u32 = 255;

const MATCH_RULES: MatchRules = MatchRules {
    unsigned: true,
    length: true,
    enum_values: true,
    collation: true,
    primary_implies_not_null: true,
};

/// MySQL/MariaDB adapter.
#[derive(Debug, Clone)]
pub struct MysqlAdapter {
    charset: String,
    collation: String,
    storage_engine: String,
}

impl Default for MysqlAdapter {
    fn default() -> Self {
        Self {
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
            storage_engine: "InnoDB".to_string(),
        }
    }
}

impl MysqlAdapter {
    /// Create an adapter with the utf8mb4/InnoDB defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default character set and collation of created tables.
    pub fn with_charset(mut self, charset: impl Into<String>, collation: impl Into<String>) -> Self {
        self.charset = charset.into();
        self.collation = collation.into();
        self
    }

    /// Storage engine of created tables.
    pub fn with_storage_engine(mut self, storage_engine: impl Into<String>) -> Self {
        self.storage_engine = storage_engine.into();
        self
    }

    /// Column definition as used by CREATE TABLE, ADD COLUMN and MODIFY COLUMN.
    fn column_definition(&self, field: &FieldSchema) -> Result<String> {
        let mut def = format!("{} {}", quote_mysql(&field.name)?, mysql_type(field));

        if field.unsigned && field.data_type.is_numeric() {
            def.push_str(" UNSIGNED");
        }
        if field.data_type.has_collation() {
            if let Some(clause) = collation_clause(field.collation_type) {
                def.push(' ');
                def.push_str(clause);
            }
        }
        if field.not_null || field.index_type.is_primary() {
            def.push_str(" NOT NULL");
        } else {
            def.push_str(" NULL");
        }
        if field.autoincrement && field.data_type.is_integer() {
            def.push_str(" AUTO_INCREMENT");
        }
        if !field.description.trim().is_empty() {
            def.push_str(&format!(" COMMENT {}", quote_literal(field.description.trim())));
        }

        Ok(def)
    }

    /// Indexed column reference, with a prefix length for TEXT/BLOB columns.
    fn index_column(&self, field: &FieldSchema) -> Result<String> {
        let column = quote_mysql(&field.name)?;
        if (field.data_type.is_text() && !field.data_type.has_length()) || field.data_type.is_blob() {
            Ok(format!("{}({})", column, INDEX_PREFIX_LENGTH))
        } else {
            Ok(column)
        }
    }

    /// `CONSTRAINT ... FOREIGN KEY ... REFERENCES ...` clause of a foreign field.
    fn foreign_key_clause(&self, field: &FieldSchema) -> Result<String> {
        Ok(format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
            quote_mysql(&field.index_name)?,
            quote_mysql(&field.name)?,
            quote_mysql(&field.ref_table)?,
            quote_mysql(&field.ref_field)?,
            field.on_update_foreign_key.as_sql(),
            field.on_delete_foreign_key.as_sql()
        ))
    }

    fn table_options(&self, table: &TableSchema) -> String {
        let mut options = format!(
            "ENGINE={} DEFAULT CHARSET={} COLLATE={}",
            self.storage_engine, self.charset, self.collation
        );
        if !table.description.trim().is_empty() {
            options.push_str(&format!(" COMMENT={}", quote_literal(table.description.trim())));
        }
        options
    }

    fn drop_foreign_key_statement(&self, table: &str, field: &FieldSchema) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            quote_mysql(table)?,
            quote_mysql(&field.index_name)?
        ))
    }

    fn add_foreign_key_statement(&self, table: &str, field: &FieldSchema) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            quote_mysql(table)?,
            self.foreign_key_clause(field)?
        ))
    }
}

#[async_trait]
impl EngineAdapter for MysqlAdapter {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_mysql(name)
    }

    fn native_data_type(&self, field: &FieldSchema) -> Result<String> {
        Ok(mysql_type(field))
    }

    fn field_schema_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool> {
        ensure_same_field(gauge, actual)?;
        Ok(equivalent_types(gauge.data_type, actual.data_type)
            && column_attributes_match(gauge, actual, MATCH_RULES))
    }

    fn field_index_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool> {
        ensure_same_field(gauge, actual)?;
        Ok(gauge.index_type == actual.index_type
            && (!gauge.index_type.is_foreign() || foreign_details_match(gauge, actual)))
    }

    fn create_table_statements(&self, table: &TableSchema) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(table.fields.len() + 2);
        for field in &table.fields {
            lines.push(self.column_definition(field)?);
        }

        let primary: Vec<String> = table
            .primary_key_fields()
            .map(|f| quote_mysql(&f.name))
            .collect::<Result<_>>()?;
        if !primary.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", primary.join(", ")));
        }

        for field in &table.fields {
            match field.index_type {
                IndexType::Unique => lines.push(format!(
                    "UNIQUE KEY {} ({})",
                    quote_mysql(&field.index_name)?,
                    self.index_column(field)?
                )),
                IndexType::Simple => lines.push(format!(
                    "KEY {} ({})",
                    quote_mysql(&field.index_name)?,
                    self.index_column(field)?
                )),
                IndexType::ForeignKey | IndexType::ForeignPrimary => {
                    lines.push(self.foreign_key_clause(field)?)
                }
                IndexType::None | IndexType::Primary => {}
            }
        }

        Ok(vec![format!(
            "CREATE TABLE {} (\n    {}\n) {}",
            quote_mysql(&table.name)?,
            lines.join(",\n    "),
            self.table_options(table)
        )])
    }

    fn drop_table_statements(&self, table: &TableSchema) -> Result<Vec<String>> {
        Ok(vec![format!("DROP TABLE {}", quote_mysql(&table.name)?)])
    }

    fn add_field_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        // Existing rows would violate the key, NOT NULL without a default, or
        // the AUTO_INCREMENT-must-be-a-key rule.
        if field.index_type.is_primary()
            || (field.not_null && field.data_type.is_blob())
            || (field.autoincrement && field.data_type.is_integer())
        {
            return Ok(None);
        }

        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_mysql(table)?,
            self.column_definition(field)?
        )];
        match self.add_index_statements(table, field)? {
            Some(index) => statements.extend(index),
            None => return Ok(None),
        }
        Ok(Some(statements))
    }

    fn alter_field_statements(
        &self,
        table: &str,
        gauge: &FieldSchema,
        actual: &FieldSchema,
    ) -> Result<Option<Vec<String>>> {
        ensure_same_field(gauge, actual)?;

        let modify = format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            quote_mysql(table)?,
            self.column_definition(gauge)?
        );

        // A column used by a foreign key cannot change while the constraint
        // exists. When the index part differs, the caller drops and re-adds
        // the key around this statement instead.
        if actual.index_type.is_foreign() && self.field_index_match(gauge, actual)? {
            return Ok(Some(vec![
                self.drop_foreign_key_statement(table, actual)?,
                modify,
                self.add_foreign_key_statement(table, gauge)?,
            ]));
        }

        Ok(Some(vec![modify]))
    }

    fn drop_field_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        let mut statements = Vec::new();
        if field.index_type.is_foreign() {
            statements.push(self.drop_foreign_key_statement(table, field)?);
        }
        statements.push(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_mysql(table)?,
            quote_mysql(&field.name)?
        ));
        Ok(Some(statements))
    }

    fn add_index_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        let table_q = quote_mysql(table)?;
        let statements = match field.index_type {
            IndexType::None => Vec::new(),
            IndexType::Primary => vec![format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                table_q,
                quote_mysql(&field.name)?
            )],
            IndexType::Unique => vec![format!(
                "CREATE UNIQUE INDEX {} ON {} ({})",
                quote_mysql(&field.index_name)?,
                table_q,
                self.index_column(field)?
            )],
            IndexType::Simple => vec![format!(
                "CREATE INDEX {} ON {} ({})",
                quote_mysql(&field.index_name)?,
                table_q,
                self.index_column(field)?
            )],
            IndexType::ForeignKey => vec![self.add_foreign_key_statement(table, field)?],
            IndexType::ForeignPrimary => vec![
                format!(
                    "ALTER TABLE {} ADD PRIMARY KEY ({})",
                    table_q,
                    quote_mysql(&field.name)?
                ),
                self.add_foreign_key_statement(table, field)?,
            ],
        };
        Ok(Some(statements))
    }

    fn drop_index_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        let table_q = quote_mysql(table)?;
        let drop_primary = format!("ALTER TABLE {} DROP PRIMARY KEY", table_q);

        let statements = match field.index_type {
            IndexType::None => Vec::new(),
            // AUTO_INCREMENT columns must stay keyed.
            IndexType::Primary | IndexType::ForeignPrimary if field.autoincrement => {
                return Ok(None)
            }
            IndexType::Primary => vec![drop_primary],
            IndexType::Unique | IndexType::Simple => vec![format!(
                "DROP INDEX {} ON {}",
                quote_mysql(&field.index_name)?,
                table_q
            )],
            // The implicit index created for the constraint carries its name.
            IndexType::ForeignKey => vec![
                self.drop_foreign_key_statement(table, field)?,
                format!("DROP INDEX {} ON {}", quote_mysql(&field.index_name)?, table_q),
            ],
            // The primary key serves as the constraint's index.
            IndexType::ForeignPrimary => {
                vec![self.drop_foreign_key_statement(table, field)?, drop_primary]
            }
        };
        Ok(Some(statements))
    }

    fn suspend_foreign_keys_statements(&self) -> Vec<String> {
        vec!["SET FOREIGN_KEY_CHECKS = 0".to_string()]
    }

    fn resume_foreign_keys_statements(&self) -> Vec<String> {
        vec!["SET FOREIGN_KEY_CHECKS = 1".to_string()]
    }

    async fn introspect_schema(&self, executor: &dyn SqlExecutor) -> Result<Schema> {
        introspect::read_schema(executor).await
    }
}
