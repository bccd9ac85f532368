//! Core traits for engine-independent schema management.
//!
//! - [`SqlExecutor`]: executes SQL against a live database (external driver)
//! - [`EngineAdapter`]: translates the canonical model to one engine's DDL and
//!   type system, compares fields, and introspects live schemas
//!
//! # Design Patterns
//!
//! - **Strategy**: each engine adapter is an interchangeable implementation
//!   of the same translation rules
//! - **Template Method**: default methods compose the primitive DDL builders

use async_trait::async_trait;

use crate::error::{DbSchemaError, Result};

use super::field::FieldSchema;
use super::identifier::{name_key, names_equal};
use super::schema::Schema;
use super::table::TableSchema;

/// Tabular query result.
///
/// Values are carried as text; `None` is SQL NULL. Column lookup is
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Create an empty result with the given column names.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row of values (builder style, used for canned results).
    pub fn with_row(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|v| v.map(str::to_string)).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| names_equal(c, name))
    }

    /// Iterate rows with by-name access.
    pub fn iter(&self) -> impl Iterator<Item = QueryRow<'_>> {
        self.rows.iter().map(move |values| QueryRow {
            result: self,
            values,
        })
    }
}

/// One row of a [`QueryResult`].
#[derive(Debug, Clone, Copy)]
pub struct QueryRow<'a> {
    result: &'a QueryResult,
    values: &'a [Option<String>],
}

impl<'a> QueryRow<'a> {
    /// Raw value of a column; `None` when the column is missing or NULL.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.result
            .column_index(column)
            .and_then(|i| self.values.get(i))
            .and_then(|v| v.as_deref())
    }

    /// Text value of a column, empty for NULL.
    pub fn text(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }

    /// Required text value; errors when the column is missing or NULL.
    pub fn required(&self, column: &str) -> Result<&'a str> {
        self.get(column).ok_or_else(|| {
            DbSchemaError::Introspection(format!("catalog column '{}' is missing or NULL", column))
        })
    }

    /// Integer value of a column; NULL and unparsable values are 0.
    pub fn int(&self, column: &str) -> i64 {
        self.get(column)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Boolean value: non-zero integers and `YES`/`TRUE` are true.
    pub fn flag(&self, column: &str) -> bool {
        match self.get(column).map(|v| v.trim().to_uppercase()) {
            Some(v) if v == "YES" || v == "TRUE" => true,
            Some(v) => v.parse::<i64>().map(|n| n != 0).unwrap_or(false),
            None => false,
        }
    }
}

/// Executes SQL on behalf of the schema library.
///
/// Implementations own connection lifetime, transaction scope and
/// cancellation. The schema core never executes SQL itself; it reaches a
/// database only through adapter introspection and repair application.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a query and return its rows. `params` bind to `?` placeholders.
    async fn query(&self, sql: &str, params: &[&str]) -> Result<QueryResult>;

    /// Execute statements sequentially, stopping at the first failure.
    async fn execute_batch(&self, statements: &[String]) -> Result<()>;

    /// Begin a transaction on the executor's connection.
    async fn begin(&self) -> Result<()>;

    /// Commit the current transaction.
    async fn commit(&self) -> Result<()>;

    /// Roll back the current transaction.
    async fn rollback(&self) -> Result<()>;
}

/// Translates the canonical schema model to and from one SQL engine.
///
/// DDL builders return `Ok(None)` when the engine cannot express the change
/// safely (the diff reports such errors as unrepairable) and `Err` when the
/// model cannot be mapped at all (unsupported type).
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Engine identifier (e.g., "mysql", "sqlite").
    fn name(&self) -> &str;

    /// Quote an identifier.
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Native column type for a field, including length or enum list.
    fn native_data_type(&self, field: &FieldSchema) -> Result<String>;

    /// Whether two same-named fields are structurally equivalent, i.e. no
    /// ALTER is needed.
    fn field_schema_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool>;

    /// Whether the index aspect of two same-named fields is equivalent.
    fn field_index_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool>;

    /// Statements creating a table with its keys and indexes.
    fn create_table_statements(&self, table: &TableSchema) -> Result<Vec<String>>;

    /// Statements dropping a table.
    fn drop_table_statements(&self, table: &TableSchema) -> Result<Vec<String>>;

    /// Statements adding a field (and its index) to an existing table.
    fn add_field_statements(&self, table: &str, field: &FieldSchema)
        -> Result<Option<Vec<String>>>;

    /// Statements changing `actual` into `gauge`, column definition only.
    fn alter_field_statements(
        &self,
        table: &str,
        gauge: &FieldSchema,
        actual: &FieldSchema,
    ) -> Result<Option<Vec<String>>>;

    /// Statements dropping a field (and its index).
    fn drop_field_statements(&self, table: &str, field: &FieldSchema)
        -> Result<Option<Vec<String>>>;

    /// Statements adding the index/key carried by a field.
    fn add_index_statements(&self, table: &str, field: &FieldSchema)
        -> Result<Option<Vec<String>>>;

    /// Statements dropping the index/key carried by a field.
    fn drop_index_statements(&self, table: &str, field: &FieldSchema)
        -> Result<Option<Vec<String>>>;

    /// Statements suspending foreign key enforcement for the current session.
    fn suspend_foreign_keys_statements(&self) -> Vec<String>;

    /// Statements restoring foreign key enforcement.
    fn resume_foreign_keys_statements(&self) -> Vec<String>;

    /// Read the live schema through an executor.
    async fn introspect_schema(&self, executor: &dyn SqlExecutor) -> Result<Schema>;

    /// Replace a field definition including its index.
    ///
    /// Template method: drop the actual index, alter the column, add the gauge
    /// index. Unrepairable when any step is.
    fn replace_field_statements(
        &self,
        table: &str,
        gauge: &FieldSchema,
        actual: &FieldSchema,
    ) -> Result<Option<Vec<String>>> {
        let mut statements = Vec::new();
        for step in [
            self.drop_index_statements(table, actual)?,
            self.alter_field_statements(table, gauge, actual)?,
            self.add_index_statements(table, gauge)?,
        ] {
            match step {
                Some(s) => statements.extend(s),
                None => return Ok(None),
            }
        }
        Ok(Some(statements))
    }
}

/// Precondition shared by the match predicates: both fields carry the same
/// name.
pub fn ensure_same_field(gauge: &FieldSchema, actual: &FieldSchema) -> Result<()> {
    if name_key(&gauge.name) != name_key(&actual.name) {
        return Err(DbSchemaError::invalid_operation(format!(
            "Cannot compare field '{}' with field '{}'",
            gauge.name.trim(),
            actual.name.trim()
        )));
    }
    Ok(())
}
