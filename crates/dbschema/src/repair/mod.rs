//! Schema creation and repair.
//!
//! Everything here that touches a database goes through a [`SqlExecutor`];
//! statement generation stays with the engine adapter and the diff engine.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::RepairConfig;
use crate::core::schema::Schema;
use crate::core::traits::{EngineAdapter, SqlExecutor};
use crate::diff::{compare, SchemaError};
use crate::error::{DbSchemaError, Result};

/// Statements creating every table of `gauge`, in foreign-key order.
///
/// Index names are normalized first (see `Schema::set_safe_index_names`);
/// `gauge` itself is left untouched.
///
/// # Errors
///
/// Returns a validation error when the schema has data errors or duplicate
/// index names.
pub fn create_database_statements(gauge: &Schema, adapter: &dyn EngineAdapter) -> Result<Vec<String>> {
    let mut schema = gauge.clone();
    schema.set_safe_index_names();

    let errors = schema.data_errors();
    if !errors.is_empty() {
        return Err(DbSchemaError::Validation(errors.to_report()));
    }
    if !schema.all_indexes_unique() {
        return Err(DbSchemaError::Validation(
            "Index names are not unique across the schema".to_string(),
        ));
    }

    let mut statements = Vec::new();
    for table in schema.tables_in_create_order() {
        statements.extend(adapter.create_table_statements(table)?);
    }
    Ok(statements)
}

/// Statements dropping every table of `schema`, referencing tables first.
pub fn drop_database_statements(schema: &Schema, adapter: &dyn EngineAdapter) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    for table in schema.tables_in_create_order().into_iter().rev() {
        statements.extend(adapter.drop_table_statements(table)?);
    }
    Ok(statements)
}

/// Introspect the live schema and compare it against `gauge`.
pub async fn check_schema(
    gauge: &Schema,
    adapter: &dyn EngineAdapter,
    executor: &dyn SqlExecutor,
) -> Result<Vec<SchemaError>> {
    let actual = adapter.introspect_schema(executor).await?;
    compare(gauge, &actual, adapter)
}

/// Result of [`apply_repairs`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairOutcome {
    /// Errors whose statements were executed.
    pub applied: Vec<SchemaError>,

    /// Unrepairable errors, left for manual handling.
    pub skipped: Vec<SchemaError>,

    pub statements_executed: usize,
}

impl RepairOutcome {
    /// True when nothing was left unrepaired.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Execute the repair statements of `errors` in the order given.
///
/// Unrepairable errors are skipped and returned in
/// [`RepairOutcome::skipped`]. With `suspend_foreign_keys`, enforcement is
/// turned off around the batch (outside the transaction, since SQLite
/// ignores the pragma inside one). With `use_transaction`, a failure rolls
/// back the statements executed so far.
pub async fn apply_repairs(
    errors: &[SchemaError],
    adapter: &dyn EngineAdapter,
    executor: &dyn SqlExecutor,
    options: &RepairConfig,
) -> Result<RepairOutcome> {
    let mut outcome = RepairOutcome::default();
    let mut repairable = Vec::new();

    for error in errors {
        if error.is_repairable {
            repairable.push(error);
        } else {
            warn!("Skipping unrepairable {}: {}", error.location(), error.description);
            outcome.skipped.push(error.clone());
        }
    }

    if repairable.iter().all(|e| e.sql_statements.is_empty()) {
        outcome.applied = repairable.into_iter().cloned().collect();
        return Ok(outcome);
    }

    if options.suspend_foreign_keys {
        executor
            .execute_batch(&adapter.suspend_foreign_keys_statements())
            .await?;
    }

    let result = execute_repairs(&repairable, executor, options.use_transaction).await;

    if options.suspend_foreign_keys {
        if let Err(e) = executor
            .execute_batch(&adapter.resume_foreign_keys_statements())
            .await
        {
            error!("Failed to restore foreign key enforcement: {}", e);
            if result.is_ok() {
                return Err(e);
            }
        }
    }

    outcome.statements_executed = result?;
    outcome.applied = repairable.into_iter().cloned().collect();

    info!(
        "Applied {} repairs ({} statements), skipped {} unrepairable",
        outcome.applied.len(),
        outcome.statements_executed,
        outcome.skipped.len()
    );

    Ok(outcome)
}

async fn execute_repairs(
    repairs: &[&SchemaError],
    executor: &dyn SqlExecutor,
    use_transaction: bool,
) -> Result<usize> {
    if use_transaction {
        executor.begin().await?;
    }

    let mut executed = 0;
    for repair in repairs {
        if let Err(e) = executor.execute_batch(&repair.sql_statements).await {
            error!("Repair of {} failed: {}", repair.location(), e);
            if use_transaction {
                if let Err(rollback) = executor.rollback().await {
                    error!("Rollback failed: {}", rollback);
                }
            }
            return Err(e);
        }
        executed += repair.sql_statements.len();
    }

    if use_transaction {
        executor.commit().await?;
    }
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_type::DbDataType;
    use crate::core::field::{FieldSchema, IndexType};
    use crate::core::table::TableSchema;
    use crate::diff::SchemaErrorType;
    use crate::drivers::{MysqlAdapter, SqliteAdapter};
    use crate::testing::MockExecutor;

    fn shop() -> Schema {
        Schema::new("shop")
            .with_table(
                TableSchema::new("orders")
                    .with_field(FieldSchema::new("id", DbDataType::Integer).not_null().primary())
                    .with_field(
                        FieldSchema::new("user_id", DbDataType::Integer)
                            .references("whatever", "users", "id"),
                    ),
            )
            .with_table(
                TableSchema::new("users")
                    .with_field(FieldSchema::new("id", DbDataType::Integer).not_null().primary())
                    .with_field(
                        FieldSchema::new("email", DbDataType::VarChar)
                            .with_length(100)
                            .indexed(IndexType::Unique, "x"),
                    ),
            )
    }

    fn repair(table: &str, statements: Option<Vec<&str>>) -> SchemaError {
        SchemaError::new(
            SchemaErrorType::TableMissing,
            table,
            None,
            "missing",
            statements.map(|s| s.into_iter().map(str::to_string).collect()),
        )
    }

    #[test]
    fn test_create_database_statements() {
        let statements = create_database_statements(&shop(), &SqliteAdapter::new()).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE \"users\""));
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX \"users_email_idx\" ON \"users\" (\"email\")"
        );
        assert!(statements[2].starts_with("CREATE TABLE \"orders\""));
        assert!(statements[2].contains("CONSTRAINT \"orders_user_id_fk\""));
    }

    #[test]
    fn test_create_database_refuses_invalid_schema() {
        let mut schema = shop();
        schema.tables[0].fields[0].name = "bad name".to_string();
        assert!(matches!(
            create_database_statements(&schema, &MysqlAdapter::new()),
            Err(DbSchemaError::Validation(_))
        ));

        assert!(matches!(
            create_database_statements(&Schema::new(""), &MysqlAdapter::new()),
            Err(DbSchemaError::Validation(_))
        ));
    }

    #[test]
    fn test_drop_database_statements() {
        let statements = drop_database_statements(&shop(), &MysqlAdapter::new()).unwrap();
        assert_eq!(statements, vec!["DROP TABLE `orders`", "DROP TABLE `users`"]);
    }

    #[tokio::test]
    async fn test_check_schema_against_empty_database() {
        let errors = check_schema(&shop(), &MysqlAdapter::new(), &MockExecutor::new())
            .await
            .unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.error_type == SchemaErrorType::TableMissing));
    }

    #[tokio::test]
    async fn test_apply_repairs_skips_unrepairable() {
        let executor = MockExecutor::new();
        let errors = vec![
            repair("a", Some(vec!["CREATE TABLE a (x INT)"])),
            repair("b", None),
            repair("c", Some(vec!["CREATE TABLE c (x INT)", "CREATE INDEX c_x ON c (x)"])),
        ];

        let options = RepairConfig {
            use_transaction: true,
            suspend_foreign_keys: true,
        };
        let outcome = apply_repairs(&errors, &MysqlAdapter::new(), &executor, &options)
            .await
            .unwrap();

        assert_eq!(outcome.applied.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.statements_executed, 3);
        assert!(!outcome.is_complete());
        assert_eq!(
            executor.executed(),
            vec![
                "SET FOREIGN_KEY_CHECKS = 0",
                "BEGIN",
                "CREATE TABLE a (x INT)",
                "CREATE TABLE c (x INT)",
                "CREATE INDEX c_x ON c (x)",
                "COMMIT",
                "SET FOREIGN_KEY_CHECKS = 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_repairs_rolls_back_on_failure() {
        let executor = MockExecutor::new().failing_on("CREATE TABLE c");
        let errors = vec![
            repair("a", Some(vec!["CREATE TABLE a (x INT)"])),
            repair("c", Some(vec!["CREATE TABLE c (x INT)"])),
        ];
        let options = RepairConfig {
            use_transaction: true,
            suspend_foreign_keys: true,
        };

        let result = apply_repairs(&errors, &SqliteAdapter::new(), &executor, &options).await;
        assert!(matches!(result, Err(DbSchemaError::Executor { .. })));
        assert_eq!(
            executor.executed(),
            vec![
                "PRAGMA foreign_keys = OFF",
                "BEGIN",
                "CREATE TABLE a (x INT)",
                "ROLLBACK",
                "PRAGMA foreign_keys = ON",
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_repairs_without_options() {
        let executor = MockExecutor::new();
        let errors = vec![repair("a", Some(vec!["CREATE TABLE a (x INT)"]))];
        let options = RepairConfig {
            use_transaction: false,
            suspend_foreign_keys: false,
        };
        apply_repairs(&errors, &MysqlAdapter::new(), &executor, &options)
            .await
            .unwrap();
        assert_eq!(executor.executed(), vec!["CREATE TABLE a (x INT)"]);
    }

    #[tokio::test]
    async fn test_apply_nothing_touches_nothing() {
        let executor = MockExecutor::new();
        let outcome = apply_repairs(&[], &MysqlAdapter::new(), &executor, &RepairConfig::default())
            .await
            .unwrap();
        assert!(outcome.is_complete());
        assert!(executor.executed().is_empty());
    }
}
