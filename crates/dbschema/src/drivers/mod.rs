//! Engine adapters.
//!
//! This module provides one [`EngineAdapter`] implementation per supported
//! SQL engine:
//!
//! - [`mysql`]: MySQL/MariaDB, keys as separate index objects
//! - [`sqlite`]: SQLite 3, keys folded into column definitions
//! - [`common`]: comparison rules shared by both
//!
//! # Architecture
//!
//! Each driver module implements:
//! - `EngineAdapter`: type mapping, DDL, match predicates, introspection
//! - `SqlExecutor` (behind the `mysql`/`sqlite` features): an sqlx connection
//!
//! # Adding New Engines
//!
//! 1. Create a new module under `drivers/` (e.g., `drivers/postgres/`)
//! 2. Implement `EngineAdapter`, and `SqlExecutor` behind a feature flag
//! 3. Add an enum variant to `AdapterImpl` and a name to `from_engine()`
//! 4. Register the executor in [`connect`]

pub mod common;
pub mod mysql;
pub mod sqlite;

pub use mysql::MysqlAdapter;
pub use sqlite::SqliteAdapter;

use async_trait::async_trait;

use crate::core::field::FieldSchema;
use crate::core::schema::Schema;
use crate::core::table::TableSchema;
use crate::core::traits::{EngineAdapter, SqlExecutor};
use crate::error::{DbSchemaError, Result};

/// Names accepted by [`AdapterImpl::from_engine`].
pub const SUPPORTED_ENGINES: &[&str] = &["mysql", "mariadb", "sqlite", "sqlite3"];

/// Enum-based static dispatch for engine adapters.
///
/// Note: We use manual impl instead of enum_dispatch macro due to
/// cross-module trait complexities. The performance is identical.
#[derive(Debug, Clone)]
pub enum AdapterImpl {
    Mysql(MysqlAdapter),
    Sqlite(SqliteAdapter),
}

impl AdapterImpl {
    /// Create an adapter with default settings from an engine name.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine name is not recognized.
    pub fn from_engine(engine: &str) -> Result<Self> {
        match engine.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(AdapterImpl::Mysql(MysqlAdapter::new())),
            "sqlite" | "sqlite3" => Ok(AdapterImpl::Sqlite(SqliteAdapter::new())),
            other => Err(DbSchemaError::Config(format!(
                "Unknown engine: '{}'. Supported engines: mysql, sqlite",
                other
            ))),
        }
    }
}

#[async_trait]
impl EngineAdapter for AdapterImpl {
    fn name(&self) -> &str {
        match self {
            AdapterImpl::Mysql(a) => a.name(),
            AdapterImpl::Sqlite(a) => a.name(),
        }
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            AdapterImpl::Mysql(a) => a.quote_ident(name),
            AdapterImpl::Sqlite(a) => a.quote_ident(name),
        }
    }

    fn native_data_type(&self, field: &FieldSchema) -> Result<String> {
        match self {
            AdapterImpl::Mysql(a) => a.native_data_type(field),
            AdapterImpl::Sqlite(a) => a.native_data_type(field),
        }
    }

    fn field_schema_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool> {
        match self {
            AdapterImpl::Mysql(a) => a.field_schema_match(gauge, actual),
            AdapterImpl::Sqlite(a) => a.field_schema_match(gauge, actual),
        }
    }

    fn field_index_match(&self, gauge: &FieldSchema, actual: &FieldSchema) -> Result<bool> {
        match self {
            AdapterImpl::Mysql(a) => a.field_index_match(gauge, actual),
            AdapterImpl::Sqlite(a) => a.field_index_match(gauge, actual),
        }
    }

    fn create_table_statements(&self, table: &TableSchema) -> Result<Vec<String>> {
        match self {
            AdapterImpl::Mysql(a) => a.create_table_statements(table),
            AdapterImpl::Sqlite(a) => a.create_table_statements(table),
        }
    }

    fn drop_table_statements(&self, table: &TableSchema) -> Result<Vec<String>> {
        match self {
            AdapterImpl::Mysql(a) => a.drop_table_statements(table),
            AdapterImpl::Sqlite(a) => a.drop_table_statements(table),
        }
    }

    fn add_field_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        match self {
            AdapterImpl::Mysql(a) => a.add_field_statements(table, field),
            AdapterImpl::Sqlite(a) => a.add_field_statements(table, field),
        }
    }

    fn alter_field_statements(
        &self,
        table: &str,
        gauge: &FieldSchema,
        actual: &FieldSchema,
    ) -> Result<Option<Vec<String>>> {
        match self {
            AdapterImpl::Mysql(a) => a.alter_field_statements(table, gauge, actual),
            AdapterImpl::Sqlite(a) => a.alter_field_statements(table, gauge, actual),
        }
    }

    fn drop_field_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        match self {
            AdapterImpl::Mysql(a) => a.drop_field_statements(table, field),
            AdapterImpl::Sqlite(a) => a.drop_field_statements(table, field),
        }
    }

    fn add_index_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        match self {
            AdapterImpl::Mysql(a) => a.add_index_statements(table, field),
            AdapterImpl::Sqlite(a) => a.add_index_statements(table, field),
        }
    }

    fn drop_index_statements(&self, table: &str, field: &FieldSchema) -> Result<Option<Vec<String>>> {
        match self {
            AdapterImpl::Mysql(a) => a.drop_index_statements(table, field),
            AdapterImpl::Sqlite(a) => a.drop_index_statements(table, field),
        }
    }

    fn suspend_foreign_keys_statements(&self) -> Vec<String> {
        match self {
            AdapterImpl::Mysql(a) => a.suspend_foreign_keys_statements(),
            AdapterImpl::Sqlite(a) => a.suspend_foreign_keys_statements(),
        }
    }

    fn resume_foreign_keys_statements(&self) -> Vec<String> {
        match self {
            AdapterImpl::Mysql(a) => a.resume_foreign_keys_statements(),
            AdapterImpl::Sqlite(a) => a.resume_foreign_keys_statements(),
        }
    }

    async fn introspect_schema(&self, executor: &dyn SqlExecutor) -> Result<Schema> {
        match self {
            AdapterImpl::Mysql(a) => a.introspect_schema(executor).await,
            AdapterImpl::Sqlite(a) => a.introspect_schema(executor).await,
        }
    }
}

/// Open an executor for the adapter's engine.
///
/// # Errors
///
/// Returns a configuration error when the engine's executor feature is not
/// compiled in, and an executor error when the connection fails.
#[cfg_attr(not(any(feature = "mysql", feature = "sqlite")), allow(unused_variables))]
pub async fn connect(adapter: &AdapterImpl, url: &str) -> Result<Box<dyn SqlExecutor>> {
    match adapter {
        #[cfg(feature = "mysql")]
        AdapterImpl::Mysql(_) => Ok(Box::new(mysql::MysqlExecutor::connect(url).await?)),
        #[cfg(feature = "sqlite")]
        AdapterImpl::Sqlite(_) => Ok(Box::new(sqlite::SqliteExecutor::connect(url).await?)),
        #[allow(unreachable_patterns)]
        other => Err(DbSchemaError::Config(format!(
            "No executor for engine '{}': enable the '{}' feature",
            other.name(),
            other.name()
        ))),
    }
}
