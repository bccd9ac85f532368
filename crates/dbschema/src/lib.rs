//! # dbschema
//!
//! Engine-independent database schema model with DDL generation, schema
//! diff and repair.
//!
//! A [`Schema`] describes tables and fields once. Engine adapters translate
//! it to native DDL and back:
//!
//! - **DDL generation** for MySQL/MariaDB and SQLite, tables in foreign-key
//!   order
//! - **Schema diff** between a gauge schema and a live (introspected) one,
//!   with repair statements where the engine can express them
//! - **Extensions** merged into a base schema by [`Schema::aggregate`]
//! - **Schema files** in YAML or JSON
//!
//! Database access goes through the [`SqlExecutor`] trait. The `mysql` and
//! `sqlite` features provide sqlx-backed executors.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbschema::{persist, repair, Config};
//!
//! #[tokio::main]
//! async fn main() -> dbschema::Result<()> {
//!     let config = Config::load("dbschema.yaml")?;
//!     let adapter = config.adapter()?;
//!     let gauge = persist::load_schema("schema.yaml")?;
//!
//!     let executor = dbschema::drivers::connect(&adapter, &config.connection.url).await?;
//!     let errors = repair::check_schema(&gauge, &adapter, executor.as_ref()).await?;
//!     println!("{}", dbschema::diff::format_report(&errors));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod diff;
pub mod drivers;
pub mod error;
pub mod persist;
pub mod repair;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use crate::config::{Config, ConnectionConfig, DdlConfig, RepairConfig};
pub use crate::core::{
    CollationType, DataErrors, DbDataType, EngineAdapter, FieldSchema, ForeignKeyActionType,
    IndexType, QueryResult, QueryRow, Schema, SqlExecutor, TableSchema,
};
pub use diff::{compare, format_report, SchemaError, SchemaErrorType};
pub use drivers::{AdapterImpl, MysqlAdapter, SqliteAdapter};
pub use error::{DbSchemaError, Result};
pub use repair::RepairOutcome;
