//! Canonical schema model and core abstractions.
//!
//! - [`data_type`]: canonical data types and their classification
//! - [`field`], [`table`], [`schema`]: the canonical model
//! - [`data_errors`]: validation results returned as data
//! - [`identifier`]: name comparison and quoting shared by every module
//! - [`traits`]: the executor and engine adapter seams
//!
//! # Architecture
//!
//! The core defines the engine-independent model. Engine-specific behaviour
//! lives in `drivers/mysql` and `drivers/sqlite`, which implement
//! [`EngineAdapter`]. The model is plain data: no interior mutability, no
//! shared state, safe to use from several threads as long as each caller
//! owns the instances it mutates.

pub mod data_errors;
pub mod data_type;
pub mod field;
pub mod identifier;
pub mod schema;
pub mod table;
pub mod traits;

pub use data_errors::DataErrors;
pub use data_type::DbDataType;
pub use field::{CollationType, FieldSchema, ForeignKeyActionType, IndexType};
pub use schema::Schema;
pub use table::TableSchema;
pub use traits::{EngineAdapter, QueryResult, QueryRow, SqlExecutor};
