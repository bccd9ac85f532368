//! SQLite engine adapter.
//!
//! - [`SqliteAdapter`]: type families, DDL generation, field comparison and
//!   PRAGMA-based introspection
//! - [`SqliteExecutor`]: sqlx connection implementing `SqlExecutor`
//!   (requires the `sqlite` feature)
//!
//! # Connection String
//!
//! ```text
//! sqlite://path/to/file.db
//! sqlite::memory:
//! ```

mod adapter;
#[cfg(feature = "sqlite")]
mod executor;
mod introspect;
mod types;

pub use adapter::{SqliteAdapter, ENGINE_NAME};
#[cfg(feature = "sqlite")]
pub use executor::SqliteExecutor;
pub use types::TypeFamily;
