//! Configuration types.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Engine name (`mysql` or `sqlite`).
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Live database connection, needed by commands that introspect or repair.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// DDL generation settings.
    #[serde(default)]
    pub ddl: DdlConfig,

    /// Repair application behavior.
    #[serde(default)]
    pub repair: RepairConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            connection: ConnectionConfig::default(),
            ddl: DdlConfig::default(),
            repair: RepairConfig::default(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// SQLx connection URL (`mysql://user:pw@host:3306/db`, `sqlite://file.db`).
    #[serde(default)]
    pub url: String,
}

/// DDL generation settings (MySQL table options; ignored by SQLite).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlConfig {
    /// Default character set of created tables (default: "utf8mb4").
    #[serde(default = "default_charset")]
    pub charset: String,

    /// Default collation of created tables (default: "utf8mb4_unicode_ci").
    #[serde(default = "default_collation")]
    pub collation: String,

    /// Storage engine of created tables (default: "InnoDB").
    #[serde(default = "default_storage_engine")]
    pub storage_engine: String,
}

impl Default for DdlConfig {
    fn default() -> Self {
        Self {
            charset: default_charset(),
            collation: default_collation(),
            storage_engine: default_storage_engine(),
        }
    }
}

/// Repair application behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Run all repair statements in one transaction (default: false).
    /// MySQL commits implicitly after each DDL statement, so this only
    /// gives atomicity on SQLite.
    #[serde(default)]
    pub use_transaction: bool,

    /// Disable foreign key enforcement while repairing (default: true).
    #[serde(default = "default_true")]
    pub suspend_foreign_keys: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            use_transaction: false,
            suspend_foreign_keys: true,
        }
    }
}

fn default_engine() -> String {
    "mysql".to_string()
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

fn default_collation() -> String {
    "utf8mb4_unicode_ci".to_string()
}

fn default_storage_engine() -> String {
    "InnoDB".to_string()
}

fn default_true() -> bool {
    true
}
