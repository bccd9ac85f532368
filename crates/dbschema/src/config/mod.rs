//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::drivers::{AdapterImpl, MysqlAdapter};
use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for an engine with every other setting defaulted.
    pub fn for_engine(engine: &str) -> Result<Self> {
        let config = Config {
            engine: engine.to_string(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Validate the settings needed to open a connection.
    pub fn validate_connection(&self) -> Result<()> {
        validation::validate_connection(self)
    }

    /// Build the configured engine adapter.
    pub fn adapter(&self) -> Result<AdapterImpl> {
        Ok(match AdapterImpl::from_engine(&self.engine)? {
            AdapterImpl::Mysql(_) => AdapterImpl::Mysql(
                MysqlAdapter::new()
                    .with_charset(&self.ddl.charset, &self.ddl.collation)
                    .with_storage_engine(&self.ddl.storage_engine),
            ),
            other => other,
        })
    }
}
