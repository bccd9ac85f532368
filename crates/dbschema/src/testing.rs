//! In-memory `SqlExecutor` for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::traits::{QueryResult, SqlExecutor};
use crate::error::{DbSchemaError, Result};

/// Returns canned results for queries and records executed statements.
///
/// A query receives the result of the first registered fragment it contains,
/// or an empty result.
#[derive(Default)]
pub struct MockExecutor {
    responses: Vec<(String, QueryResult)>,
    fail_on: Option<String>,
    log: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, sql_fragment: &str, result: QueryResult) -> Self {
        self.responses.push((sql_fragment.to_string(), result));
        self
    }

    /// Fail the first executed statement containing `sql_fragment`.
    pub fn failing_on(mut self, sql_fragment: &str) -> Self {
        self.fail_on = Some(sql_fragment.to_string());
        self
    }

    /// Statements and transaction commands executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn query(&self, sql: &str, _params: &[&str]) -> Result<QueryResult> {
        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }

    async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        for statement in statements {
            if let Some(fragment) = &self.fail_on {
                if statement.contains(fragment.as_str()) {
                    return Err(DbSchemaError::executor("statement failed", statement.clone()));
                }
            }
            log.push(statement.clone());
        }
        Ok(())
    }

    async fn begin(&self) -> Result<()> {
        self.log.lock().unwrap().push("BEGIN".to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.log.lock().unwrap().push("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.log.lock().unwrap().push("ROLLBACK".to_string());
        Ok(())
    }
}
