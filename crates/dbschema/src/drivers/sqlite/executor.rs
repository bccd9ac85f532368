//! sqlx-backed [`SqlExecutor`] for SQLite.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, ValueRef};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::traits::{QueryResult, SqlExecutor};
use crate::error::{DbSchemaError, Result};

/// Executes SQL on a single SQLite connection.
pub struct SqliteExecutor {
    conn: Mutex<SqliteConnection>,
}

impl SqliteExecutor {
    /// Open a `sqlite://path.db` or `sqlite::memory:` URL, creating the file
    /// when missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbSchemaError::executor(e, "parsing SQLite URL"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let conn = options
            .connect()
            .await
            .map_err(|e| DbSchemaError::executor(e, "opening SQLite database"))?;

        info!("Opened SQLite database {}", url);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.conn
            .into_inner()
            .close()
            .await
            .map_err(|e| DbSchemaError::executor(e, "closing SQLite database"))
    }

    async fn run(&self, sql: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        (&mut *conn).execute(sqlx::raw_sql(sql))
            .await
            .map_err(|e| DbSchemaError::executor(e, sql))?;
        Ok(())
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<QueryResult> {
        let mut conn = self.conn.lock().await;
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DbSchemaError::executor(e, "running catalog query"))?;
        Ok(rows_to_result(&rows))
    }

    async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        for statement in statements {
            debug!("Executing: {}", statement);
            self.run(statement).await?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<()> {
        self.run("BEGIN").await
    }

    async fn commit(&self) -> Result<()> {
        self.run("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.run("ROLLBACK").await
    }
}

fn rows_to_result(rows: &[SqliteRow]) -> QueryResult {
    let mut result = QueryResult::default();
    let Some(first) = rows.first() else {
        return result;
    };

    result.columns = first.columns().iter().map(|c| c.name().to_string()).collect();
    result.rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| value_as_text(row, i)).collect())
        .collect();
    result
}

/// Render a value of any storage class as text.
fn value_as_text(row: &SqliteRow, idx: usize) -> Option<String> {
    let is_null = row.try_get_raw(idx).map(|r| r.is_null()).unwrap_or(true);
    if is_null {
        return None;
    }

    row.try_get::<i64, _>(idx)
        .ok()
        .map(|v| v.to_string())
        .or_else(|| row.try_get::<f64, _>(idx).ok().map(|v| v.to_string()))
        .or_else(|| row.try_get::<String, _>(idx).ok())
        .or_else(|| {
            row.try_get::<Vec<u8>, _>(idx)
                .ok()
                .map(|v| String::from_utf8_lossy(&v).into_owned())
        })
}
