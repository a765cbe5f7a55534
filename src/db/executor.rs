//! Query Executor
//!
//! Runs a generated statement on one pooled connection and returns every cell
//! rendered as text. The connection is scoped to a single call.

use crate::table::ResultTable;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo};
use tracing::{debug, info};

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, statement: &str) -> AppResult<ResultTable>;

    /// Database liveness check for the health endpoint.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct PgQueryExecutor {
    pool: PgPool,
    read_only: bool,
}

impl PgQueryExecutor {
    /// With `read_only`, statements run inside a `READ ONLY` transaction that
    /// is always rolled back.
    pub fn new(pool: PgPool, read_only: bool) -> Self {
        Self { pool, read_only }
    }
}

fn text<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render one cell by its Postgres type; NULL becomes the empty string.
fn cell_to_string(row: &PgRow, index: usize) -> AppResult<String> {
    let type_name = row.column(index).type_info().name().to_string();

    let cell = match type_name.as_str() {
        "BOOL" => text(row.try_get::<Option<bool>, _>(index)?),
        "INT2" => text(row.try_get::<Option<i16>, _>(index)?),
        "INT4" => text(row.try_get::<Option<i32>, _>(index)?),
        "INT8" => text(row.try_get::<Option<i64>, _>(index)?),
        "FLOAT4" => text(row.try_get::<Option<f32>, _>(index)?),
        "FLOAT8" => text(row.try_get::<Option<f64>, _>(index)?),
        "NUMERIC" => text(row.try_get::<Option<rust_decimal::Decimal>, _>(index)?),
        // Protheus keys are fixed-width CHAR columns padded with spaces.
        "BPCHAR" => row
            .try_get::<Option<String>, _>(index)?
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
        "TEXT" | "VARCHAR" | "NAME" => text(row.try_get::<Option<String>, _>(index)?),
        "DATE" => text(row.try_get::<Option<chrono::NaiveDate>, _>(index)?),
        "TIME" => text(row.try_get::<Option<chrono::NaiveTime>, _>(index)?),
        "TIMESTAMP" => text(row.try_get::<Option<chrono::NaiveDateTime>, _>(index)?),
        "TIMESTAMPTZ" => text(row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?),
        "JSON" | "JSONB" => text(row.try_get::<Option<serde_json::Value>, _>(index)?),
        "UUID" => text(row.try_get::<Option<uuid::Uuid>, _>(index)?),
        other => match row.try_get::<Option<String>, _>(index) {
            Ok(value) => text(value),
            Err(_) => format!("<{}>", other),
        },
    };
    Ok(cell)
}

fn rows_to_table(columns: Vec<String>, rows: &[PgRow]) -> AppResult<ResultTable> {
    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| cell_to_string(row, i)).collect::<AppResult<Vec<String>>>())
        .collect::<AppResult<Vec<Vec<String>>>>()?;
    Ok(ResultTable::new(columns, rows))
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn execute(&self, statement: &str) -> AppResult<ResultTable> {
        // Released back to the pool on every exit path when dropped.
        let mut conn = self.pool.acquire().await?;
        debug!(read_only = self.read_only, "Acquired database connection");

        let table = if self.read_only {
            let mut tx = conn.begin().await?;
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await?;

            let prepared = (&mut *tx).prepare(statement).await?;
            let columns = prepared
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let rows = prepared.query().fetch_all(&mut *tx).await?;
            let table = rows_to_table(columns, &rows)?;

            tx.rollback().await?;
            table
        } else {
            let prepared = (&mut *conn).prepare(statement).await?;
            let columns = prepared
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let rows = prepared.query().fetch_all(&mut *conn).await?;
            rows_to_table(columns, &rows)?
        };

        info!(rows = table.row_count(), columns = table.columns.len(), "Query executed");
        Ok(table)
    }

    async fn ping(&self) -> AppResult<()> {
        super::pool::health_check(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Execution(e.to_string()))
    }
}
