use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, postgres::PgRow, Column, PgPool, Row, TypeInfo};

use crate::config::DatabaseConfig;
use crate::database::manager::DatabaseError;

/// A decoded result row: column name (or alias) -> JSON value.
pub type JsonRow = Map<String, Value>;

/// Runs SQL text with positional (`$n`) parameters.
///
/// Repositories only ever talk to the database through this trait.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a statement that yields rows (SELECT, or any statement with RETURNING).
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<JsonRow>, DatabaseError>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError>;

    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<JsonRow>, DatabaseError> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }
}

/// PostgreSQL executor over a sqlx pool
pub struct PgExecutor {
    pool: PgPool,
    config: DatabaseConfig,
}

impl PgExecutor {
    pub fn new(pool: PgPool, config: DatabaseConfig) -> Self {
        Self { pool, config }
    }

    fn log_query(&self, sql: &str, params: &[Value], started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if self.config.enable_query_logging {
            tracing::debug!(sql, params = ?params, elapsed_ms, "query");
        }
        if self.config.enable_slow_query_warning && elapsed_ms > self.config.slow_query_threshold_ms {
            tracing::warn!(sql, elapsed_ms, threshold_ms = self.config.slow_query_threshold_ms, "slow query");
        }
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<JsonRow>, DatabaseError> {
        let started = Instant::now();
        let mut q = sqlx::query(sql);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        self.log_query(sql, params, started);

        rows.iter().map(row_to_json).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        let started = Instant::now();
        let mut q = sqlx::query(sql);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        self.log_query(sql, params, started);

        Ok(result.rows_affected())
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            // int8 NULL assigns to integer, numeric and text columns alike
            let none: Option<i64> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

/// Convert database row to JSON
fn row_to_json(row: &PgRow) -> Result<JsonRow, DatabaseError> {
    let mut record = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = extract_column_value(row, i, column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Extract typed value from database column
fn extract_column_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value, DatabaseError> {
    let decode = |e: sqlx::Error| DatabaseError::Decode(format!("column {}: {}", index, e));

    let value = match type_name {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index).map_err(decode)?.map(Value::String)
        }
        "INT2" => row.try_get::<Option<i16>, _>(index).map_err(decode)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index).map_err(decode)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index).map_err(decode)?.map(Value::from),
        "FLOAT4" | "FLOAT8" => row.try_get::<Option<f64>, _>(index).map_err(decode)?.map(Value::from),
        // NUMERIC keeps its exact decimal text, e.g. "0.1"
        "NUMERIC" => row
            .try_get::<Option<sqlx::types::BigDecimal>, _>(index)
            .map_err(decode)?
            .map(|d| Value::String(d.to_string())),
        "BOOL" => row.try_get::<Option<bool>, _>(index).map_err(decode)?.map(Value::Bool),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index).map_err(decode)?,
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .map_err(decode)?
            .map(|t| Value::String(t.to_rfc3339())),
        other => {
            tracing::warn!("Unhandled PostgreSQL type: {}", other);
            return Err(DatabaseError::Decode(format!("unsupported column type {}", other)));
        }
    };

    Ok(value.unwrap_or(Value::Null))
}
