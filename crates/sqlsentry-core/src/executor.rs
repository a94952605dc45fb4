//! Single-statement execution against Postgres.
//!
//! Each statement runs on its own pooled connection in autocommit mode,
//! so every mutating statement is its own transaction: a committed
//! mutation is visible to subsequent statements in the batch and to all
//! other connections immediately. There is no batch-level transaction.
//!
//! Database-level failures (syntax, constraint, missing object) become
//! `Ok` outcomes with the driver's message; only connectivity-level
//! faults surface as `Err`, so callers can tell "my SQL was bad" from
//! "the system is down".

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};
use sqlsentry_commons::models::{BoundStatement, Row, Statement, StatementOutcome};
use sqlsentry_commons::{PipelineError, Result};
use sqlsentry_sql::returns_rows;
use std::time::Instant;

/// Seam between the aggregator and the database, so batch semantics can
/// be tested without a live connection.
#[async_trait]
pub trait StatementRunner: Send + Sync {
    /// Execute one statement. `Ok` covers both success and per-statement
    /// database failure; `Err` is reserved for connectivity faults.
    async fn run(&self, statement: &Statement) -> Result<StatementOutcome>;
}

/// Executes statements verbatim against a pooled Postgres connection.
pub struct StatementExecutor {
    pool: PgPool,
}

impl StatementExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute a parameterized statement (the CRUD path).
    pub async fn execute_bound(&self, bound: &BoundStatement) -> Result<StatementOutcome> {
        let started = Instant::now();

        let mut query = sqlx::query(&bound.sql);
        for value in &bound.params {
            query = bind_json_value(query, value);
        }

        let outcome = if returns_rows(&bound.sql) {
            match query.fetch_all(&self.pool).await {
                Ok(rows) => StatementOutcome::with_rows(&bound.sql, materialize(&rows)),
                Err(e) => failure_outcome(&bound.sql, e)?,
            }
        } else {
            match query.execute(&self.pool).await {
                Ok(done) => StatementOutcome::with_affected_rows(&bound.sql, done.rows_affected()),
                Err(e) => failure_outcome(&bound.sql, e)?,
            }
        };

        log::debug!(
            target: "sql::exec",
            "bound statement finished | params={} | ok={} | took={:.3}ms",
            bound.params.len(),
            outcome.succeeded(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(outcome)
    }
}

#[async_trait]
impl StatementRunner for StatementExecutor {
    async fn run(&self, statement: &Statement) -> Result<StatementOutcome> {
        let started = Instant::now();

        let outcome = if returns_rows(&statement.text) {
            match sqlx::query(&statement.text).fetch_all(&self.pool).await {
                Ok(rows) => StatementOutcome::with_rows(&statement.text, materialize(&rows)),
                Err(e) => failure_outcome(&statement.text, e)?,
            }
        } else {
            match sqlx::query(&statement.text).execute(&self.pool).await {
                Ok(done) => {
                    StatementOutcome::with_affected_rows(&statement.text, done.rows_affected())
                },
                Err(e) => failure_outcome(&statement.text, e)?,
            }
        };

        log::debug!(
            target: "sql::exec",
            "statement {} finished | ok={} | took={:.3}ms",
            statement.index,
            outcome.succeeded(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(outcome)
    }
}

fn materialize(rows: &[PgRow]) -> Vec<Row> {
    rows.iter().map(row_to_json).collect()
}

/// Where a database error lands: in the statement's outcome, or as a
/// batch-aborting connectivity fault.
enum DbFault {
    Statement(String),
    Connection(String),
}

fn split_db_error(err: sqlx::Error) -> DbFault {
    match err {
        sqlx::Error::Database(db) => DbFault::Statement(db.message().to_string()),
        e @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_)) => DbFault::Connection(e.to_string()),
        other => DbFault::Statement(other.to_string()),
    }
}

fn failure_outcome(sql: &str, err: sqlx::Error) -> Result<StatementOutcome> {
    match split_db_error(err) {
        DbFault::Statement(message) => {
            log::debug!(target: "sql::exec", "statement failed | error='{}'", message);
            Ok(StatementOutcome::failed(sql, message))
        },
        DbFault::Connection(message) => {
            log::error!(target: "sql::exec", "connectivity fault: {}", message);
            Err(PipelineError::connection(message))
        },
    }
}

/// Map any sqlx error into the shared error type (catalog queries).
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> PipelineError {
    match split_db_error(err) {
        DbFault::Statement(message) => PipelineError::execution(message),
        DbFault::Connection(message) => PipelineError::connection(message),
    }
}

fn bind_json_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &serde_json::Value,
) -> Query<'q, Postgres, PgArguments> {
    use serde_json::Value;
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        },
        Value::String(s) => query.bind(s.clone()),
        // Arrays and objects go over the wire as jsonb
        other => query.bind(other.clone()),
    }
}

/// Convert a database row to a column-name -> JSON value mapping,
/// dispatching on the column's Postgres type name.
fn row_to_json(row: &PgRow) -> Row {
    use serde_json::{json, Value};

    let mut map = Row::new();

    for column in row.columns() {
        let name = column.name();
        let type_name = column.type_info().name();

        let value: Option<Value> = match type_name {
            "UUID" => row
                .try_get::<Option<uuid::Uuid>, _>(name)
                .ok()
                .flatten()
                .map(|u| json!(u.to_string())),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<Option<String>, _>(name)
                .ok()
                .flatten()
                .map(|s| json!(s)),
            "INT2" => row
                .try_get::<Option<i16>, _>(name)
                .ok()
                .flatten()
                .map(|i| json!(i)),
            "INT4" => row
                .try_get::<Option<i32>, _>(name)
                .ok()
                .flatten()
                .map(|i| json!(i)),
            "INT8" => row
                .try_get::<Option<i64>, _>(name)
                .ok()
                .flatten()
                .map(|i| json!(i)),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(name)
                .ok()
                .flatten()
                .map(|f| json!(f)),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(name)
                .ok()
                .flatten()
                .map(|f| json!(f)),
            "NUMERIC" => row
                .try_get::<Option<rust_decimal::Decimal>, _>(name)
                .ok()
                .flatten()
                .map(|d| json!(d.to_string())),
            "BOOL" => row
                .try_get::<Option<bool>, _>(name)
                .ok()
                .flatten()
                .map(|b| json!(b)),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(name).ok().flatten(),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)
                .ok()
                .flatten()
                .map(|dt| json!(dt.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(name)
                .ok()
                .flatten()
                .map(|dt| json!(dt.to_string())),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(name)
                .ok()
                .flatten()
                .map(|d| json!(d.to_string())),
            _ => None,
        };

        map.insert(name.to_string(), value.unwrap_or(Value::Null));
    }

    map
}
