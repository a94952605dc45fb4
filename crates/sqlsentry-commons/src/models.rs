//! Data models for the statement pipeline.
//!
//! All of these are request-scoped value objects: constructed for one
//! pipeline invocation, serialized into the response, then dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// One materialized result row: column name -> JSON value.
pub type Row = serde_json::Map<String, Value>;

/// One discrete SQL statement extracted from a blob.
///
/// `index` is 1-based and reflects the statement's position in the
/// original blob; `text` is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    pub index: usize,
}

impl Statement {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index,
        }
    }
}

/// Statement category derived from the leading keyword (and, for
/// UPDATE/DELETE, the presence of a WHERE token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementCategory {
    /// SELECT
    Read,
    /// INSERT, or UPDATE/DELETE carrying a WHERE clause
    MutateGuarded,
    /// UPDATE/DELETE with no WHERE clause
    MutateUnguarded,
    /// DROP, ALTER, TRUNCATE
    Ddl,
    /// Anything else; the database produces the authoritative error
    Unknown,
}

impl StatementCategory {
    pub fn name(self) -> &'static str {
        match self {
            StatementCategory::Read => "READ",
            StatementCategory::MutateGuarded => "MUTATE_GUARDED",
            StatementCategory::MutateUnguarded => "MUTATE_UNGUARDED",
            StatementCategory::Ddl => "DDL",
            StatementCategory::Unknown => "UNKNOWN",
        }
    }
}

/// Recorded result of executing (or rejecting) one statement.
///
/// Exactly one of `rows` / `rows_affected` is meaningful, depending on
/// whether the statement returns rows. All fields serialize explicitly
/// (`null` rather than absent) because downstream callers key off
/// `error == null` per statement.
///
/// # Example success entry
/// ```json
/// {
///   "sql": "SELECT * FROM employees",
///   "rows": [{"id": 1, "name": "Alice"}],
///   "rows_affected": null,
///   "message": "Query executed successfully. Retrieved 1 rows.",
///   "error": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementOutcome {
    pub sql: String,
    pub rows: Option<Vec<Row>>,
    pub rows_affected: Option<u64>,
    pub message: String,
    pub error: Option<String>,
}

impl StatementOutcome {
    /// Outcome for a row-returning statement (SELECT, or RETURNING clause).
    pub fn with_rows(sql: impl Into<String>, rows: Vec<Row>) -> Self {
        let message = format!("Query executed successfully. Retrieved {} rows.", rows.len());
        Self {
            sql: sql.into(),
            rows: Some(rows),
            rows_affected: None,
            message,
            error: None,
        }
    }

    /// Outcome for a statement that only reports an affected-row count.
    pub fn with_affected_rows(sql: impl Into<String>, count: u64) -> Self {
        Self {
            sql: sql.into(),
            rows: None,
            rows_affected: Some(count),
            message: format!("Query executed successfully. {} rows affected.", count),
            error: None,
        }
    }

    /// Outcome for a statement the database rejected or failed.
    pub fn failed(sql: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            sql: sql.into(),
            rows: None,
            rows_affected: None,
            message: format!("Database error: {}", error),
            error: Some(error),
        }
    }

    /// Outcome for a statement the safety guard blocked before execution.
    pub fn rejected(sql: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            sql: sql.into(),
            rows: None,
            rows_affected: None,
            message: format!("Statement rejected by safety guard: {}", reason),
            error: Some(reason),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Replace the human-readable message, keeping everything else.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Full per-batch result returned to the caller.
///
/// `success` is true iff every outcome succeeded; a failed statement
/// never prevents later statements from appearing here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub success: bool,
    pub statements: Vec<StatementOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(statements: Vec<StatementOutcome>) -> Self {
        let success = statements.iter().all(StatementOutcome::succeeded);
        Self {
            success,
            statements,
        }
    }

    /// Report for an empty blob: no statements, vacuously successful.
    pub fn empty() -> Self {
        Self {
            success: true,
            statements: Vec::new(),
        }
    }
}

/// A parameterized statement: SQL text with `$n` placeholders plus the
/// values to bind, in placeholder order. Produced by the CRUD builder;
/// values never appear in the SQL text itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// CRUD operations accepted by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
    Create,
    Read,
    Update,
    Delete,
}

impl CrudOperation {
    /// The allowed set, for validation messages.
    pub const ALLOWED: &'static str = "CREATE, READ, UPDATE, DELETE";

    pub fn as_str(self) -> &'static str {
        match self {
            CrudOperation::Create => "CREATE",
            CrudOperation::Read => "READ",
            CrudOperation::Update => "UPDATE",
            CrudOperation::Delete => "DELETE",
        }
    }
}

impl FromStr for CrudOperation {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(CrudOperation::Create),
            "READ" => Ok(CrudOperation::Read),
            "UPDATE" => Ok(CrudOperation::Update),
            "DELETE" => Ok(CrudOperation::Delete),
            _ => Err(()),
        }
    }
}

/// Structured single-statement request for the CRUD path.
///
/// Consumed once by the query builder and discarded after the resulting
/// statement executes. `operation` stays a plain string so an unknown
/// value becomes a validation error naming the allowed set instead of a
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrudRequest {
    pub operation: String,
    pub table: String,
    #[serde(default)]
    pub data: Row,
    #[serde(default)]
    pub where_clause: Option<Row>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut map = Row::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        map
    }

    #[test]
    fn test_outcome_with_rows_message() {
        let rows = vec![row(&[("id", json!(1))]), row(&[("id", json!(2))])];
        let outcome = StatementOutcome::with_rows("SELECT * FROM t", rows);
        assert!(outcome.succeeded());
        assert_eq!(outcome.message, "Query executed successfully. Retrieved 2 rows.");
        assert!(outcome.rows_affected.is_none());
    }

    #[test]
    fn test_outcome_failed_keeps_driver_message() {
        let outcome = StatementOutcome::failed("SELECT * FROM missing", "relation does not exist");
        assert!(!outcome.succeeded());
        assert_eq!(outcome.error.as_deref(), Some("relation does not exist"));
        assert_eq!(outcome.message, "Database error: relation does not exist");
    }

    #[test]
    fn test_report_success_is_and_of_outcomes() {
        let report = BatchReport::from_outcomes(vec![
            StatementOutcome::with_affected_rows("INSERT INTO t VALUES (1)", 1),
            StatementOutcome::failed("SELECT * FROM missing", "boom"),
        ]);
        assert!(!report.success);
        assert_eq!(report.statements.len(), 2);

        let report = BatchReport::from_outcomes(vec![StatementOutcome::with_rows(
            "SELECT 1",
            vec![],
        )]);
        assert!(report.success);
    }

    #[test]
    fn test_report_serializes_explicit_nulls() {
        let report = BatchReport::from_outcomes(vec![StatementOutcome::with_affected_rows(
            "DELETE FROM t WHERE id = 1",
            1,
        )]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"rows\":null"));
        assert!(json.contains("\"error\":null"));
        assert!(json.contains("\"rows_affected\":1"));
    }

    #[test]
    fn test_crud_operation_from_str() {
        assert_eq!("create".parse::<CrudOperation>().unwrap(), CrudOperation::Create);
        assert_eq!("DELETE".parse::<CrudOperation>().unwrap(), CrudOperation::Delete);
        assert!("PATCH".parse::<CrudOperation>().is_err());
    }

    #[test]
    fn test_crud_request_deserialization() {
        let request: CrudRequest = serde_json::from_str(
            r#"{"operation": "READ", "table": "orders", "where_clause": {"customer_name": "Alice Brown"}}"#,
        )
        .unwrap();
        assert_eq!(request.operation, "READ");
        assert!(request.data.is_empty());
        assert_eq!(
            request.where_clause.unwrap().get("customer_name"),
            Some(&json!("Alice Brown"))
        );
    }
}
