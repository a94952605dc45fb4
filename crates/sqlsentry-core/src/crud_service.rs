//! CRUD request execution: build a parameterized statement, run it, and
//! phrase the result message per operation.

use crate::app_context::AppContext;
use sqlsentry_commons::models::{CrudOperation, CrudRequest, StatementOutcome};
use sqlsentry_commons::Result;
use sqlsentry_sql::build_statement;
use std::sync::Arc;

/// Alternate entry point that bypasses the splitter: exactly one
/// statement per call, always parameterized.
pub struct CrudService {
    context: Arc<AppContext>,
}

impl CrudService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Build and execute the statement for one CRUD request.
    ///
    /// Validation problems (unknown operation, bad identifiers) are
    /// reported before anything reaches the database.
    pub async fn execute(&self, request: &CrudRequest) -> Result<StatementOutcome> {
        let bound = build_statement(request)?;

        log::debug!(
            target: "sql::crud",
            "{} on '{}' -> {}",
            request.operation.to_uppercase(),
            request.table,
            bound.sql
        );

        let outcome = self.context.executor().execute_bound(&bound).await?;
        Ok(finalize_message(request, outcome))
    }
}

/// Successful outcomes get an operation-specific message; failures keep
/// the database error text untouched.
fn finalize_message(request: &CrudRequest, outcome: StatementOutcome) -> StatementOutcome {
    if !outcome.succeeded() {
        return outcome;
    }

    let count = outcome
        .rows
        .as_ref()
        .map(|rows| rows.len())
        .unwrap_or_else(|| outcome.rows_affected.unwrap_or(0) as usize);

    let message = match request.operation.parse::<CrudOperation>() {
        Ok(CrudOperation::Create) => "Record created successfully".to_string(),
        Ok(CrudOperation::Read) => format!("Retrieved {} records", count),
        Ok(CrudOperation::Update) => format!("Updated {} records", count),
        Ok(CrudOperation::Delete) => format!("Deleted {} records", count),
        Err(()) => return outcome,
    };

    outcome.with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlsentry_commons::models::Row;

    fn request(operation: &str) -> CrudRequest {
        CrudRequest {
            operation: operation.to_string(),
            table: "orders".to_string(),
            data: Row::new(),
            where_clause: None,
        }
    }

    fn one_row() -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(1));
        row
    }

    #[test]
    fn read_message_counts_rows() {
        let outcome = StatementOutcome::with_rows("SELECT * FROM orders", vec![one_row()]);
        let outcome = finalize_message(&request("READ"), outcome);
        assert_eq!(outcome.message, "Retrieved 1 records");
    }

    #[test]
    fn create_message_is_fixed() {
        let outcome = StatementOutcome::with_rows(
            "INSERT INTO orders (id) VALUES ($1) RETURNING *",
            vec![one_row()],
        );
        let outcome = finalize_message(&request("CREATE"), outcome);
        assert_eq!(outcome.message, "Record created successfully");
    }

    #[test]
    fn delete_message_counts_returned_rows() {
        let outcome = StatementOutcome::with_rows(
            "DELETE FROM orders WHERE id = $1 RETURNING *",
            vec![one_row(), one_row()],
        );
        let outcome = finalize_message(&request("DELETE"), outcome);
        assert_eq!(outcome.message, "Deleted 2 records");
    }

    #[test]
    fn failed_outcome_keeps_database_message() {
        let outcome =
            StatementOutcome::failed("SELECT * FROM orders", "relation does not exist");
        let outcome = finalize_message(&request("READ"), outcome);
        assert_eq!(outcome.message, "Database error: relation does not exist");
        assert!(outcome.error.is_some());
    }
}
