//! Batch aggregation: the pipeline's main entry point for a raw SQL blob.
//!
//! Statements execute strictly sequentially — later statements may depend
//! on side effects of earlier ones — and a statement-level failure never
//! stops the batch. The caller gets one outcome per statement and an
//! overall flag, so it can see exactly which of N operations in a
//! multi-step instruction succeeded.

use crate::app_context::AppContext;
use crate::executor::StatementRunner;
use sqlsentry_commons::models::{BatchReport, Statement, StatementOutcome};
use sqlsentry_commons::{PipelineError, Result};
use sqlsentry_sql::{classify, split_statements, SafetyPolicy};
use std::sync::Arc;

/// Run a sequence of statements through guard + executor, collecting one
/// outcome per statement.
///
/// Failures are values here, never control flow: a guard rejection or a
/// database error lands in that statement's outcome and the loop moves
/// on. Only a connectivity fault aborts, as `Err`.
pub async fn run_batch<R>(
    runner: &R,
    policy: &SafetyPolicy,
    statements: &[Statement],
) -> Result<BatchReport>
where
    R: StatementRunner + ?Sized,
{
    let mut outcomes = Vec::with_capacity(statements.len());

    for statement in statements {
        let category = classify(&statement.text);
        log::debug!(
            target: "sql::agent",
            "statement {} classified as {}",
            statement.index,
            category.name()
        );
        let outcome = match policy.check(statement, category) {
            Ok(()) => runner.run(statement).await?,
            Err(violation) => StatementOutcome::rejected(&statement.text, violation.detail()),
        };
        outcomes.push(outcome);
    }

    Ok(BatchReport::from_outcomes(outcomes))
}

/// Entry point for model-generated SQL blobs.
pub struct SqlAgentService {
    context: Arc<AppContext>,
}

impl SqlAgentService {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Split a raw blob and run the resulting batch.
    ///
    /// The blob is treated as opaque statement text regardless of whether
    /// the model honored its prompt contract. An empty or whitespace-only
    /// blob yields an empty, successful report.
    pub async fn run_blob(&self, blob: &str) -> Result<BatchReport> {
        let statements = split_statements(blob);

        let max = self.context.config().safety.max_statements;
        if max > 0 && statements.len() > max {
            return Err(PipelineError::validation(format!(
                "Batch of {} statements exceeds the configured limit of {}",
                statements.len(),
                max
            )));
        }

        log::info!(
            target: "sql::agent",
            "executing batch of {} statement(s)",
            statements.len()
        );

        let executor = self.context.executor();
        run_batch(&executor, self.context.policy(), &statements).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use sqlsentry_commons::models::Row;
    use std::sync::Mutex;

    /// Runner that scripts outcomes off the statement text and records
    /// everything it was asked to run.
    struct ScriptedRunner {
        executed: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new() -> Self {
            Self {
                executed: Mutex::new(Vec::new()),
            }
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatementRunner for ScriptedRunner {
        async fn run(&self, statement: &Statement) -> Result<StatementOutcome> {
            self.executed.lock().unwrap().push(statement.text.clone());

            if statement.text.contains("nonexistent_table") {
                return Ok(StatementOutcome::failed(
                    &statement.text,
                    "relation \"nonexistent_table\" does not exist",
                ));
            }
            if statement.text.contains("unreachable") {
                return Err(PipelineError::connection("pool timed out"));
            }

            let mut row = Row::new();
            row.insert("?column?".to_string(), json!(1));
            Ok(StatementOutcome::with_rows(&statement.text, vec![row]))
        }
    }

    fn statements(blob: &str) -> Vec<Statement> {
        split_statements(blob)
    }

    #[tokio::test]
    async fn partial_failure_keeps_later_outcomes() {
        let runner = ScriptedRunner::new();
        let policy = SafetyPolicy::permissive();
        let batch = statements("SELECT 1; SELECT * FROM nonexistent_table");

        let report = run_batch(&runner, &policy, &batch).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.statements.len(), 2);
        assert!(report.statements[0].succeeded());
        assert_eq!(report.statements[0].rows.as_ref().unwrap().len(), 1);
        assert!(report.statements[1].error.is_some());
    }

    #[tokio::test]
    async fn failure_does_not_short_circuit() {
        let runner = ScriptedRunner::new();
        let policy = SafetyPolicy::permissive();
        let batch = statements("SELECT * FROM nonexistent_table; SELECT 1; SELECT 2");

        let report = run_batch(&runner, &policy, &batch).await.unwrap();

        assert_eq!(report.statements.len(), 3);
        assert!(!report.statements[0].succeeded());
        assert!(report.statements[1].succeeded());
        assert!(report.statements[2].succeeded());
        assert_eq!(runner.executed().len(), 3);
    }

    #[tokio::test]
    async fn guard_rejection_never_reaches_the_runner() {
        let runner = ScriptedRunner::new();
        let policy = SafetyPolicy::permissive();
        let batch = statements(
            "INSERT INTO employees (name) VALUES ('Bob'); DELETE FROM employees; SELECT 1",
        );

        let report = run_batch(&runner, &policy, &batch).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.statements.len(), 3);
        assert!(report.statements[1].error.as_deref().unwrap().contains("WHERE"));
        // The rejected DELETE must not have touched the runner.
        assert_eq!(
            runner.executed(),
            vec![
                "INSERT INTO employees (name) VALUES ('Bob')".to_string(),
                "SELECT 1".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn connection_fault_aborts_the_batch() {
        let runner = ScriptedRunner::new();
        let policy = SafetyPolicy::permissive();
        let batch = statements("SELECT * FROM unreachable; SELECT 1");

        let err = run_batch(&runner, &policy, &batch).await.unwrap_err();
        assert!(err.is_connection_fault());
    }

    #[tokio::test]
    async fn empty_batch_is_vacuously_successful() {
        let runner = ScriptedRunner::new();
        let policy = SafetyPolicy::permissive();

        let report = run_batch(&runner, &policy, &[]).await.unwrap();
        assert!(report.success);
        assert!(report.statements.is_empty());
    }

    #[tokio::test]
    async fn order_of_outcomes_matches_input() {
        let runner = ScriptedRunner::new();
        let policy = SafetyPolicy::permissive();
        let batch = statements("SELECT 1; SELECT 2; SELECT 3");

        let report = run_batch(&runner, &policy, &batch).await.unwrap();
        let sqls: Vec<&str> = report.statements.iter().map(|o| o.sql.as_str()).collect();
        assert_eq!(sqls, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }
}
