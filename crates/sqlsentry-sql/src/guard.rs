//! Safety guard applied to each statement before it reaches the database.
//!
//! Model-generated SQL is untrusted input; this policy check is the only
//! boundary between that text and the database, since the blob path
//! cannot be parameterized.

use crate::classify::{leading_keyword, referenced_tables};
use sqlsentry_commons::models::{Statement, StatementCategory};
use sqlsentry_commons::{PipelineError, Result};
use std::collections::HashSet;

/// Data-safety policy for model-generated statements.
///
/// Rejects unguarded mutations and DDL outright. When an allowlist is
/// configured, statements referencing tables outside it are rejected as
/// well; without one the table check is skipped.
#[derive(Debug, Clone, Default)]
pub struct SafetyPolicy {
    allowed_tables: Option<HashSet<String>>,
}

impl SafetyPolicy {
    /// Policy with no table allowlist.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Policy confined to the given tables (compared case-insensitively).
    pub fn with_allowed_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = tables.into_iter().map(|t| t.into().to_lowercase()).collect();
        Self {
            allowed_tables: if set.is_empty() { None } else { Some(set) },
        }
    }

    pub fn has_allowlist(&self) -> bool {
        self.allowed_tables.is_some()
    }

    /// Check one statement against the policy.
    ///
    /// A rejection becomes that statement's outcome; it never aborts the
    /// batch.
    pub fn check(&self, statement: &Statement, category: StatementCategory) -> Result<()> {
        let verb =
            leading_keyword(&statement.text).unwrap_or_else(|| "UPDATE/DELETE".to_string());

        match category {
            StatementCategory::MutateUnguarded => {
                log::warn!(
                    target: "sql::guard",
                    "statement {} blocked: {} without WHERE",
                    statement.index,
                    verb
                );
                return Err(PipelineError::safety_violation(format!(
                    "{} without a WHERE clause is not allowed",
                    verb
                )));
            },
            StatementCategory::Ddl => {
                log::warn!(
                    target: "sql::guard",
                    "statement {} blocked: DDL ({})",
                    statement.index,
                    verb
                );
                return Err(PipelineError::safety_violation(format!(
                    "DDL statement {} is not allowed",
                    verb
                )));
            },
            StatementCategory::Read
            | StatementCategory::MutateGuarded
            | StatementCategory::Unknown => {},
        }

        if let Some(allowed) = &self.allowed_tables {
            for table in referenced_tables(&statement.text) {
                // Qualified names only need their final segment in the set
                let bare = table.rsplit('.').next().unwrap_or(&table);
                if !allowed.contains(&table) && !allowed.contains(bare) {
                    log::warn!(
                        target: "sql::guard",
                        "statement {} blocked: table '{}' outside the allowed set",
                        statement.index,
                        table
                    );
                    return Err(PipelineError::safety_violation(format!(
                        "Table '{}' is not in the allowed table set",
                        table
                    )));
                }
            }
        }

        Ok(())
    }
}
