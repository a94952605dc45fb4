//! Parameterized CRUD statement builder.
//!
//! Builds exactly one statement per request from a table name, a value
//! mapping, and an optional filter mapping. Values are always bound as
//! `$n` parameters; only validated identifiers are spliced into the SQL
//! text. This is the structured counterpart to the free-text blob path,
//! which cannot be parameterized and relies on the safety guard instead.

use serde_json::Value;
use sqlsentry_commons::models::{BoundStatement, CrudOperation, CrudRequest, Row};
use sqlsentry_commons::{PipelineError, Result};

/// Build the statement for a CRUD request.
///
/// - CREATE: `INSERT INTO t (cols…) VALUES ($1…) RETURNING *`
/// - READ:   `SELECT * FROM t [WHERE k = $n AND …]`
/// - UPDATE: `UPDATE t SET k = $n, … [WHERE …] RETURNING *`
/// - DELETE: `DELETE FROM t [WHERE …] RETURNING *`
///
/// Returns a Validation error (no statement built) for an unknown
/// operation, a bad identifier, or an empty data mapping where one is
/// required.
pub fn build_statement(request: &CrudRequest) -> Result<BoundStatement> {
    let operation = request.operation.parse::<CrudOperation>().map_err(|_| {
        PipelineError::validation(format!(
            "Unknown operation '{}'. Allowed operations: {}",
            request.operation,
            CrudOperation::ALLOWED
        ))
    })?;

    let table = validate_identifier(&request.table, "table")?;

    match operation {
        CrudOperation::Create => build_insert(table, &request.data),
        CrudOperation::Read => build_select(table, request.where_clause.as_ref()),
        CrudOperation::Update => build_update(table, &request.data, request.where_clause.as_ref()),
        CrudOperation::Delete => build_delete(table, request.where_clause.as_ref()),
    }
}

fn build_insert(table: &str, data: &Row) -> Result<BoundStatement> {
    if data.is_empty() {
        return Err(PipelineError::validation(
            "CREATE requires a non-empty data mapping",
        ));
    }

    let mut columns = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());
    for (i, (column, value)) in data.iter().enumerate() {
        validate_identifier(column, "column")?;
        columns.push(column.clone());
        placeholders.push(format!("${}", i + 1));
        params.push(value.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok(BoundStatement { sql, params })
}

fn build_select(table: &str, where_clause: Option<&Row>) -> Result<BoundStatement> {
    let mut sql = format!("SELECT * FROM {}", table);
    let mut params = Vec::new();
    append_where(&mut sql, &mut params, where_clause)?;
    Ok(BoundStatement { sql, params })
}

fn build_update(table: &str, data: &Row, where_clause: Option<&Row>) -> Result<BoundStatement> {
    if data.is_empty() {
        return Err(PipelineError::validation(
            "UPDATE requires a non-empty data mapping",
        ));
    }

    let mut assignments = Vec::with_capacity(data.len());
    let mut params: Vec<Value> = Vec::with_capacity(data.len());
    for (column, value) in data {
        validate_identifier(column, "column")?;
        assignments.push(format!("{} = ${}", column, params.len() + 1));
        params.push(value.clone());
    }

    let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
    append_where(&mut sql, &mut params, where_clause)?;
    sql.push_str(" RETURNING *");
    Ok(BoundStatement { sql, params })
}

fn build_delete(table: &str, where_clause: Option<&Row>) -> Result<BoundStatement> {
    let mut sql = format!("DELETE FROM {}", table);
    let mut params = Vec::new();
    append_where(&mut sql, &mut params, where_clause)?;
    sql.push_str(" RETURNING *");
    Ok(BoundStatement { sql, params })
}

/// Append `WHERE k = $n AND …` for a non-empty filter mapping.
fn append_where(
    sql: &mut String,
    params: &mut Vec<Value>,
    where_clause: Option<&Row>,
) -> Result<()> {
    let filters = match where_clause {
        Some(map) if !map.is_empty() => map,
        _ => return Ok(()),
    };

    let mut conditions = Vec::with_capacity(filters.len());
    for (column, value) in filters {
        validate_identifier(column, "column")?;
        conditions.push(format!("{} = ${}", column, params.len() + 1));
        params.push(value.clone());
    }

    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    Ok(())
}

/// Identifiers are spliced into SQL text, so they get a strict shape
/// check: leading letter or underscore, then letters, digits, underscores.
fn validate_identifier<'a>(name: &'a str, kind: &str) -> Result<&'a str> {
    if name.is_empty() {
        return Err(PipelineError::validation(format!(
            "{} name cannot be empty",
            kind
        )));
    }

    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PipelineError::validation(format!(
            "Invalid {} name '{}'",
            kind, name
        )));
    }

    Ok(name)
}
