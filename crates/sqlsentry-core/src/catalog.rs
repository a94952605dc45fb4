//! Schema catalog backed by information_schema.
//!
//! Two consumers: the safety policy (confining the agent to tables that
//! exist) and the upstream prompt builder, which embeds the rendered
//! schema description in the instruction it sends to the model.

use crate::executor::map_sqlx_error;
use serde::Serialize;
use sqlx::postgres::PgPool;
use sqlx::Row as _;
use sqlsentry_commons::Result;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

pub struct SchemaCatalog {
    pool: PgPool,
}

impl SchemaCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Table names in the public schema, ordered by name.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT table_name::text AS table_name \
             FROM information_schema.tables \
             WHERE table_schema = 'public' \
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(map_sqlx_error))
            .collect()
    }

    /// Column metadata for one table, in ordinal order.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query(
            "SELECT column_name::text AS column_name, \
                    data_type::text AS data_type, \
                    is_nullable::text AS is_nullable, \
                    column_default::text AS column_default \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get("column_name").map_err(map_sqlx_error)?,
                    data_type: row.try_get("data_type").map_err(map_sqlx_error)?,
                    is_nullable: row
                        .try_get::<String, _>("is_nullable")
                        .map_err(map_sqlx_error)?
                        == "YES",
                    default: row
                        .try_get::<Option<String>, _>("column_default")
                        .map_err(map_sqlx_error)?,
                })
            })
            .collect()
    }

    /// Every public table with its columns.
    pub async fn describe(&self) -> Result<Vec<TableInfo>> {
        let mut tables = Vec::new();
        for name in self.list_tables().await? {
            let columns = self.table_columns(&name).await?;
            tables.push(TableInfo { name, columns });
        }
        Ok(tables)
    }

    /// The catalog rendered as the indented text block the prompt builder
    /// embeds ahead of the instruction.
    pub async fn schema_description(&self) -> Result<String> {
        Ok(render_schema_description(&self.describe().await?))
    }
}

pub(crate) fn render_schema_description(tables: &[TableInfo]) -> String {
    let mut out = String::new();
    for table in tables {
        out.push_str(&format!("- Table '{}':\n", table.name));
        for column in &table.columns {
            let nullability = if column.is_nullable { "" } else { ", not null" };
            out.push_str(&format!(
                "    - {} ({}{})\n",
                column.name, column.data_type, nullability
            ));
        }
    }
    out
}
