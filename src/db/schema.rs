// Column metadata for the tables the SQL agent may query

use crate::types::AppResult;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{info, warn};

/// Dialect named in every prompt that asks for SQL.
pub const SQL_DIALECT: &str = "PostgreSQL";

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumns {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

/// Columns of each included table, read from `information_schema.columns` of
/// the current schema. Result order follows `tables`; tables that do not
/// exist are logged and skipped.
pub async fn load_table_columns(pool: &PgPool, tables: &[String]) -> AppResult<Vec<TableColumns>> {
    let wanted: Vec<String> = tables.iter().map(|t| t.to_lowercase()).collect();

    // information_schema columns are domain types; cast so they decode as text.
    let rows = sqlx::query(
        "SELECT table_name::text AS table_name, column_name::text AS column_name, \
                data_type::text AS data_type \
         FROM information_schema.columns \
         WHERE table_schema = current_schema() AND lower(table_name) = ANY($1) \
         ORDER BY table_name, ordinal_position",
    )
    .bind(wanted)
    .fetch_all(pool)
    .await?;

    let mut loaded: Vec<TableColumns> = Vec::new();
    for row in &rows {
        let table: String = row.try_get("table_name")?;
        let column = ColumnInfo {
            name: row.try_get("column_name")?,
            data_type: row.try_get("data_type")?,
        };
        match loaded.last_mut() {
            Some(last) if last.table == table => last.columns.push(column),
            _ => loaded.push(TableColumns {
                table,
                columns: vec![column],
            }),
        }
    }

    let mut ordered = Vec::with_capacity(loaded.len());
    for name in tables {
        match loaded.iter().position(|t| t.table.eq_ignore_ascii_case(name)) {
            Some(index) => ordered.push(loaded.swap_remove(index)),
            None => warn!(table = %name, "Included table not found in database"),
        }
    }

    info!(
        tables = ordered.len(),
        columns = ordered.iter().map(|t| t.columns.len()).sum::<usize>(),
        "Loaded table columns"
    );
    Ok(ordered)
}

/// `CREATE TABLE` style listing of the given tables, blank-line separated.
pub fn render_table_info(tables: &[TableColumns]) -> String {
    tables
        .iter()
        .map(|t| {
            let columns = t
                .columns
                .iter()
                .map(|c| format!("  {} {}", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(",\n");
            format!("CREATE TABLE {} (\n{}\n)", t.table, columns)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
