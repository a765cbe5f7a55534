//! Tabular query results and their markdown rendering.
//!
//! The same rendering is fed to the report synthesizer and returned to the
//! client in the `tabela` field.

use serde::{Deserialize, Serialize};

/// Rows and column names returned by the query executor, every cell as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a pipe table:
    ///
    /// ```text
    /// | count |
    /// | --- |
    /// | 42 |
    /// ```
    ///
    /// No columns renders as the empty string; no rows renders header and
    /// separator only. Short rows are padded with empty cells.
    pub fn to_markdown(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }

        let width = self.columns.len();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(render_row(self.columns.iter().map(String::as_str), width));
        lines.push(format!("|{}", " --- |".repeat(width)));
        for row in &self.rows {
            lines.push(render_row(row.iter().map(String::as_str), width));
        }
        lines.join("\n")
    }
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, width: usize) -> String {
    let mut cells: Vec<String> = cells.take(width).map(escape_cell).collect();
    cells.resize(width, String::new());
    format!("| {} |", cells.join(" | "))
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}
