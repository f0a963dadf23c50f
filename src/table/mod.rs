//! Tables recovered from column-aligned text lines.
//!
//! Lines are fed through a per-page [`assembler`] state machine that grows a
//! table candidate row by row and finalizes it when the layout breaks.
//! Finalized tables are turned into provenance-tagged statements by
//! [`rules`].

pub mod assembler;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use assembler::{assemble_page, Phase, TableAssemblerState, TableCandidate, Transition};
pub use rules::{generate_rules, RuleOptions};

/// A finalized table. Only the assembler creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// 1-based page number.
    pub page_number: usize,
    /// Index of the page line the table started on.
    pub start_line: usize,
    pub headers: Vec<String>,
    /// Data rows, each exactly `column_count` cells.
    pub rows: Vec<Vec<String>>,
    pub column_count: usize,
    pub row_count: usize,
}

impl Table {
    /// Render this table as a GitHub-flavored markdown table.
    pub fn to_markdown(&self) -> String {
        if self.column_count == 0 {
            return String::new();
        }

        let mut md = String::new();
        push_markdown_row(&mut md, &self.headers, self.column_count);

        // Separator row
        md.push('|');
        for _ in 0..self.column_count {
            md.push_str(" --- |");
        }
        md.push('\n');

        for row in &self.rows {
            push_markdown_row(&mut md, row, self.column_count);
        }

        md
    }
}

fn push_markdown_row(md: &mut String, row: &[String], col_count: usize) {
    md.push('|');
    for col in 0..col_count {
        let cell = row.get(col).map(String::as_str).unwrap_or("");
        md.push_str(&format!(" {} |", cell.replace('|', "\\|")));
    }
    md.push('\n');
}

/// Trim every cell and pad or truncate the row to exactly `columns` cells.
pub fn normalize_row(row: &[String], columns: usize) -> Vec<String> {
    (0..columns)
        .map(|i| row.get(i).map(|c| c.trim().to_string()).unwrap_or_default())
        .collect()
}

/// Whether every cell of the row is blank.
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
