//! Atomic rule statements derived from table rows.
//!
//! Each data row becomes one line of indexable text pairing every non-blank
//! cell with its column header:
//!
//! ```text
//! [Table on page 2] Name: Alice; Score: 10
//! ```

use super::Table;

/// Cell values some renderers emit for missing data.
const NULL_LITERALS: &[&str] = &["nan", "none", "null"];

/// Knobs for rule generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOptions {
    /// Treat `nan`/`none`/`null` cells as blank.
    pub skip_null_literals: bool,
}

impl RuleOptions {
    fn keeps(self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        !(self.skip_null_literals
            && NULL_LITERALS
                .iter()
                .any(|literal| value.eq_ignore_ascii_case(literal)))
    }
}

/// Rules for every data row of `table`, in row order.
///
/// Rows with no surviving `header: value` pair produce nothing.
pub fn generate_rules(table: &Table, options: RuleOptions) -> Vec<String> {
    table
        .rows
        .iter()
        .filter_map(|row| row_rule(table.page_number, &table.headers, row, options))
        .collect()
}

fn row_rule(
    page_number: usize,
    headers: &[String],
    row: &[String],
    options: RuleOptions,
) -> Option<String> {
    let pairs: Vec<String> = headers
        .iter()
        .zip(row)
        .filter_map(|(header, cell)| {
            let value = cell.trim();
            options
                .keeps(value)
                .then(|| format!("{}: {value}", header.trim()))
        })
        .collect();

    if pairs.is_empty() {
        return None;
    }
    Some(format!("[Table on page {page_number}] {}", pairs.join("; ")))
}
