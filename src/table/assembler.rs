//! Per-page table assembly.
//!
//! A page is consumed line by line by [`TableAssemblerState::transition`],
//! a pure step `(state, line) -> (state, emitted table?, replay?)`. The
//! state is either [`Phase::Idle`] or [`Phase::Building`] a
//! [`TableCandidate`]. When a line ends the current candidate and must be
//! looked at again as a possible new table, the transition asks for a
//! replay; [`assemble_page`] keeps that line in a single-slot pending queue
//! and feeds it back before pulling the next one.
//!
//! Priority of the rules for each line:
//!
//! 1. Blank line: keep a blank row in the candidate as possible inter-row
//!    spacing and remember the blank.
//! 2. First line after a blank while building: if the line shrinks the
//!    layout, or fills at least half the columns right after a blank
//!    sentinel row, the candidate ends and the line is replayed.
//! 3. Idle: detect columns on the line; two or more start a candidate.
//! 4. Building: a line drifting past either edge ends the candidate and is
//!    replayed; otherwise it is split into the candidate's columns (growing
//!    them if needed) and appended.
//! 5. End of page: finalize whatever remains.

use tracing::debug;

use crate::glyph::TextLine;
use crate::layout::{split_line, ColumnBoundary};

use super::{is_blank_row, normalize_row, Table};

/// Fewest columns a line needs to start a table.
const MIN_TABLE_COLUMNS: usize = 2;
/// Fewest rows (header included) a finalized table keeps.
const MIN_TABLE_ROWS: usize = 2;
/// Fewest non-blank cells that signal a new table after a blank row.
const MIN_RESTART_FILLED: usize = 2;
/// Lower bound of the horizontal drift tolerance.
const MIN_DRIFT_TOLERANCE: f32 = 8.0;
/// Drift tolerance as a multiple of the line's average glyph width.
const DRIFT_WIDTH_RATIO: f32 = 3.0;

/// The in-progress table on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCandidate {
    pub boundaries: Vec<ColumnBoundary>,
    /// Collected rows, each as wide as `boundaries`.
    pub rows: Vec<Vec<String>>,
    pub start_line: usize,
}

impl TableCandidate {
    pub fn column_count(&self) -> usize {
        self.boundaries.len()
    }

    /// Whether `line` extends past the candidate's outer boundaries by more
    /// than the drift tolerance.
    pub fn drifts(&self, line: &TextLine) -> bool {
        let (Some(first), Some(last), Some(left), Some(right)) = (
            self.boundaries.first(),
            self.boundaries.last(),
            line.left(),
            line.right(),
        ) else {
            return false;
        };

        let tolerance = (DRIFT_WIDTH_RATIO * line.average_glyph_width()).max(MIN_DRIFT_TOLERANCE);
        left < first.start - tolerance || right > last.end + tolerance
    }

    /// Whether the first line after a blank starts something new.
    ///
    /// Either the line yields fewer columns than the candidate has, or the
    /// last row is a blank sentinel and the line fills at least half of the
    /// columns (and never fewer than two).
    fn restarts_after_blank(&self, line: &TextLine) -> bool {
        let preview = split_line(line, &self.boundaries);
        let columns = self.column_count();
        if preview.column_count() < columns {
            return true;
        }

        let sentinel = self.rows.last().is_some_and(|row| is_blank_row(row));
        let required = columns.div_ceil(2).max(MIN_RESTART_FILLED);
        sentinel && self.rows.len() > 1 && preview.filled_count() >= required
    }

    /// Trim trailing blank rows and emit a table if at least two rows remain.
    pub fn finalize(mut self, page_number: usize) -> Option<Table> {
        while self.rows.last().is_some_and(|row| is_blank_row(row)) {
            self.rows.pop();
        }

        if self.rows.len() < MIN_TABLE_ROWS {
            debug!(
                page = page_number,
                start_line = self.start_line,
                rows = self.rows.len(),
                "discarding table candidate"
            );
            return None;
        }

        let column_count = self.column_count();
        let mut rows = self.rows.iter().map(|row| normalize_row(row, column_count));
        let headers = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();

        debug!(
            page = page_number,
            start_line = self.start_line,
            columns = column_count,
            rows = rows.len(),
            "finalized table"
        );

        Some(Table {
            page_number,
            start_line: self.start_line,
            headers,
            row_count: rows.len(),
            rows,
            column_count,
        })
    }
}

/// Whether a table candidate is in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Building(TableCandidate),
}

/// Assembler state for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAssemblerState {
    pub page_number: usize,
    pub phase: Phase,
    /// Whether the previous line was blank.
    pub previous_blank: bool,
}

/// Outcome of feeding one line to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: TableAssemblerState,
    pub emitted: Option<Table>,
    /// Feed the same line again before the next one.
    pub replay: bool,
}

impl Transition {
    fn stay(state: TableAssemblerState) -> Self {
        Self {
            state,
            emitted: None,
            replay: false,
        }
    }

    fn close(page_number: usize, candidate: TableCandidate, replay: bool) -> Self {
        Self {
            state: TableAssemblerState::new(page_number),
            emitted: candidate.finalize(page_number),
            replay,
        }
    }
}

impl TableAssemblerState {
    pub fn new(page_number: usize) -> Self {
        Self {
            page_number,
            phase: Phase::Idle,
            previous_blank: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// The candidate being built, if any.
    pub fn candidate(&self) -> Option<&TableCandidate> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Building(candidate) => Some(candidate),
        }
    }

    /// Consume line `index` of the page.
    pub fn transition(self, index: usize, line: &TextLine) -> Transition {
        let Self {
            page_number,
            phase,
            previous_blank,
        } = self;

        if line.is_blank() {
            let phase = match phase {
                Phase::Building(mut candidate)
                    if !candidate.boundaries.is_empty() && !candidate.rows.is_empty() =>
                {
                    candidate.rows.push(vec![String::new(); candidate.column_count()]);
                    Phase::Building(candidate)
                }
                other => other,
            };
            return Transition::stay(Self {
                page_number,
                phase,
                previous_blank: true,
            });
        }

        match phase {
            Phase::Idle => Self::open(page_number, index, line),
            Phase::Building(candidate) => {
                if previous_blank && candidate.restarts_after_blank(line) {
                    return Transition::close(page_number, candidate, true);
                }
                Self::extend(page_number, candidate, line)
            }
        }
    }

    /// Finalize the candidate left at end of page.
    pub fn finish(self) -> Option<Table> {
        match self.phase {
            Phase::Idle => None,
            Phase::Building(candidate) => candidate.finalize(self.page_number),
        }
    }

    fn open(page_number: usize, index: usize, line: &TextLine) -> Transition {
        let split = split_line(line, &[]);
        let columns = split.column_count();
        if columns < MIN_TABLE_COLUMNS {
            return Transition::stay(Self::new(page_number));
        }

        debug!(page = page_number, line = index, columns, "starting table candidate");
        let candidate = TableCandidate {
            rows: vec![normalize_row(&split.cells, columns)],
            boundaries: split.boundaries,
            start_line: index,
        };
        Transition::stay(Self {
            page_number,
            phase: Phase::Building(candidate),
            previous_blank: false,
        })
    }

    fn extend(page_number: usize, mut candidate: TableCandidate, line: &TextLine) -> Transition {
        if candidate.drifts(line) {
            return Transition::close(page_number, candidate, true);
        }

        let split = split_line(line, &candidate.boundaries);
        if split.reshaped() {
            candidate.rows = candidate.rows.iter().map(|row| split.realign(row)).collect();
        }
        let row = normalize_row(&split.cells, split.column_count());
        candidate.boundaries = split.boundaries;

        if is_blank_row(&row) {
            return Transition::close(page_number, candidate, false);
        }

        candidate.rows.push(row);
        Transition::stay(Self {
            page_number,
            phase: Phase::Building(candidate),
            previous_blank: false,
        })
    }
}

/// Run the assembler over one page's lines and collect its tables.
pub fn assemble_page(page_number: usize, lines: &[TextLine]) -> Vec<Table> {
    let mut state = TableAssemblerState::new(page_number);
    let mut tables = Vec::new();
    let mut pending: Option<usize> = None;
    let mut upcoming = 0..lines.len();

    while let Some(index) = pending.take().or_else(|| upcoming.next()) {
        let step = state.transition(index, &lines[index]);
        state = step.state;
        tables.extend(step.emitted);
        if step.replay {
            pending = Some(index);
        }
    }

    tables.extend(state.finish());
    tables
}
