//! Page geometry: lines, column boundaries, and column splitting.
//!
//! ```text
//! glyphs → assemble_lines → TextLine ─┬─ detect_boundaries → ColumnBoundary[]
//!                                     └─ split_line (boundaries) → cells
//! ```

pub mod boundary;
pub mod lines;
pub mod split;

pub use boundary::{detect_boundaries, enforce_non_overlap, gap_threshold, ColumnBoundary};
pub use lines::{assemble_lines, LINE_TOLERANCE};
pub use split::{split_line, LineSplit};
