//! Assign a line's glyphs to columns.

use crate::glyph::{PositionedGlyph, TextLine};

use super::boundary::{detect_boundaries, resolve_sorted_overlaps, ColumnBoundary};

/// Lower bound for how far outside a boundary a glyph centre may fall and still match.
const MIN_MATCH_TOLERANCE: f32 = 2.0;
/// Match tolerance as a multiple of the average glyph width.
const MATCH_WIDTH_RATIO: f32 = 0.75;
/// Distance weight for a glyph centre strictly inside a boundary.
const INSIDE_DISTANCE_WEIGHT: f32 = 0.5;

/// Result of splitting one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSplit {
    /// Boundaries after the split, possibly grown and with new columns inserted.
    pub boundaries: Vec<ColumnBoundary>,
    /// Trimmed text per column, aligned 1:1 with `boundaries`.
    pub cells: Vec<String>,
    /// For each column, the index of the input boundary it grew from, or
    /// `None` for a column inserted by this split.
    pub origins: Vec<Option<usize>>,
}

impl LineSplit {
    pub fn column_count(&self) -> usize {
        self.boundaries.len()
    }

    /// Number of columns with non-blank text.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Whether the columns differ from the input boundaries in number or order.
    pub fn reshaped(&self) -> bool {
        self.origins
            .iter()
            .enumerate()
            .any(|(i, origin)| *origin != Some(i))
    }

    /// Re-lay a row collected against the input boundaries onto this split's
    /// columns, leaving inserted columns empty.
    pub fn realign(&self, row: &[String]) -> Vec<String> {
        self.origins
            .iter()
            .map(|origin| {
                origin
                    .and_then(|i| row.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Working state of one column during a split.
struct Column {
    boundary: ColumnBoundary,
    origin: Option<usize>,
    text: String,
}

impl Column {
    fn new(boundary: ColumnBoundary, origin: Option<usize>) -> Self {
        Self {
            boundary,
            origin,
            text: String::new(),
        }
    }

    /// Append the glyph's text verbatim; word spacing comes from space glyphs.
    fn push(&mut self, glyph: &PositionedGlyph) {
        self.text.push_str(&glyph.text);
        self.boundary.include(glyph.x, glyph.end_x());
    }
}

/// Split `line` into columns.
///
/// With no `boundaries`, columns are detected from the line itself. With
/// existing boundaries each glyph goes to the boundary whose centre is
/// nearest to the glyph centre, among those covering it within tolerance;
/// matches strictly inside a boundary count half distance. A glyph that
/// fits nowhere opens a new column at its sorted position.
///
/// Matched boundaries widen to cover their glyphs and the result is kept
/// non-overlapping.
pub fn split_line(line: &TextLine, boundaries: &[ColumnBoundary]) -> LineSplit {
    let mut columns: Vec<Column> = if boundaries.is_empty() {
        detect_boundaries(line)
            .into_iter()
            .map(|b| Column::new(b, None))
            .collect()
    } else {
        boundaries
            .iter()
            .enumerate()
            .map(|(i, b)| Column::new(*b, Some(i)))
            .collect()
    };

    let tolerance = (MATCH_WIDTH_RATIO * line.average_glyph_width()).max(MIN_MATCH_TOLERANCE);

    for glyph in &line.glyphs {
        let index = match best_column(&columns, glyph.center_x(), tolerance) {
            Some(index) => index,
            None => {
                let boundary =
                    ColumnBoundary::new(glyph.x - tolerance, glyph.end_x() + tolerance);
                let at = columns.partition_point(|c| c.boundary.start <= boundary.start);
                columns.insert(at, Column::new(boundary, None));
                at
            }
        };
        columns[index].push(glyph);
    }

    // Widening can reorder starts in degenerate layouts; text moves with its boundary.
    columns.sort_by(|a, b| a.boundary.start.total_cmp(&b.boundary.start));

    let mut bounds: Vec<ColumnBoundary> = columns.iter().map(|c| c.boundary).collect();
    resolve_sorted_overlaps(&mut bounds);

    LineSplit {
        boundaries: bounds,
        cells: columns.iter().map(|c| c.text.trim().to_string()).collect(),
        origins: columns.iter().map(|c| c.origin).collect(),
    }
}

fn best_column(columns: &[Column], center: f32, tolerance: f32) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.boundary.covers(center, tolerance))
        .map(|(i, c)| {
            let distance = (c.boundary.center() - center).abs();
            let weight = if c.boundary.contains(center) {
                INSIDE_DISTANCE_WEIGHT
            } else {
                1.0
            };
            (i, distance * weight)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out `cells` at fixed column x positions with glyphs of width 6.
    /// Spaces inside a cell become space glyphs.
    fn make_table_line(cells: &[(&str, f32)]) -> TextLine {
        let char_w = 6.0;
        let mut glyphs = Vec::new();
        for (text, start) in cells {
            let mut x = *start;
            for ch in text.chars() {
                glyphs.push(PositionedGlyph::new(ch.to_string(), x, 100.0, char_w));
                x += char_w;
            }
        }
        glyphs.sort_by(|a, b| a.x.total_cmp(&b.x));
        TextLine::new(100.0, glyphs)
    }

    #[test]
    fn fresh_split_recovers_tokens_in_order() {
        let tokens = ["Cost", "Move", "Range", "Damage", "Notes"];
        let cells: Vec<(&str, f32)> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (*t, 10.0 + i as f32 * 100.0))
            .collect();
        let split = split_line(&make_table_line(&cells), &[]);
        assert_eq!(split.cells, tokens);
        assert_eq!(split.boundaries.len(), tokens.len());
        assert!(split.origins.iter().all(Option::is_none));
    }

    #[test]
    fn ink_narrower_than_advance_keeps_tokens_whole() {
        // 4-unit glyph boxes on a 6-unit advance leave a 2-unit gap between
        // letters of the same word.
        let mut glyphs = Vec::new();
        for (i, token) in ["Cost", "Move", "Range"].iter().enumerate() {
            let mut x = 10.0 + i as f32 * 120.0;
            for ch in token.chars() {
                glyphs.push(PositionedGlyph::new(ch.to_string(), x, 100.0, 4.0));
                x += 6.0;
            }
        }
        let split = split_line(&TextLine::new(100.0, glyphs), &[]);
        assert_eq!(split.boundaries.len(), 3);
        assert_eq!(split.cells, vec!["Cost", "Move", "Range"]);
    }

    #[test]
    fn multi_word_cells_stay_together() {
        let line = make_table_line(&[("Hit Points", 10.0), ("12", 200.0)]);
        let split = split_line(&line, &[]);
        assert_eq!(split.cells, vec!["Hit Points", "12"]);
    }

    #[test]
    fn existing_boundaries_assign_by_position() {
        let boundaries = vec![ColumnBoundary::new(0.0, 60.0), ColumnBoundary::new(180.0, 240.0)];
        let line = make_table_line(&[("Bob", 10.0), ("7", 200.0)]);
        let split = split_line(&line, &boundaries);
        assert_eq!(split.cells, vec!["Bob", "7"]);
        assert_eq!(split.origins, vec![Some(0), Some(1)]);
        assert!(!split.reshaped());
    }

    #[test]
    fn missing_cells_stay_empty() {
        let boundaries = vec![
            ColumnBoundary::new(0.0, 60.0),
            ColumnBoundary::new(100.0, 160.0),
            ColumnBoundary::new(200.0, 260.0),
        ];
        let line = make_table_line(&[("a", 10.0), ("c", 210.0)]);
        let split = split_line(&line, &boundaries);
        assert_eq!(split.cells, vec!["a", "", "c"]);
    }

    #[test]
    fn unmatched_glyph_inserts_column_in_order() {
        let boundaries = vec![ColumnBoundary::new(0.0, 40.0), ColumnBoundary::new(300.0, 340.0)];
        let line = make_table_line(&[("a", 10.0), ("mid", 150.0), ("z", 310.0)]);
        let split = split_line(&line, &boundaries);
        assert_eq!(split.cells, vec!["a", "mid", "z"]);
        assert_eq!(split.origins, vec![Some(0), None, Some(1)]);
        assert!(split.reshaped());

        let old_row = vec!["A".to_string(), "Z".to_string()];
        assert_eq!(split.realign(&old_row), vec!["A", "", "Z"]);
    }

    #[test]
    fn glyph_near_edge_widens_boundary() {
        let boundaries = vec![ColumnBoundary::new(10.0, 40.0)];
        // glyph spans 41..47, centre 44 is within tolerance 4.5 of the end
        let line = make_table_line(&[("x", 41.0)]);
        let split = split_line(&line, &boundaries);
        assert_eq!(split.cells, vec!["x"]);
        assert_eq!(split.boundaries[0].end, 47.0);
    }

    #[test]
    fn inside_match_beats_nearer_outside_match() {
        // Glyph centre 106 is strictly inside the left column (centre 85,
        // distance 21 halved to 10.5) and within tolerance of the right
        // column (centre 125, distance 19).
        let boundaries = vec![ColumnBoundary::new(60.0, 110.0), ColumnBoundary::new(110.0, 140.0)];
        let line = make_table_line(&[("q", 103.0)]);
        let split = split_line(&line, &boundaries);
        assert_eq!(split.cells, vec!["q", ""]);
    }

    #[test]
    fn split_boundaries_never_overlap() {
        let boundaries = vec![ColumnBoundary::new(0.0, 50.0), ColumnBoundary::new(52.0, 100.0)];
        let line = make_table_line(&[("wide text", 20.0), ("b", 80.0)]);
        let split = split_line(&line, &boundaries);
        for pair in split.boundaries.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        assert_eq!(split.cells.len(), split.boundaries.len());
    }

    #[test]
    fn empty_line_keeps_existing_columns() {
        let boundaries = vec![ColumnBoundary::new(0.0, 50.0), ColumnBoundary::new(60.0, 100.0)];
        let split = split_line(&TextLine::new(100.0, Vec::new()), &boundaries);
        assert_eq!(split.cells, vec!["", ""]);
        assert_eq!(split.boundaries, boundaries);
    }
}
