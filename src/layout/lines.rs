//! Line reconstruction from positioned glyphs.

use std::cmp::Ordering;

use crate::glyph::{PositionedGlyph, TextLine};

/// Maximum baseline difference (in layout units) for two glyphs to share a line.
pub const LINE_TOLERANCE: f32 = 2.5;

/// Group one page's glyphs into text lines.
///
/// Glyphs are taken in arrival order. Each joins the line whose anchor
/// baseline (the y of the first glyph assigned to it) is closest and within
/// [`LINE_TOLERANCE`]; otherwise it starts a new line. Anchors never move, so
/// a slow drift of baselines cannot chain unrelated rows together.
///
/// Lines come back top of page first (descending y), glyphs left to right.
pub fn assemble_lines(glyphs: impl IntoIterator<Item = PositionedGlyph>) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();

    for glyph in glyphs {
        let target = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i, (line.y - glyph.y).abs()))
            .filter(|&(_, dy)| dy <= LINE_TOLERANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match target {
            Some((i, _)) => lines[i].glyphs.push(glyph),
            None => lines.push(TextLine::new(glyph.y, vec![glyph])),
        }
    }

    for line in &mut lines {
        line.glyphs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    lines.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal));

    lines
}
