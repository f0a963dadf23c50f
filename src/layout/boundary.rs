//! Column boundary detection.
//!
//! Finds the horizontal bands ("boundaries") a single text line splits into
//! when nothing is known about its layout yet. The algorithm:
//!
//! 1. Measure the positive gaps between consecutive glyphs
//! 2. Derive a gap threshold from the local spacing statistics
//! 3. Sweep left to right, closing a band at every gap above the threshold
//!    and splitting a band where glyphs visibly overprint each other
//! 4. Pad every band outward to absorb jitter, then force the bands apart so
//!    they never overlap
//!
//! The ratios below are empirically tuned against real rulebook pages and are
//! kept exactly as measured.

use crate::glyph::{average_width, PositionedGlyph, TextLine};

/// Lower bound for the baseline spacing estimate.
const MIN_BASELINE_SPACING: f32 = 6.0;
/// Baseline spacing as a multiple of the average glyph width.
const BASELINE_WIDTH_RATIO: f32 = 2.0;
/// Gaps up to this multiple of the baseline count as "small".
const SMALL_GAP_RATIO: f32 = 1.75;
/// Threshold as a multiple of the mean small gap.
const SMALL_GAP_MEAN_RATIO: f32 = 1.5;
/// Threshold as a multiple of the median or minimum gap when small gaps are scarce.
const SPARSE_GAP_RATIO: f32 = 0.9;
/// Upper clamp of the threshold as a multiple of the baseline.
const MAX_THRESHOLD_RATIO: f32 = 4.0;
/// Lower bound for how far glyphs may overprint before a band is split.
const MIN_OVERLAP_TOLERANCE: f32 = 1.5;
/// Overprint tolerance as a multiple of the average glyph width.
const OVERLAP_WIDTH_RATIO: f32 = 0.6;
/// Lower bound for the outward padding of each band.
const MIN_PADDING: f32 = 2.0;
/// Padding as a fraction of the gap threshold.
const PADDING_THRESHOLD_DIVISOR: f32 = 3.0;

/// Horizontal extent of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBoundary {
    pub start: f32,
    pub end: f32,
}

impl ColumnBoundary {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Zero-width boundary at `x`.
    pub fn point(x: f32) -> Self {
        Self { start: x, end: x }
    }

    pub fn center(&self) -> f32 {
        (self.start + self.end) / 2.0
    }

    /// Whether `x` lies strictly inside the boundary.
    pub fn contains(&self, x: f32) -> bool {
        x > self.start && x < self.end
    }

    /// Whether `x` lies within the boundary widened by `tolerance` on both sides.
    pub fn covers(&self, x: f32, tolerance: f32) -> bool {
        x >= self.start - tolerance && x <= self.end + tolerance
    }

    /// Grow the boundary to include `[start, end]`.
    pub fn include(&mut self, start: f32, end: f32) {
        self.start = self.start.min(start);
        self.end = self.end.max(end);
    }
}

/// Gap above which two neighbouring glyphs belong to different columns.
///
/// Glyphs are expected in left-to-right order.
pub fn gap_threshold(glyphs: &[PositionedGlyph]) -> f32 {
    let baseline = (BASELINE_WIDTH_RATIO * average_width(glyphs)).max(MIN_BASELINE_SPACING);
    if glyphs.len() < 2 {
        return baseline;
    }

    let gaps: Vec<f32> = glyphs
        .windows(2)
        .map(|pair| pair[1].x - pair[0].end_x())
        .filter(|gap| *gap > 0.0)
        .collect();
    let small: Vec<f32> = gaps
        .iter()
        .copied()
        .filter(|gap| *gap <= SMALL_GAP_RATIO * baseline)
        .collect();

    let raw = if small.len() >= 2 {
        SMALL_GAP_MEAN_RATIO * mean(&small)
    } else if small.len() == 1 && gaps.len() >= 2 {
        SPARSE_GAP_RATIO * median(&gaps)
    } else if let Some(min) = gaps.iter().copied().reduce(f32::min) {
        SPARSE_GAP_RATIO * min
    } else {
        baseline
    };

    raw.clamp(baseline, MAX_THRESHOLD_RATIO * baseline)
}

/// Partition a line's glyphs into ordered, non-overlapping column boundaries.
///
/// Returns an empty list for a line without glyphs. Never fails: the worst
/// case is a single boundary spanning the whole line.
pub fn detect_boundaries(line: &TextLine) -> Vec<ColumnBoundary> {
    let Some((first, rest)) = line.glyphs.split_first() else {
        return Vec::new();
    };

    let threshold = gap_threshold(&line.glyphs);
    let overlap_tolerance =
        (OVERLAP_WIDTH_RATIO * line.average_glyph_width()).max(MIN_OVERLAP_TOLERANCE);

    let mut boundaries = Vec::new();
    let mut current = ColumnBoundary::new(first.x, first.end_x());

    for glyph in rest {
        let gap = glyph.x - current.end;
        if gap > threshold {
            boundaries.push(current);
            current = ColumnBoundary::new(glyph.x, glyph.end_x());
        } else if gap < -overlap_tolerance {
            // Overprinted text: cut the running band where the two runs meet.
            let split = (current.end + glyph.x) / 2.0;
            boundaries.push(ColumnBoundary::new(current.start.min(split), split));
            current = ColumnBoundary::new(split, glyph.end_x().max(split));
        } else {
            current.include(glyph.x, glyph.end_x());
        }
    }
    boundaries.push(current);

    let padding = (threshold / PADDING_THRESHOLD_DIVISOR).max(MIN_PADDING);
    for boundary in &mut boundaries {
        boundary.start -= padding;
        boundary.end += padding;
    }

    enforce_non_overlap(&mut boundaries);
    boundaries
}

/// Sort boundaries by start and push overlapping neighbours apart.
///
/// Afterwards `boundaries[i].end <= boundaries[i + 1].start` for every
/// adjacent pair and every boundary has `start <= end`.
pub fn enforce_non_overlap(boundaries: &mut [ColumnBoundary]) {
    boundaries.sort_by(|a, b| a.start.total_cmp(&b.start));
    resolve_sorted_overlaps(boundaries);
}

/// Overlap resolution for boundaries already ordered by start.
pub(crate) fn resolve_sorted_overlaps(boundaries: &mut [ColumnBoundary]) {
    for i in 1..boundaries.len() {
        let (head, tail) = boundaries.split_at_mut(i);
        let prev = &mut head[i - 1];
        let next = &mut tail[0];

        if prev.end > next.start {
            let mid = (prev.end + next.start) / 2.0;
            prev.end = mid;
            next.start = mid;
            if prev.start > prev.end {
                *prev = ColumnBoundary::point(mid);
            }
            if next.start > next.end {
                *next = ColumnBoundary::point(mid);
            }
        }
    }

    // A clamped boundary can reach back past its left neighbour; a single
    // monotone sweep restores the ordering.
    for i in 1..boundaries.len() {
        let floor = boundaries[i - 1].end;
        let boundary = &mut boundaries[i];
        if boundary.start < floor {
            boundary.start = floor;
        }
        if boundary.end < boundary.start {
            boundary.end = boundary.start;
        }
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
