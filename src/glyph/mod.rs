//! Positioned glyphs and the page event stream they are decoded from.
//!
//! A [`GlyphSource`] is the boundary to whatever decodes the document
//! container. It exposes a page count and, per page, the ordered sequence of
//! [`PageEvent`]s the renderer produced. Everything downstream of this module
//! works on [`PositionedGlyph`] and [`TextLine`] only.

pub mod json;
#[cfg(feature = "pdf")]
pub mod pdf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use json::JsonGlyphDocument;
#[cfg(feature = "pdf")]
pub use pdf::PdfiumSource;

/// Errors raised by a glyph collaborator while opening or reading a document.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("renderer error: {0}")]
    Renderer(String),
}

/// Errors raised while reading a single embedded image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("image stream unreadable: {0}")]
    Unreadable(String),

    #[error("image has no data")]
    Empty,

    #[error("image has degenerate dimensions {width}x{height}")]
    Degenerate { width: u32, height: u32 },

    #[error("image of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
}

/// One rendered character as reported by the renderer, in baseline terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEvent {
    pub text: String,
    pub baseline_start_x: f32,
    pub baseline_start_y: f32,
    pub baseline_end_x: f32,
    /// Width of a single space in the current font, used when the glyph's
    /// own advance is zero or negative.
    pub advance_width_fallback: f32,
}

/// One raster image drawn on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEvent {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// An event on a page, in rendering order.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Character(CharacterEvent),
    /// An image, or the error hit while reading it.
    Image(Result<ImageEvent, ImageError>),
}

/// A decoded document that can be walked page by page.
///
/// Pages are addressed by 0-based index; page numbers reported downstream
/// are 1-based.
pub trait GlyphSource {
    /// Number of pages. A failure here means the document is unusable.
    fn page_count(&self) -> Result<usize, SourceError>;

    /// All events on the page at `index`, in rendering order.
    fn page_events(&mut self, index: usize) -> Result<Vec<PageEvent>, SourceError>;
}

impl<S: GlyphSource + ?Sized> GlyphSource for Box<S> {
    fn page_count(&self) -> Result<usize, SourceError> {
        (**self).page_count()
    }

    fn page_events(&mut self, index: usize) -> Result<Vec<PageEvent>, SourceError> {
        (**self).page_events(index)
    }
}

/// A character placed on the page. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedGlyph {
    pub text: String,
    /// Left edge on the baseline.
    pub x: f32,
    /// Baseline Y (bottom-up coordinate system).
    pub y: f32,
    /// Advance width.
    pub width: f32,
}

impl PositionedGlyph {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }

    pub fn end_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Whether the glyph renders only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Build a glyph from a renderer character event.
    ///
    /// Returns `None` for empty text or non-finite coordinates, which carry
    /// no usable geometry.
    pub fn from_event(event: &CharacterEvent) -> Option<Self> {
        if event.text.is_empty()
            || !event.baseline_start_x.is_finite()
            || !event.baseline_start_y.is_finite()
        {
            debug!(text = %event.text, "dropping character with unusable geometry");
            return None;
        }

        let advance = event.baseline_end_x - event.baseline_start_x;
        let width = if advance.is_finite() && advance > 0.0 {
            advance
        } else if event.advance_width_fallback.is_finite() && event.advance_width_fallback > 0.0 {
            event.advance_width_fallback
        } else {
            0.0
        };

        Some(Self::new(
            event.text.clone(),
            event.baseline_start_x,
            event.baseline_start_y,
            width,
        ))
    }
}

/// A reconstructed text line: glyphs sharing a baseline, sorted left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Representative baseline (the first glyph assigned to the line).
    pub y: f32,
    pub glyphs: Vec<PositionedGlyph>,
}

impl TextLine {
    pub fn new(y: f32, glyphs: Vec<PositionedGlyph>) -> Self {
        Self { y, glyphs }
    }

    /// True when the line has no glyphs or only whitespace glyphs.
    pub fn is_blank(&self) -> bool {
        self.glyphs.iter().all(PositionedGlyph::is_blank)
    }

    /// Mean advance width of the line's glyphs (0 for an empty line).
    pub fn average_glyph_width(&self) -> f32 {
        average_width(&self.glyphs)
    }

    /// Leftmost glyph start.
    pub fn left(&self) -> Option<f32> {
        self.glyphs.iter().map(|g| g.x).reduce(f32::min)
    }

    /// Rightmost glyph end.
    pub fn right(&self) -> Option<f32> {
        self.glyphs.iter().map(PositionedGlyph::end_x).reduce(f32::max)
    }

    /// Concatenated glyph text.
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.text.as_str()).collect()
    }
}

/// Mean advance width of `glyphs`, 0 when empty.
pub(crate) fn average_width(glyphs: &[PositionedGlyph]) -> f32 {
    if glyphs.is_empty() {
        return 0.0;
    }
    glyphs.iter().map(|g| g.width).sum::<f32>() / glyphs.len() as f32
}
