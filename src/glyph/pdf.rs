//! PDF glyph source backed by `pdfium-render` (Chromium's PDF library).
//!
//! Pdfium documents borrow the library binding, so the whole document is
//! decoded up front into per-page event lists. A page whose text layer fails
//! to load keeps its error and reports it when that page is requested.
//!
//! ```text
//! PDF bytes → pdfium chars + image objects → PageEvent lists
//! ```

use pdfium_render::prelude::*;

use super::{CharacterEvent, GlyphSource, ImageError, ImageEvent, PageEvent, SourceError};

/// Fraction of a glyph's height used as its width when pdfium reports a
/// zero-width box (spaces, combining marks).
const FALLBACK_WIDTH_RATIO: f32 = 0.25;

/// A PDF decoded into page events.
pub struct PdfiumSource {
    pages: Vec<Result<Vec<PageEvent>, String>>,
}

impl PdfiumSource {
    /// Decode a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SourceError> {
        let pdfium = Pdfium::default();
        let doc = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| SourceError::Renderer(format!("failed to parse PDF: {e}")))?;

        let pages = doc
            .pages()
            .iter()
            .map(|page| Self::page_events_of(&page).map_err(|e| e.to_string()))
            .collect();

        Ok(Self { pages })
    }

    /// Read a PDF from disk.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    #[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
    fn page_events_of(page: &PdfPage) -> Result<Vec<PageEvent>, PdfiumError> {
        let mut events = Vec::new();

        let text = page.text()?;
        for ch in text.chars().iter() {
            if let (Some(unicode_ch), Ok(rect)) = (ch.unicode_char(), ch.tight_bounds()) {
                // Tight bounds cover the ink only, so the end is short of the
                // advance and letters of one word show small positive gaps.
                let height = (rect.top.value - rect.bottom.value).abs();
                events.push(PageEvent::Character(CharacterEvent {
                    text: unicode_ch.to_string(),
                    baseline_start_x: rect.left.value,
                    baseline_start_y: rect.bottom.value,
                    baseline_end_x: rect.right.value,
                    advance_width_fallback: height * FALLBACK_WIDTH_RATIO,
                }));
            }
        }

        for object in page.objects().iter() {
            if let Some(image) = object.as_image_object() {
                let event = image
                    .get_raw_image()
                    .map(|raw| ImageEvent {
                        width: raw.width(),
                        height: raw.height(),
                        data: raw.into_bytes(),
                    })
                    .map_err(|e| ImageError::Unreadable(e.to_string()));
                events.push(PageEvent::Image(event));
            }
        }

        Ok(events)
    }
}

impl GlyphSource for PdfiumSource {
    fn page_count(&self) -> Result<usize, SourceError> {
        Ok(self.pages.len())
    }

    fn page_events(&mut self, index: usize) -> Result<Vec<PageEvent>, SourceError> {
        match self.pages.get(index) {
            Some(Ok(events)) => Ok(events.clone()),
            Some(Err(e)) => Err(SourceError::Renderer(format!(
                "failed to extract page {}: {e}",
                index + 1
            ))),
            None => Err(SourceError::PageOutOfRange {
                index,
                count: self.pages.len(),
            }),
        }
    }
}
