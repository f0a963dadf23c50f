//! Document-level extraction: walk a [`GlyphSource`] page by page and
//! collect tables, diagrams and atomic rules.
//!
//! Failure is all-or-nothing. An unreadable document, a page the source
//! cannot deliver, or a cancellation yields [`ExtractionResult::failure`]
//! and nothing from the pages already processed. Only a broken image is
//! tolerated, and only that image is dropped.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::diagram::{capture_page_diagrams, Diagram};
use crate::glyph::{GlyphSource, JsonGlyphDocument, PageEvent, PositionedGlyph, SourceError};
use crate::layout::assemble_lines;
use crate::table::{assemble_page, generate_rules, Table};

/// Why a document could not be extracted.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("cannot open document: {0}")]
    Input(#[source] SourceError),

    #[error("failed on page {page}: {source}")]
    Document { page: usize, source: SourceError },

    #[error("extraction cancelled")]
    Cancelled,
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    /// Set only when `success` is false.
    pub error_message: Option<String>,
    pub tables: Vec<Table>,
    pub diagrams: Vec<Diagram>,
    pub atomic_rules: Vec<String>,
    /// Pages processed (0 on failure).
    pub page_count: usize,
    /// Wall time of the extraction in milliseconds (0 on failure).
    pub elapsed_ms: f64,
}

impl ExtractionResult {
    /// A failed extraction carrying only its error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// All tables as markdown, each preceded by a `<!-- page N -->` marker.
    pub fn tables_markdown(&self) -> String {
        self.tables
            .iter()
            .map(|t| format!("<!-- page {} -->\n{}", t.page_number, t.to_markdown()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What one page contributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageExtraction {
    pub tables: Vec<Table>,
    pub diagrams: Vec<Diagram>,
    pub atomic_rules: Vec<String>,
}

/// Cooperative cancellation handle, checked before each page.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs extraction with a fixed configuration. Holds no per-document state,
/// so one instance can serve any number of documents concurrently.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract every page of `source`, in page order.
    pub fn extract<S: GlyphSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancelFlag,
    ) -> ExtractionResult {
        let start = Instant::now();
        match self.try_extract(source, cancel) {
            Ok(mut result) => {
                result.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                info!(
                    pages = result.page_count,
                    tables = result.tables.len(),
                    diagrams = result.diagrams.len(),
                    rules = result.atomic_rules.len(),
                    elapsed_ms = result.elapsed_ms,
                    "extracted document"
                );
                result
            }
            Err(e) => {
                warn!("document extraction failed: {}", e);
                ExtractionResult::failure(e.to_string())
            }
        }
    }

    /// Open a document from disk and extract it.
    pub fn extract_path(&self, path: &Path, cancel: &CancelFlag) -> ExtractionResult {
        match open_document(path) {
            Ok(mut source) => self.extract(source.as_mut(), cancel),
            Err(e) => {
                let error = ExtractionError::Input(e);
                warn!("document extraction failed: {}", error);
                ExtractionResult::failure(error.to_string())
            }
        }
    }

    /// Tables, diagrams and rules for one page's events.
    pub fn extract_page(&self, page_number: usize, events: Vec<PageEvent>) -> PageExtraction {
        let mut glyphs = Vec::new();
        let mut images = Vec::new();
        for event in events {
            match event {
                PageEvent::Character(ch) => glyphs.extend(PositionedGlyph::from_event(&ch)),
                PageEvent::Image(image) => images.push(image),
            }
        }

        let lines = assemble_lines(glyphs);
        let tables = assemble_page(page_number, &lines);

        let atomic_rules = if self.config.atomic_rules {
            let options = self.config.rule_options();
            tables.iter().flat_map(|t| generate_rules(t, options)).collect()
        } else {
            Vec::new()
        };

        let diagrams = if self.config.capture_diagrams {
            capture_page_diagrams(page_number, images, self.config.max_diagram_bytes)
        } else {
            Vec::new()
        };

        debug!(
            page = page_number,
            lines = lines.len(),
            tables = tables.len(),
            diagrams = diagrams.len(),
            "processed page"
        );

        PageExtraction {
            tables,
            diagrams,
            atomic_rules,
        }
    }

    fn try_extract<S: GlyphSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancelFlag,
    ) -> Result<ExtractionResult, ExtractionError> {
        let page_count = source.page_count().map_err(ExtractionError::Input)?;
        let mut result = ExtractionResult {
            success: true,
            page_count,
            ..ExtractionResult::default()
        };

        for index in 0..page_count {
            if cancel.is_cancelled() {
                return Err(ExtractionError::Cancelled);
            }
            let page_number = index + 1;
            let events = source
                .page_events(index)
                .map_err(|source| ExtractionError::Document {
                    page: page_number,
                    source,
                })?;

            let page = self.extract_page(page_number, events);
            result.tables.extend(page.tables);
            result.diagrams.extend(page.diagrams);
            result.atomic_rules.extend(page.atomic_rules);
        }

        Ok(result)
    }
}

/// Open a document from disk.
///
/// Files ending in `.pdf` are decoded with pdfium when the `pdf` feature is
/// enabled; anything else is read as a JSON glyph document.
pub fn open_document(path: &Path) -> Result<Box<dyn GlyphSource + Send>, SourceError> {
    #[cfg(feature = "pdf")]
    {
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            return Ok(Box::new(crate::glyph::PdfiumSource::from_path(path)?));
        }
    }
    Ok(Box::new(JsonGlyphDocument::from_path(path)?))
}

/// Run [`Extractor::extract`] on the blocking thread pool.
///
/// A task that panics or is aborted yields a failure result.
pub async fn extract_document_async<S>(
    extractor: Extractor,
    mut source: S,
    cancel: CancelFlag,
) -> ExtractionResult
where
    S: GlyphSource + Send + 'static,
{
    match tokio::task::spawn_blocking(move || extractor.extract(&mut source, &cancel)).await {
        Ok(result) => result,
        Err(e) => {
            warn!("extraction task failed: {}", e);
            ExtractionResult::failure(format!("extraction task failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{CharacterEvent, ImageError, ImageEvent};

    const CHAR_W: f32 = 6.0;

    fn text_events(cells: &[(&str, f32)], y: f32) -> Vec<PageEvent> {
        let mut events = Vec::new();
        for (text, start) in cells {
            let mut x = *start;
            for ch in text.chars() {
                events.push(PageEvent::Character(CharacterEvent {
                    text: ch.to_string(),
                    baseline_start_x: x,
                    baseline_start_y: y,
                    baseline_end_x: x + CHAR_W,
                    advance_width_fallback: 3.0,
                }));
                x += CHAR_W;
            }
        }
        events
    }

    fn score_table() -> Vec<PageEvent> {
        let mut events = text_events(&[("Name", 72.0), ("Score", 200.0)], 700.0);
        events.extend(text_events(&[("Alice", 72.0), ("10", 200.0)], 688.0));
        events.extend(text_events(&[("Bob", 72.0), ("7", 200.0)], 676.0));
        events
    }

    struct Pages {
        pages: Vec<Vec<PageEvent>>,
        fail_on: Option<usize>,
    }

    impl GlyphSource for Pages {
        fn page_count(&self) -> Result<usize, SourceError> {
            Ok(self.pages.len())
        }

        fn page_events(&mut self, index: usize) -> Result<Vec<PageEvent>, SourceError> {
            if self.fail_on == Some(index) {
                return Err(SourceError::Renderer("stream ended early".into()));
            }
            Ok(self.pages[index].clone())
        }
    }

    #[test]
    fn page_yields_table_and_rules() {
        let page = Extractor::default().extract_page(2, score_table());
        assert_eq!(page.tables.len(), 1);
        assert_eq!(
            page.atomic_rules,
            vec![
                "[Table on page 2] Name: Alice; Score: 10",
                "[Table on page 2] Name: Bob; Score: 7",
            ]
        );
    }

    #[test]
    fn rules_and_diagrams_can_be_disabled() {
        let mut events = score_table();
        events.push(PageEvent::Image(Ok(ImageEvent {
            data: vec![1],
            width: 1,
            height: 1,
        })));
        let config = ExtractionConfig::default()
            .with_atomic_rules(false)
            .with_capture_diagrams(false);
        let page = Extractor::new(config).extract_page(1, events);
        assert_eq!(page.tables.len(), 1);
        assert!(page.atomic_rules.is_empty());
        assert!(page.diagrams.is_empty());
    }

    #[test]
    fn pages_are_numbered_from_one() {
        let mut source = Pages {
            pages: vec![Vec::new(), score_table()],
            fail_on: None,
        };
        let result = Extractor::default().extract(&mut source, &CancelFlag::new());
        assert!(result.success);
        assert_eq!(result.page_count, 2);
        assert_eq!(result.tables[0].page_number, 2);
    }

    #[test]
    fn page_failure_discards_everything() {
        let mut source = Pages {
            pages: vec![score_table(), score_table()],
            fail_on: Some(1),
        };
        let result = Extractor::default().extract(&mut source, &CancelFlag::new());
        assert!(!result.success);
        assert!(result.tables.is_empty());
        assert!(result.atomic_rules.is_empty());
        assert_eq!(result.page_count, 0);
        let message = result.error_message.unwrap();
        assert!(message.contains("page 2"), "{message}");
    }

    #[test]
    fn cancelled_before_first_page() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut source = Pages {
            pages: vec![score_table()],
            fail_on: None,
        };
        let result = Extractor::default().extract(&mut source, &cancel);
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("extraction cancelled"));
    }

    #[test]
    fn failure_shape() {
        let result = ExtractionResult::failure("boom");
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("boom"));
        assert!(result.tables.is_empty() && result.diagrams.is_empty());
        assert_eq!(result.elapsed_ms, 0.0);
    }

    #[test]
    fn markdown_marks_each_table_page() {
        let mut source = Pages {
            pages: vec![score_table(), score_table()],
            fail_on: None,
        };
        let md = Extractor::default()
            .extract(&mut source, &CancelFlag::new())
            .tables_markdown();
        assert!(md.starts_with("<!-- page 1 -->\n| Name | Score |"));
        assert!(md.contains("<!-- page 2 -->"));
        assert!(md.contains("| Bob | 7 |"));
    }

    #[test]
    fn missing_file_is_input_failure() {
        let result = Extractor::default()
            .extract_path(Path::new("/no/such/document.json"), &CancelFlag::new());
        assert!(!result.success);
        assert!(result
            .error_message
            .unwrap()
            .starts_with("cannot open document"));
    }

    #[test]
    fn broken_image_only_drops_itself() {
        let mut events = score_table();
        events.push(PageEvent::Image(Err(ImageError::Unreadable("bad".into()))));
        let page = Extractor::default().extract_page(1, events);
        assert!(page.diagrams.is_empty());
        assert_eq!(page.tables.len(), 1);
    }
}
