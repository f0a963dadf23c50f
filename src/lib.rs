//! `rulegrid` - Table, diagram and rule extraction from rendered documents
//!
//! # Features
//!
//! - **Line reconstruction**: groups positioned glyphs into baselines
//! - **Column detection**: gap-threshold boundaries that never overlap
//! - **Table assembly**: per-page state machine with drift and blank-row handling
//! - **Atomic rules**: one `[Table on page N] Header: Value; ...` line per data row
//! - **Diagrams**: raw page images, one failure domain per image
//!
//! # Example
//!
//! ```rust,no_run
//! use rulegrid::{CancelFlag, Extractor, JsonGlyphDocument};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut doc = JsonGlyphDocument::from_path("rulebook.json")?;
//!     let result = Extractor::default().extract(&mut doc, &CancelFlag::new());
//!     for rule in &result.atomic_rules {
//!         println!("{rule}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diagram;
pub mod extract;
pub mod glyph;
pub mod layout;
pub mod table;

pub use config::{load_config, load_config_from, ExtractionConfig};
pub use diagram::{capture_diagram, capture_page_diagrams, Diagram};
pub use extract::{
    extract_document_async, open_document, CancelFlag, ExtractionError, ExtractionResult,
    Extractor, PageExtraction,
};
pub use glyph::{
    CharacterEvent, GlyphSource, ImageError, ImageEvent, JsonGlyphDocument, PageEvent,
    PositionedGlyph, SourceError, TextLine,
};
#[cfg(feature = "pdf")]
pub use glyph::PdfiumSource;
pub use layout::{assemble_lines, detect_boundaries, split_line, ColumnBoundary, LineSplit};
pub use table::{assemble_page, generate_rules, RuleOptions, Table, TableAssemblerState};

/// Version of rulegrid
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
