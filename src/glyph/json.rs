//! JSON-encoded glyph documents.
//!
//! Lets a renderer running out of process (or a test fixture) hand over its
//! page events as a plain JSON file:
//!
//! ```json
//! { "pages": [ { "events": [
//!     { "type": "character", "text": "A", "baseline_start_x": 72.0,
//!       "baseline_start_y": 700.0, "baseline_end_x": 78.0,
//!       "advance_width_fallback": 3.0 },
//!     { "type": "image", "width": 2, "height": 1, "data": [137, 80] },
//!     { "type": "image_error", "reason": "truncated stream" }
//! ] } ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CharacterEvent, GlyphSource, ImageError, ImageEvent, PageEvent, SourceError};

/// A whole document of page events, fully loaded in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonGlyphDocument {
    #[serde(default)]
    pub pages: Vec<JsonPage>,
}

/// Events for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonPage {
    #[serde(default)]
    pub events: Vec<JsonEvent>,
}

/// Wire form of a [`PageEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonEvent {
    Character(CharacterEvent),
    Image {
        width: u32,
        height: u32,
        #[serde(default)]
        data: Vec<u8>,
    },
    ImageError {
        reason: String,
    },
}

impl From<&JsonEvent> for PageEvent {
    fn from(event: &JsonEvent) -> Self {
        match event {
            JsonEvent::Character(ch) => PageEvent::Character(ch.clone()),
            JsonEvent::Image {
                width,
                height,
                data,
            } => PageEvent::Image(Ok(ImageEvent {
                data: data.clone(),
                width: *width,
                height: *height,
            })),
            JsonEvent::ImageError { reason } => {
                PageEvent::Image(Err(ImageError::Unreadable(reason.clone())))
            }
        }
    }
}

impl JsonGlyphDocument {
    /// Read and parse a document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SourceError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GlyphSource for JsonGlyphDocument {
    fn page_count(&self) -> Result<usize, SourceError> {
        Ok(self.pages.len())
    }

    fn page_events(&mut self, index: usize) -> Result<Vec<PageEvent>, SourceError> {
        let page = self.pages.get(index).ok_or(SourceError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })?;
        Ok(page.events.iter().map(PageEvent::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "pages": [
            { "events": [
                { "type": "character", "text": "A", "baseline_start_x": 72.0,
                  "baseline_start_y": 700.0, "baseline_end_x": 78.0,
                  "advance_width_fallback": 3.0 },
                { "type": "image", "width": 4, "height": 2, "data": [1, 2, 3] },
                { "type": "image_error", "reason": "truncated stream" }
            ] },
            {}
        ]
    }"#;

    #[test]
    fn parses_all_event_kinds() {
        let mut doc = JsonGlyphDocument::from_json(DOC).unwrap();
        assert_eq!(doc.page_count().unwrap(), 2);

        let events = doc.page_events(0).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], PageEvent::Character(c) if c.text == "A"));
        assert!(matches!(
            &events[1],
            PageEvent::Image(Ok(ImageEvent { width: 4, height: 2, .. }))
        ));
        assert_eq!(
            events[2],
            PageEvent::Image(Err(ImageError::Unreadable("truncated stream".into())))
        );

        assert!(doc.page_events(1).unwrap().is_empty());
    }

    #[test]
    fn page_out_of_range_is_an_error() {
        let mut doc = JsonGlyphDocument::from_json(DOC).unwrap();
        let err = doc.page_events(5).unwrap_err();
        assert!(matches!(err, SourceError::PageOutOfRange { index: 5, count: 2 }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = JsonGlyphDocument::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = JsonGlyphDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }
}
