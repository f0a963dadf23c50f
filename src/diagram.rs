//! Raw capture of images drawn on a page.
//!
//! Every image is its own failure domain: a corrupt image is logged and
//! skipped without touching the other images or the page's tables.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::glyph::{ImageError, ImageEvent};

/// Kind recorded for every captured diagram.
pub const IMAGE_KIND: &str = "image";

/// An image captured from a page, bytes as delivered by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    /// 1-based page number.
    pub page_number: usize,
    pub kind: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Check one image event and turn it into a [`Diagram`].
///
/// `max_bytes` caps the payload size when set.
pub fn capture_diagram(
    page_number: usize,
    event: Result<ImageEvent, ImageError>,
    max_bytes: Option<usize>,
) -> Result<Diagram, ImageError> {
    let image = event?;

    if image.data.is_empty() {
        return Err(ImageError::Empty);
    }
    if image.width == 0 || image.height == 0 {
        return Err(ImageError::Degenerate {
            width: image.width,
            height: image.height,
        });
    }
    if let Some(limit) = max_bytes {
        if image.data.len() > limit {
            return Err(ImageError::TooLarge {
                size: image.data.len(),
                limit,
            });
        }
    }

    Ok(Diagram {
        page_number,
        kind: IMAGE_KIND.to_string(),
        width: image.width,
        height: image.height,
        data: image.data,
    })
}

/// Capture every readable image on a page, in event order.
pub fn capture_page_diagrams(
    page_number: usize,
    events: impl IntoIterator<Item = Result<ImageEvent, ImageError>>,
    max_bytes: Option<usize>,
) -> Vec<Diagram> {
    events
        .into_iter()
        .enumerate()
        .filter_map(|(i, event)| match capture_diagram(page_number, event, max_bytes) {
            Ok(diagram) => Some(diagram),
            Err(e) => {
                warn!(page = page_number, image = i, "skipping image: {}", e);
                None
            }
        })
        .collect()
}
