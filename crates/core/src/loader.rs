//! Loading the slides document produced by deck extraction.

use crate::error::Result;
use crate::types::Slide;
use std::path::Path;

/// Parse a slides document (a JSON array of slides).
pub fn parse_slides(json: &str) -> Result<Vec<Slide>> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a slides document from disk.
pub fn load_slides(path: impl AsRef<Path>) -> Result<Vec<Slide>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_slides(&content)
}

/// Read a slides document, treating any failure as an empty deck.
pub fn load_slides_or_empty(path: impl AsRef<Path>) -> Vec<Slide> {
    let path = path.as_ref();
    match load_slides(path) {
        Ok(slides) => {
            log::debug!("Loaded {} slides from {}", slides.len(), path.display());
            slides
        }
        Err(e) => {
            log::error!("Error loading slides data from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
