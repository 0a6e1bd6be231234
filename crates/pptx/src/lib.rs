//! PPTX (Office Open XML) extraction backend.
//!
//! Reads .pptx files, which are ZIP archives containing XML documents, and
//! produces the slides document (text per shape plus extracted images)
//! consumed by milestone extraction. Extracted images can then be
//! recompressed for the web.

pub mod compress;
pub mod deck;
pub mod naming;
pub mod parser;

pub use compress::{CompressionReport, ImageCompressor};
pub use deck::{write_slides_document, ExtractedDeck, ExtractedImage, IMAGES_DIR, SLIDES_FILE};
pub use naming::sanitize_filename;
pub use parser::DeckExtractor;
