//! The result of extracting a deck and writing it to disk.

use deck_core::{Result, Slide};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory (under the output directory) that receives image files.
pub const IMAGES_DIR: &str = "images";

/// Name of the slides document written to the output directory.
pub const SLIDES_FILE: &str = "slides_data.json";

/// Image bytes pulled out of the deck, keyed by output filename.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Slides plus the image files they reference.
#[derive(Debug, Clone, Default)]
pub struct ExtractedDeck {
    /// Slides in deck order.
    pub slides: Vec<Slide>,

    /// Image payloads, one per `SlideImage` across all slides.
    pub images: Vec<ExtractedImage>,
}

impl ExtractedDeck {
    /// Total number of images across all slides.
    pub fn image_count(&self) -> usize {
        self.slides.iter().map(|s| s.images.len()).sum()
    }

    /// Write images and the slides document under `output_dir`.
    ///
    /// Returns the path of the written slides document.
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        let images_dir = output_dir.join(IMAGES_DIR);
        fs::create_dir_all(&images_dir)?;

        for image in &self.images {
            fs::write(images_dir.join(&image.filename), &image.data)?;
        }

        let json_path = write_slides_document(output_dir, &self.slides)?;

        log::debug!(
            "Wrote {} slides and {} images to {}",
            self.slides.len(),
            self.images.len(),
            output_dir.display()
        );

        Ok(json_path)
    }
}

/// Write `slides` as the pretty-printed slides document under `output_dir`.
pub fn write_slides_document(output_dir: &Path, slides: &[Slide]) -> Result<PathBuf> {
    let json_path = output_dir.join(SLIDES_FILE);
    let json = serde_json::to_string_pretty(slides)?;
    fs::write(&json_path, json)?;
    Ok(json_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::SlideImage;

    #[test]
    fn test_write_to_creates_document_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let deck = ExtractedDeck {
            slides: vec![Slide::new(1)
                .with_text("2019 drive")
                .with_image(SlideImage::new("slide_01_image_00.png", "images/slide_01_image_00.png", 0))],
            images: vec![ExtractedImage {
                filename: "slide_01_image_00.png".to_string(),
                data: vec![1, 2, 3],
            }],
        };

        let json_path = deck.write_to(dir.path()).unwrap();

        assert_eq!(json_path, dir.path().join(SLIDES_FILE));
        assert_eq!(
            fs::read(dir.path().join("images/slide_01_image_00.png")).unwrap(),
            vec![1, 2, 3]
        );

        let slides = deck_core::load_slides(&json_path).unwrap();
        assert_eq!(slides, deck.slides);
        assert_eq!(deck.image_count(), 1);
    }
}
