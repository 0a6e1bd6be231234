//! Web compression for extracted slide images.
//!
//! Images are flattened onto white, shrunk to fit a bounding box, and
//! re-encoded. PNGs that compress much better as JPEG are replaced by a
//! `.jpg`, and the slides document is rewritten to point at the new files.

use crate::deck::{write_slides_document, IMAGES_DIR, SLIDES_FILE};
use deck_core::{load_slides, Error, Result, Slide};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{self, CompressionType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Encoded image formats handled by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Detect the format from a file extension (`png`, `jpg`, `jpeg`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Extension used when a file is converted to this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Result of compressing a single file.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// Where the compressed image now lives (may differ from the input).
    pub path: PathBuf,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

/// Summary of a directory compression run.
#[derive(Debug, Clone, Default)]
pub struct CompressionReport {
    pub processed: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub compressed_bytes: u64,

    /// Old filename to new filename, for PNGs converted to JPEG.
    pub renamed: HashMap<String, String>,
}

impl CompressionReport {
    /// Size reduction across all processed images, in percent.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (self.original_bytes as f64 - self.compressed_bytes as f64) / self.original_bytes as f64 * 100.0
    }
}

/// Re-encodes images for the web.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    /// JPEG quality (1-100).
    quality: u8,
    /// Maximum width and height in pixels.
    max_dimension: u32,
    /// A PNG is replaced when its JPEG is smaller than this fraction of it.
    jpeg_switch_ratio: f64,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self {
            quality: 85,
            max_dimension: 1920,
            jpeg_switch_ratio: 0.7,
        }
    }
}

impl ImageCompressor {
    /// Create a compressor with quality 85 and a 1920px bounding box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JPEG quality (clamped to 1-100).
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Set the maximum width and height.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    /// Set the size ratio below which a PNG is converted to JPEG.
    pub fn with_jpeg_switch_ratio(mut self, ratio: f64) -> Self {
        self.jpeg_switch_ratio = ratio;
        self
    }

    /// Compress the images of an extraction output directory and update its
    /// slides document for any renamed files.
    pub fn compress_extracted(&self, output_dir: &Path) -> Result<CompressionReport> {
        let report = self.compress_dir(&output_dir.join(IMAGES_DIR))?;

        let json_path = output_dir.join(SLIDES_FILE);
        if !report.renamed.is_empty() && json_path.exists() {
            let mut slides = load_slides(&json_path)?;
            if apply_renames(&mut slides, &report.renamed) {
                write_slides_document(output_dir, &slides)?;
                log::info!("Updated {} with new image filenames", json_path.display());
            }
        }

        Ok(report)
    }

    /// Compress every PNG and JPEG in a directory.
    ///
    /// Files that fail to decode or encode are logged and counted, not fatal.
    pub fn compress_dir(&self, images_dir: &Path) -> Result<CompressionReport> {
        let mut paths: Vec<PathBuf> = fs::read_dir(images_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| OutputFormat::from_path(path).is_some())
            .collect();
        paths.sort();

        log::debug!("Found {} images to compress in {}", paths.len(), images_dir.display());

        let mut report = CompressionReport::default();

        for path in paths {
            match self.compress_file(&path) {
                Ok(compressed) => {
                    report.processed += 1;
                    report.original_bytes += compressed.original_bytes;
                    report.compressed_bytes += compressed.compressed_bytes;

                    if compressed.path != path {
                        if let (Some(old), Some(new)) = (file_name(&path), file_name(&compressed.path)) {
                            report.renamed.insert(old, new);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Error compressing {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Compress a single file in place, or replace it with a `.jpg`.
    pub fn compress_file(&self, path: &Path) -> Result<CompressedImage> {
        let input_format = OutputFormat::from_path(path)
            .ok_or_else(|| Error::ImageError(format!("Unsupported image type: {}", path.display())))?;

        let data = fs::read(path)?;
        let (encoded, format) = self.compress_bytes(&data, input_format)?;

        let output_path = if format == input_format {
            path.to_path_buf()
        } else {
            path.with_extension(format.extension())
        };

        fs::write(&output_path, &encoded)?;
        if output_path != path {
            fs::remove_file(path)?;
        }

        Ok(CompressedImage {
            path: output_path,
            original_bytes: data.len() as u64,
            compressed_bytes: encoded.len() as u64,
        })
    }

    /// Re-encode image bytes, returning the new bytes and their format.
    pub fn compress_bytes(&self, data: &[u8], input_format: OutputFormat) -> Result<(Vec<u8>, OutputFormat)> {
        let img = image::load_from_memory(data).map_err(|e| Error::ImageError(e.to_string()))?;
        let rgb = self.fit(flatten_to_rgb(&img));
        let jpeg = self.encode_jpeg(&rgb)?;

        match input_format {
            OutputFormat::Jpeg => Ok((jpeg, OutputFormat::Jpeg)),
            OutputFormat::Png => {
                let png = encode_png(&rgb)?;
                if (jpeg.len() as f64) < png.len() as f64 * self.jpeg_switch_ratio {
                    Ok((jpeg, OutputFormat::Jpeg))
                } else {
                    Ok((png, OutputFormat::Png))
                }
            }
        }
    }

    /// Shrink to fit the bounding box, keeping the aspect ratio.
    fn fit(&self, rgb: RgbImage) -> RgbImage {
        if rgb.width() <= self.max_dimension && rgb.height() <= self.max_dimension {
            return rgb;
        }
        let (width, height) = rgb.dimensions();
        let resized = DynamicImage::ImageRgb8(rgb)
            .resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
            .to_rgb8();
        log::debug!("Resized: {}x{} -> {}x{}", width, height, resized.width(), resized.height());
        resized
    }

    fn encode_jpeg(&self, rgb: &RgbImage) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| Error::ImageError(e.to_string()))?;
        Ok(buf)
    }
}

fn encode_png(rgb: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, png::FilterType::Adaptive)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| Error::ImageError(e.to_string()))?;
    Ok(buf)
}

/// Drop transparency by compositing onto a white background.
fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Point slide images at renamed files, keeping each path's directory.
///
/// Returns whether any image was updated.
pub fn apply_renames(slides: &mut [Slide], renamed: &HashMap<String, String>) -> bool {
    let mut updated = false;

    for slide_image in slides.iter_mut().flat_map(|slide| slide.images.iter_mut()) {
        let Some(new_name) = renamed.get(&slide_image.filename) else {
            continue;
        };

        let new_ext = new_name.rsplit('.').next().unwrap_or_default();
        let stem = slide_image
            .path
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(slide_image.path.as_str());
        let new_path = format!("{}.{}", stem, new_ext);

        slide_image.path = new_path;
        slide_image.filename = new_name.clone();
        updated = true;
    }

    updated
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(String::from)
}
