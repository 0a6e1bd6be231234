//! CLI tool for extracting slide decks and building milestone timelines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_core::milestones::DEFAULT_YEAR_RANGE;
use deck_core::{load_slides_or_empty, site_statistics, MilestoneExtractor};
use deck_pptx::{DeckExtractor, ImageCompressor};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Default name of the extraction output directory.
const DEFAULT_OUTPUT_DIR: &str = "extracted_content";

/// Extract slide decks and turn them into year-by-year milestones.
#[derive(Parser, Debug)]
#[command(name = "deck-timeline")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text and images from a .pptx deck into a slides document
    Extract {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// Output directory (default: extracted_content next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Group a slides document into year-based milestones
    Milestones {
        /// Slides document (slides_data.json)
        input: PathBuf,

        /// Earliest year accepted from a slide's own text
        #[arg(long, default_value_t = *DEFAULT_YEAR_RANGE.start())]
        min_year: u32,

        /// Latest year accepted from a slide's own text
        #[arg(long, default_value_t = *DEFAULT_YEAR_RANGE.end())]
        max_year: u32,

        /// Write JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the site's headline statistics from a slides document
    Stats {
        /// Slides document (slides_data.json)
        input: PathBuf,
    },

    /// Compress extracted images for the web and update the slides document
    Compress {
        /// Extraction output directory (holds images/ and slides_data.json)
        #[arg(default_value = DEFAULT_OUTPUT_DIR)]
        dir: PathBuf,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value_t = 85)]
        quality: u8,

        /// Maximum width and height in pixels
        #[arg(long, default_value_t = 1920)]
        max_dimension: u32,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Extract { input, output } => {
            let output_dir = get_output_dir(&input, output.as_ref());
            extract_deck(&input, &output_dir)
        }
        Command::Milestones {
            input,
            min_year,
            max_year,
            output,
        } => {
            if min_year > max_year {
                anyhow::bail!("--min-year ({}) is after --max-year ({})", min_year, max_year);
            }
            let slides = load_slides_or_empty(&input);
            let milestones = MilestoneExtractor::new()
                .with_year_range(min_year, max_year)
                .extract(&slides);
            log::info!("Built {} milestones from {} slides", milestones.len(), slides.len());
            emit_json(&milestones, output.as_deref())
        }
        Command::Stats { input } => {
            let slides = load_slides_or_empty(&input);
            emit_json(&site_statistics(&slides), None)
        }
        Command::Compress {
            dir,
            quality,
            max_dimension,
        } => compress_images(&dir, quality, max_dimension),
    }
}

/// Extract a deck and write the slides document and images.
fn extract_deck(input_path: &Path, output_dir: &Path) -> Result<()> {
    log::info!("Extracting content from: {}", input_path.display());

    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let reader = BufReader::new(file);

    let deck = DeckExtractor::new()
        .extract(reader)
        .with_context(|| format!("Failed to extract {}", input_path.display()))?;

    let json_path = deck
        .write_to(output_dir)
        .with_context(|| format!("Failed to write output to {}", output_dir.display()))?;

    eprintln!("Extraction complete!");
    eprintln!("  - Total slides: {}", deck.slides.len());
    eprintln!("  - Total images extracted: {}", deck.image_count());
    eprintln!("  - Data saved to: {}", json_path.display());

    Ok(())
}

/// Compress the images of an extraction output directory.
fn compress_images(dir: &Path, quality: u8, max_dimension: u32) -> Result<()> {
    log::info!("Compressing images in: {}", dir.display());

    let report = ImageCompressor::new()
        .with_quality(quality)
        .with_max_dimension(max_dimension)
        .compress_extracted(dir)
        .with_context(|| format!("Failed to compress images in {}", dir.display()))?;

    eprintln!("Compression complete!");
    eprintln!("  - Images processed: {}", report.processed);
    if report.failed > 0 {
        eprintln!("  - Images failed: {}", report.failed);
    }
    if !report.renamed.is_empty() {
        eprintln!("  - Converted to JPEG: {}", report.renamed.len());
    }
    eprintln!(
        "  - Total size: {:.2} MB -> {:.2} MB ({:.1}% reduction)",
        report.original_bytes as f64 / (1024.0 * 1024.0),
        report.compressed_bytes as f64 / (1024.0 * 1024.0),
        report.reduction_percent()
    );

    Ok(())
}

/// Determine the output directory for an extracted deck.
fn get_output_dir(input_path: &Path, output_dir: Option<&PathBuf>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.clone(),
        None => match input_path.parent() {
            Some(parent) => parent.join(DEFAULT_OUTPUT_DIR),
            None => PathBuf::from(DEFAULT_OUTPUT_DIR),
        },
    }
}

/// Write pretty JSON to a file or stdout.
fn emit_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;

    match path {
        Some(path) => {
            let mut file =
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            writeln!(file, "{}", json).with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => println!("{}", json),
    }

    Ok(())
}
