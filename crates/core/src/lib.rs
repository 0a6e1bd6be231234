//! Core domain types, year-based milestone extraction, and site statistics
//! for slide decks.

pub mod error;
pub mod loader;
pub mod milestones;
pub mod stats;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use loader::{load_slides, load_slides_or_empty, parse_slides};
pub use milestones::{derive_impact, derive_location, derive_title, MilestoneExtractor};
pub use stats::site_statistics;
pub use text::{is_blank_text, trim_text};
pub use types::{Milestone, Slide, SlideImage, Statistic, TextContent};
