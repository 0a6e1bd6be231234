//! Domain types for slide deck content and the milestones derived from it.

use crate::text::is_blank_text;
use serde::{Deserialize, Serialize};

/// An image asset extracted from one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideImage {
    /// File name of the written image (no directory).
    pub filename: String,

    /// Path relative to the extraction output directory.
    pub path: String,

    /// Ordinal of the image within its slide.
    pub shape_index: usize,
}

impl SlideImage {
    /// Create a new slide image reference.
    pub fn new(filename: impl Into<String>, path: impl Into<String>, shape_index: usize) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
            shape_index,
        }
    }
}

/// Text content from a single top-level shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// Index of the shape in the slide's shape tree.
    pub shape_index: usize,

    /// The trimmed text of the shape.
    pub text: String,
}

/// A single slide of a pre-processed deck.
///
/// Missing fields deserialize as empty so that a sparse document degrades
/// to "no contribution" instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub slide_number: usize,

    /// Text per shape, in shape order.
    #[serde(default)]
    pub text_content: Vec<TextContent>,

    /// Images extracted from this slide, in shape order.
    #[serde(default)]
    pub images: Vec<SlideImage>,

    /// All shape texts joined by a blank line.
    #[serde(default)]
    pub all_text: String,

    /// Filename-safe title derived from the first text.
    #[serde(default)]
    pub title: String,
}

impl Slide {
    /// Create a new empty slide with the given number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            text_content: Vec::new(),
            images: Vec::new(),
            all_text: String::new(),
            title: String::new(),
        }
    }

    /// Set the combined slide text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.all_text = text.into();
        self
    }

    /// Add an image to this slide.
    pub fn with_image(mut self, image: SlideImage) -> Self {
        self.images.push(image);
        self
    }

    /// Whether the slide has neither text nor images.
    pub fn is_blank(&self) -> bool {
        is_blank_text(&self.all_text) && self.images.is_empty()
    }
}

/// One point on the timeline: everything attributed to a single year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub year: u32,
    pub title: String,
    pub description: String,
    pub images: Vec<SlideImage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

/// A headline counter shown on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    pub label: String,
    pub value: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl Statistic {
    /// Create a statistic with a display suffix.
    pub fn new(label: impl Into<String>, value: usize, suffix: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            suffix: Some(suffix.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_missing_fields_default_to_empty() {
        let slide: Slide = serde_json::from_str(r#"{"slide_number": 4}"#).unwrap();

        assert_eq!(slide.slide_number, 4);
        assert!(slide.text_content.is_empty());
        assert!(slide.images.is_empty());
        assert_eq!(slide.all_text, "");
        assert!(slide.is_blank());
    }

    #[test]
    fn test_milestone_omits_unset_optionals() {
        let milestone = Milestone {
            year: 2019,
            title: "Camp".to_string(),
            description: "Camp".to_string(),
            images: Vec::new(),
            location: None,
            impact: Some("40 children".to_string()),
        };

        let json = serde_json::to_value(&milestone).unwrap();
        assert!(json.get("location").is_none());
        assert_eq!(json["impact"], "40 children");
    }

    #[test]
    fn test_whitespace_only_slide_is_blank() {
        assert!(Slide::new(1).with_text("  \n\t ").is_blank());
        assert!(Slide::new(1).with_text("\u{FEFF}").is_blank());
        assert!(!Slide::new(1)
            .with_image(SlideImage::new("a.png", "images/a.png", 0))
            .is_blank());
    }
}
