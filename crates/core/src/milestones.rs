//! Year-based milestone extraction.
//!
//! Folds an ordered deck of slides into one [`Milestone`] per year. Years
//! come from the slide text itself when it names one inside the configured
//! range, otherwise from the nearest year-bearing slide in a small window
//! around it.

use crate::text::{is_blank_text, trim_text};
use crate::types::{Milestone, Slide};
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// A standalone four-digit token in the 2000s.
///
/// The boundaries are ASCII-only so that a year glued to non-ASCII script,
/// as in "2019ರಲ್ಲಿ", still counts as standalone.
static YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)(20[0-9]{2})(?-u:\b)").unwrap());

/// Impact patterns, tried in order. The first match wins.
static IMPACT_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)([0-9]+)\s*(?:children|kids|students|scholarship)",
        r"(?i)([0-9]+)\s*(?:school bags|notebooks|books)",
        r"(?i)([0-9]+)\s*(?:libraries|schools)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Known places, in match priority order.
pub const DEFAULT_LOCATIONS: &[&str] = &[
    "Chickaballapur",
    "Mysore",
    "H.D. Kote",
    "KGF",
    "Kolar",
    "MM Hills",
    "Pandavapura",
    "Mulbagal",
];

/// Years accepted from a slide's own text.
pub const DEFAULT_YEAR_RANGE: RangeInclusive<u32> = 2016..=2025;

/// Number of slides on each side of a slide searched when inferring its year.
const INFERENCE_RADIUS: usize = 2;

/// Titles must be shorter than this many characters.
const MAX_TITLE_CHARS: usize = 100;

/// Groups slides into year-based milestones.
#[derive(Debug, Clone)]
pub struct MilestoneExtractor {
    /// Inclusive range for years found directly in a slide's text.
    year_range: RangeInclusive<u32>,
    /// Place names checked in order; the first substring hit is used.
    locations: Vec<String>,
}

impl Default for MilestoneExtractor {
    fn default() -> Self {
        Self {
            year_range: DEFAULT_YEAR_RANGE,
            locations: DEFAULT_LOCATIONS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl MilestoneExtractor {
    /// Create an extractor with the default year range and locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive range accepted for years found directly in slide text.
    pub fn with_year_range(mut self, min: u32, max: u32) -> Self {
        self.year_range = min..=max;
        self
    }

    /// Replace the ordered list of known place names.
    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Fold the slides into milestones, sorted ascending by year.
    ///
    /// Slides with a direct year merge their text into the year's
    /// description. Slides whose year is only inferred from neighbors
    /// contribute their images but never extend an existing description.
    pub fn extract(&self, slides: &[Slide]) -> Vec<Milestone> {
        let mut by_year: BTreeMap<u32, Milestone> = BTreeMap::new();

        for (index, slide) in slides.iter().enumerate() {
            if slide.is_blank() {
                log::debug!("Skipping blank slide {}", slide.slide_number);
                continue;
            }

            let direct = find_year(&slide.all_text).filter(|year| self.year_range.contains(year));

            if let Some(year) = direct {
                let milestone = by_year.entry(year).or_insert_with(|| Milestone {
                    year,
                    title: derive_title(slide),
                    description: slide.all_text.clone(),
                    images: Vec::new(),
                    location: self.location_in(&slide.all_text),
                    impact: derive_impact(&slide.all_text),
                });

                milestone.images.extend(slide.images.iter().cloned());

                if milestone.description != slide.all_text && !is_blank_text(&slide.all_text) {
                    milestone.description.push_str("\n\n");
                    milestone.description.push_str(&slide.all_text);
                }
                continue;
            }

            match infer_year(slides, index) {
                Some(year) => {
                    log::debug!("Slide {} attributed to inferred year {}", slide.slide_number, year);
                    let milestone = by_year.entry(year).or_insert_with(|| Milestone {
                        year,
                        title: derive_title(slide),
                        description: slide.all_text.clone(),
                        images: Vec::new(),
                        location: self.location_in(&slide.all_text),
                        impact: None,
                    });
                    milestone.images.extend(slide.images.iter().cloned());
                }
                None => {
                    log::debug!("No year found near slide {}", slide.slide_number);
                }
            }
        }

        by_year.into_values().collect()
    }

    /// Find the first configured location mentioned in the text.
    pub fn location_in(&self, text: &str) -> Option<String> {
        self.locations
            .iter()
            .find(|location| text.contains(location.as_str()))
            .cloned()
    }
}

/// Find the first year-shaped token in the text.
pub fn find_year(text: &str) -> Option<u32> {
    YEAR_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Infer a year for the slide at `index` from the slides around it.
///
/// Scans `index - 2 ..= index + 2` (clamped, the slide itself included) left
/// to right. No range check is applied to the result.
fn infer_year(slides: &[Slide], index: usize) -> Option<u32> {
    let start = index.saturating_sub(INFERENCE_RADIUS);
    let end = (index + INFERENCE_RADIUS + 1).min(slides.len());

    slides[start..end]
        .iter()
        .find_map(|nearby| find_year(&nearby.all_text))
}

/// Derive a display title from the first line of a slide's text.
///
/// Falls back to `Milestone {slide_number}` when the text is blank or the
/// first line is empty or too long.
pub fn derive_title(slide: &Slide) -> String {
    if !is_blank_text(&slide.all_text) {
        let first_line = trim_text(slide.all_text.split('\n').next().unwrap_or_default());
        let len = first_line.chars().count();
        if len > 0 && len < MAX_TITLE_CHARS {
            return first_line.to_string();
        }
    }
    format!("Milestone {}", slide.slide_number)
}

/// Find the first default location mentioned in the text.
pub fn derive_location(text: &str) -> Option<String> {
    DEFAULT_LOCATIONS
        .iter()
        .find(|location| text.contains(*location))
        .map(|location| location.to_string())
}

/// Extract an impact phrase such as `120 children` or `3 libraries`.
pub fn derive_impact(text: &str) -> Option<String> {
    IMPACT_REGEXES
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlideImage;

    fn image(name: &str) -> SlideImage {
        SlideImage::new(name, format!("images/{}", name), 0)
    }

    fn slide(number: usize, text: &str, images: &[&str]) -> Slide {
        images
            .iter()
            .fold(Slide::new(number).with_text(text), |s, name| s.with_image(image(name)))
    }

    #[test]
    fn test_same_year_slides_merge() {
        let slides = vec![
            slide(1, "2018 camp in Kolar", &["a.png"]),
            slide(2, "2018 continued", &["b.png"]),
        ];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        let m = &milestones[0];
        assert_eq!(m.year, 2018);
        assert_eq!(m.images, vec![image("a.png"), image("b.png")]);
        assert_eq!(m.description, "2018 camp in Kolar\n\n2018 continued");
        assert_eq!(m.location.as_deref(), Some("Kolar"));
        assert_eq!(m.title, "2018 camp in Kolar");
    }

    #[test]
    fn test_output_sorted_without_duplicates() {
        let slides = vec![
            slide(1, "2021 drive", &[]),
            slide(2, "2017 start", &[]),
            slide(3, "2021 again", &[]),
            slide(4, "2019 libraries", &[]),
        ];

        let years: Vec<u32> = MilestoneExtractor::new()
            .extract(&slides)
            .iter()
            .map(|m| m.year)
            .collect();

        assert_eq!(years, vec![2017, 2019, 2021]);
    }

    #[test]
    fn test_blank_slide_contributes_nothing() {
        let slides = vec![slide(1, "   ", &[]), slide(2, "", &[])];
        assert!(MilestoneExtractor::new().extract(&slides).is_empty());

        // A blank slide next to a year-bearing one still adds nothing.
        let slides = vec![slide(1, "2019 event", &["a.png"]), slide(2, "\n", &[])];
        let milestones = MilestoneExtractor::new().extract(&slides);
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].images, vec![image("a.png")]);
        assert_eq!(milestones[0].description, "2019 event");
    }

    #[test]
    fn test_direct_year_collects_images() {
        let slides = vec![slide(3, "Book drive held in 2019", &["x.jpg", "y.jpg"])];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].year, 2019);
        assert_eq!(milestones[0].images, vec![image("x.jpg"), image("y.jpg")]);
    }

    #[test]
    fn test_out_of_range_year_uses_neighbors() {
        let slides = vec![
            slide(1, "2018 event", &["a.png"]),
            slide(2, "Founded in 1999", &["b.png"]),
        ];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].year, 2018);
        assert_eq!(milestones[0].images, vec![image("a.png"), image("b.png")]);
        // Inferred slides never extend the description.
        assert_eq!(milestones[0].description, "2018 event");
    }

    #[test]
    fn test_inferred_year_skips_range_check() {
        let slides = vec![slide(1, "Plans for 2030", &["a.png"])];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].year, 2030);
        assert_eq!(milestones[0].impact, None);
    }

    #[test]
    fn test_inference_prefers_leftmost_in_window() {
        let slides = vec![
            slide(1, "2017 opening", &[]),
            slide(2, "2020 later", &[]),
            slide(3, "photos", &["p.png"]),
            slide(4, "2022 closing", &[]),
        ];

        let milestones = MilestoneExtractor::new().extract(&slides);
        let m2017 = milestones.iter().find(|m| m.year == 2017).unwrap();

        assert_eq!(m2017.images, vec![image("p.png")]);
    }

    #[test]
    fn test_inference_window_is_two_slides() {
        let slides = vec![
            slide(1, "2017 opening", &[]),
            slide(2, "notes", &[]),
            slide(3, "more notes", &[]),
            slide(4, "photos", &["p.png"]),
        ];

        let milestones = MilestoneExtractor::new().extract(&slides);

        // Slide 4 is three away from the only year and contributes nothing.
        assert!(milestones.iter().all(|m| m.images.is_empty()));
    }

    #[test]
    fn test_inferred_year_creates_milestone_from_current_slide() {
        let slides = vec![
            slide(1, "Trip to Mysore with 40 kids", &["m.png"]),
            slide(2, "2023 summary", &[]),
        ];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        let m = &milestones[0];
        assert_eq!(m.year, 2023);
        assert_eq!(m.title, "Trip to Mysore with 40 kids");
        // The later direct-year slide still merges into the description.
        assert_eq!(m.description, "Trip to Mysore with 40 kids\n\n2023 summary");
        assert_eq!(m.location.as_deref(), Some("Mysore"));
        assert_eq!(m.impact, None);
        assert_eq!(m.images, vec![image("m.png")]);
    }

    #[test]
    fn test_repeated_text_is_still_appended() {
        let slides = vec![
            slide(1, "2020 a", &[]),
            slide(2, "2020 b", &[]),
            slide(3, "2020 b", &[]),
        ];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones[0].description, "2020 a\n\n2020 b\n\n2020 b");
    }

    #[test]
    fn test_text_equal_to_description_is_not_appended() {
        let slides = vec![slide(1, "2020 a", &["a.png"]), slide(2, "2020 a", &["b.png"])];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].description, "2020 a");
        assert_eq!(milestones[0].images, vec![image("a.png"), image("b.png")]);
    }

    #[test]
    fn test_year_next_to_non_ascii_text() {
        let slides = vec![slide(1, "ಕೋಲಾರ 2019ರಲ್ಲಿ ಶಿಬಿರ", &["k.png"])];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].year, 2019);
        assert_eq!(milestones[0].images, vec![image("k.png")]);
    }

    #[test]
    fn test_inference_reads_years_next_to_non_ascii_text() {
        let slides = vec![slide(1, "café2018", &[]), slide(2, "photos", &["p.png"])];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].year, 2018);
        assert_eq!(milestones[0].images, vec![image("p.png")]);
    }

    #[test]
    fn test_bom_only_slide_is_skipped() {
        let slides = vec![slide(1, "\u{FEFF}", &[]), slide(2, "Plans 2031", &[])];

        let milestones = MilestoneExtractor::new().extract(&slides);

        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].year, 2031);
        assert_eq!(milestones[0].title, "Plans 2031");
        assert_eq!(milestones[0].description, "Plans 2031");
    }

    #[test]
    fn test_custom_year_range() {
        let slides = vec![slide(1, "2012 beginnings", &["a.png"])];

        let milestones = MilestoneExtractor::new()
            .with_year_range(2010, 2025)
            .extract(&slides);

        assert_eq!(milestones[0].year, 2012);
        assert_eq!(milestones[0].description, "2012 beginnings");
    }

    #[test]
    fn test_custom_locations() {
        let extractor = MilestoneExtractor::new().with_locations(["Tumkur"]);
        assert_eq!(extractor.location_in("Camp at Tumkur"), Some("Tumkur".to_string()));
        assert_eq!(extractor.location_in("Camp at Mysore"), None);
    }

    #[test]
    fn test_find_year_requires_word_boundary() {
        assert_eq!(find_year("in 2019."), Some(2019));
        assert_eq!(find_year("ID 120190"), None);
        assert_eq!(find_year("1999 only"), None);
        assert_eq!(find_year("2016 then 2018"), Some(2016));
        assert_eq!(find_year("2019ರಲ್ಲಿ ಶಿಬಿರ"), Some(2019));
        assert_eq!(find_year("café2019"), Some(2019));
        assert_eq!(find_year("x2019"), None);
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title(&Slide::new(7)), "Milestone 7");
        assert_eq!(derive_title(&slide(2, "  Title line  \nbody", &[])), "Title line");
        assert_eq!(derive_title(&slide(3, "\nbody", &[])), "Milestone 3");
        assert_eq!(derive_title(&slide(6, "\u{FEFF}Camp day\nbody", &[])), "Camp day");

        let long = "x".repeat(100);
        assert_eq!(derive_title(&slide(4, &long, &[])), "Milestone 4");
        let just_short = "x".repeat(99);
        assert_eq!(derive_title(&slide(5, &just_short, &[])), just_short);
    }

    #[test]
    fn test_derive_location() {
        assert_eq!(
            derive_location("...trip to Mysore in..."),
            Some("Mysore".to_string())
        );
        assert_eq!(derive_location("Nothing here"), None);
        // List order wins over position in the text.
        assert_eq!(
            derive_location("From Kolar to Chickaballapur"),
            Some("Chickaballapur".to_string())
        );
        assert_eq!(derive_location("Near KGF"), Some("KGF".to_string()));
    }

    #[test]
    fn test_derive_impact() {
        assert_eq!(
            derive_impact("We supported 120 Children this year"),
            Some("120 Children".to_string())
        );
        assert_eq!(
            derive_impact("Distributed 300 notebooks and 20 students"),
            Some("20 students".to_string())
        );
        assert_eq!(derive_impact("Opened 3libraries"), Some("3libraries".to_string()));
        assert_eq!(derive_impact("No numbers at all"), None);
    }
}
