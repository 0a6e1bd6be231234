//! Headline statistics for the site, derived from the slides.

use crate::milestones::derive_location;
use crate::text::is_blank_text;
use crate::types::{Slide, Statistic};
use std::collections::HashSet;

/// Students supported, as reported in the deck's summary slide.
const STUDENTS_HELPED: usize = 550;

/// Years the trust has been running.
const YEARS_OF_IMPACT: usize = 10;

/// Compute the statistics shown in the impact overview.
pub fn site_statistics(slides: &[Slide]) -> Vec<Statistic> {
    let mut locations = HashSet::new();
    let mut programs = 0;

    for slide in slides {
        if !is_blank_text(&slide.all_text) {
            programs += 1;
        }
        if let Some(location) = derive_location(&slide.all_text) {
            locations.insert(location);
        }
    }

    vec![
        Statistic::new("Students Helped", STUDENTS_HELPED, "+"),
        Statistic::new("Locations Served", locations.len(), ""),
        Statistic::new("Programs Conducted", programs, "+"),
        Statistic::new("Years of Impact", YEARS_OF_IMPACT, ""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_statistics() {
        let slides = vec![
            Slide::new(1).with_text("Camp in Kolar"),
            Slide::new(2).with_text("Second camp in Kolar"),
            Slide::new(3).with_text("Visit to MM Hills"),
            Slide::new(4),
            Slide::new(5).with_text("  "),
            Slide::new(6).with_text("\u{FEFF}"),
        ];

        let stats = site_statistics(&slides);

        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].label, "Students Helped");
        assert_eq!(stats[0].value, 550);
        assert_eq!(stats[1].label, "Locations Served");
        assert_eq!(stats[1].value, 2);
        assert_eq!(stats[2].label, "Programs Conducted");
        assert_eq!(stats[2].value, 3);
        assert_eq!(stats[2].suffix.as_deref(), Some("+"));
        assert_eq!(stats[3].value, 10);
    }

    #[test]
    fn test_empty_deck() {
        let stats = site_statistics(&[]);
        assert_eq!(stats[1].value, 0);
        assert_eq!(stats[2].value, 0);
    }
}
