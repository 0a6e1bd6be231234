//! Text helpers shared by blank-slide checks and milestone derivation.

/// Trim whitespace and byte-order marks (U+FEFF) from both ends.
pub fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Whether the text has nothing left after [`trim_text`].
pub fn is_blank_text(text: &str) -> bool {
    trim_text(text).is_empty()
}
