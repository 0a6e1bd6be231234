//! File-safe names for extracted slides and images.

/// Maximum length of the shape-name part of an image filename.
const SHAPE_NAME_CHARS: usize = 20;

/// Maximum length of a slide title.
const TITLE_CHARS: usize = 50;

/// Make a file-safe name from free text.
///
/// Keeps alphanumerics, spaces, dashes, and underscores, turns spaces into
/// underscores, strips surrounding underscores, then truncates. Returns
/// `untitled` when nothing is left.
pub fn sanitize_filename(text: &str, max_chars: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();

    let truncated: String = cleaned.trim_matches('_').chars().take(max_chars).collect();

    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}

/// Title for a slide: its first text's first line, or `slide_{n}`.
pub fn slide_title(texts: &[String], slide_number: usize) -> String {
    match texts.first() {
        Some(first) => {
            let line = first.split('\n').next().unwrap_or_default().trim();
            let head: String = line.chars().take(TITLE_CHARS).collect();
            sanitize_filename(&head, TITLE_CHARS)
        }
        None => format!("slide_{}", slide_number),
    }
}

/// Filename for the `ordinal`-th image on a slide.
///
/// Shapes with a meaningful name get it embedded in the filename; the
/// default `Picture` name is left out.
pub fn image_filename(slide_number: usize, shape_name: Option<&str>, ordinal: usize, ext: &str) -> String {
    let name_part = shape_name
        .filter(|name| !name.is_empty())
        .map(|name| sanitize_filename(name, SHAPE_NAME_CHARS))
        .filter(|part| part != "Picture");

    match name_part {
        Some(part) => format!("slide_{:02}_{}_{:02}.{}", slide_number, part, ordinal, ext),
        None => format!("slide_{:02}_image_{:02}.{}", slide_number, ordinal, ext),
    }
}

/// Normalize a media part's extension for the written file.
pub fn image_extension(media_path: &str) -> String {
    let ext = media_path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
        .unwrap_or_else(|| "bin".to_string());

    match ext.as_str() {
        "jpeg" => "jpg".to_string(),
        _ => ext,
    }
}
