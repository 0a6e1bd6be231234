//! PPTX file parser implementation.
//!
//! Walks each slide's shape tree in document order. Top-level text shapes
//! contribute text; pictures, including those nested inside groups, are
//! resolved through the slide's relationships and pulled out of the archive.

use crate::deck::{ExtractedDeck, ExtractedImage, IMAGES_DIR};
use crate::naming::{image_extension, image_filename, slide_title};
use deck_core::{Error, Result, Slide, SlideImage, TextContent};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Elements that count as shapes when they are direct children of `spTree`.
const SHAPE_ELEMENTS: &[&[u8]] = &[
    b"sp",
    b"grpSp",
    b"graphicFrame",
    b"cxnSp",
    b"pic",
    b"contentPart",
];

/// Extractor for PPTX (Office Open XML) decks.
pub struct DeckExtractor;

impl DeckExtractor {
    /// Create a new deck extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract slides and images from a PPTX file.
    pub fn extract<R: Read + Seek>(&self, reader: R) -> Result<ExtractedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        if slide_order.is_empty() {
            return Err(Error::PptxParseError("Presentation has no slides".to_string()));
        }

        let mut deck = ExtractedDeck::default();

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide_number = idx + 1;
            let (slide, images) = self.parse_slide(&mut archive, slide_path, slide_number)?;
            log::debug!(
                "Slide {}: {} text elements, {} images",
                slide_number,
                slide.text_content.len(),
                slide.images.len()
            );
            deck.slides.push(slide);
            deck.images.extend(images);
        }

        Ok(deck)
    }

    /// Get the ordered list of slide paths.
    ///
    /// Uses the slide id list in `presentation.xml` when present, otherwise
    /// falls back to the numbering of relationship ids and targets.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let slide_rels: Vec<Relationship> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| rel.rel_type.ends_with("/slide") && !rel.external)
            .collect();

        if let Some(presentation) = self.read_optional_file(archive, PRESENTATION_PATH)? {
            let ordered: Vec<String> = parse_slide_id_list(&presentation)?
                .iter()
                .filter_map(|id| slide_rels.iter().find(|rel| &rel.id == id))
                .map(|rel| resolve_target("ppt", &rel.target))
                .collect();

            if !ordered.is_empty() {
                return Ok(ordered);
            }
            log::debug!("No slide id list in presentation.xml, ordering by relationship");
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|rel| {
                let order_num = extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target("ppt", &rel.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide and collect its images.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<(Slide, Vec<ExtractedImage>)> {
        let content = self.read_file_from_archive(archive, slide_path)?;

        let (base_dir, file_name) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let rels_path = if base_dir.is_empty() {
            format!("_rels/{}.rels", file_name)
        } else {
            format!("{}/_rels/{}.rels", base_dir, file_name)
        };

        let media_targets: HashMap<String, String> = match self.read_optional_file(archive, &rels_path)? {
            Some(xml) => parse_relationships(&xml)?
                .into_iter()
                .filter(|rel| !rel.external)
                .map(|rel| (rel.id, resolve_target(base_dir, &rel.target)))
                .collect(),
            None => {
                log::debug!("No relationships for {}", slide_path);
                HashMap::new()
            }
        };

        let shapes = extract_shapes_from_xml(&content)?;

        let mut slide = Slide::new(slide_number);
        let mut texts: Vec<String> = Vec::new();
        let mut images = Vec::new();

        for shape in shapes {
            if !shape.text.is_empty() {
                slide.text_content.push(TextContent {
                    shape_index: shape.index,
                    text: shape.text.clone(),
                });
                texts.push(shape.text);
            }

            for picture in shape.pictures {
                let Some(media_path) = picture.embed.as_ref().and_then(|id| media_targets.get(id)) else {
                    log::warn!(
                        "Slide {}: picture {:?} has no resolvable image, skipping",
                        slide_number,
                        picture.name
                    );
                    continue;
                };

                let data = match self.read_bytes_from_archive(archive, media_path) {
                    Ok(data) => data,
                    Err(e) => {
                        log::warn!("Slide {}: skipping image: {}", slide_number, e);
                        continue;
                    }
                };

                let ordinal = slide.images.len();
                let filename = image_filename(
                    slide_number,
                    picture.name.as_deref(),
                    ordinal,
                    &image_extension(media_path),
                );
                slide
                    .images
                    .push(SlideImage::new(&filename, format!("{}/{}", IMAGES_DIR, filename), ordinal));
                images.push(ExtractedImage { filename, data });
            }
        }

        slide.all_text = texts.join("\n\n");
        slide.title = slide_title(&texts, slide_number);

        Ok((slide, images))
    }

    /// Read a text file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        self.read_optional_file(archive, path)?
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", path)))
    }

    /// Read a text file from the ZIP archive, `None` if it does not exist.
    fn read_optional_file<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Option<String>> {
        match archive.by_name(path) {
            Ok(mut file) => {
                let mut content = String::new();
                file.read_to_string(&mut content)
                    .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;
                Ok(Some(content))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(Error::ZipError(format!("Failed to open '{}': {}", path, e))),
        }
    }

    /// Read a binary file from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(data)
    }
}

impl Default for DeckExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

/// Parse all `Relationship` elements of a `.rels` part.
fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }

                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Collect the relationship ids of `p:sldIdLst`, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                // The unprefixed `id` is the numeric slide id; `r:id` is the relationship.
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    (key != b"id" && local_name(key) == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
                if let Some(id) = rel_id {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing presentation: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Information about a top-level shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    /// Position among the direct children of `spTree`.
    index: usize,
    text: String,
    pictures: Vec<PictureInfo>,
}

/// A picture found inside a shape (or the shape itself).
#[derive(Debug, Default)]
struct PictureInfo {
    name: Option<String>,
    embed: Option<String>,
}

/// Event-driven state for walking one slide's shape tree.
#[derive(Debug, Default)]
struct ShapeScanner {
    shapes: Vec<ShapeInfo>,
    depth: usize,
    tree_depth: Option<usize>,
    tree_done: bool,
    current: Option<ShapeInfo>,
    picture: Option<PictureInfo>,
    text_shape: bool,
    in_text_body: bool,
    in_run_text: bool,
    paragraphs: usize,
}

impl ShapeScanner {
    fn start(&mut self, e: &BytesStart, empty: bool) {
        let name = e.name();
        let local = local_name(name.as_ref());
        let depth = self.depth + 1;
        if !empty {
            self.depth = depth;
        }

        let Some(tree_depth) = self.tree_depth else {
            if local == b"spTree" && !self.tree_done && !empty {
                self.tree_depth = Some(depth);
            }
            return;
        };

        if depth == tree_depth + 1 && SHAPE_ELEMENTS.iter().any(|shape| *shape == local) {
            self.begin_shape(local);
        }

        if self.current.is_none() {
            return;
        }

        match local {
            b"pic" => self.picture = Some(PictureInfo::default()),
            b"cNvPr" => {
                if let Some(picture) = self.picture.as_mut() {
                    if picture.name.is_none() {
                        picture.name = attribute(e, b"name");
                    }
                }
            }
            b"blip" => {
                if let Some(picture) = self.picture.as_mut() {
                    picture.embed = attribute(e, b"embed");
                }
            }
            b"txBody" if self.text_shape && !empty => self.in_text_body = true,
            b"p" if self.in_text_body => {
                if self.paragraphs > 0 {
                    self.push_text("\n");
                }
                self.paragraphs += 1;
            }
            // Soft line breaks stay inside the paragraph as a vertical tab.
            b"br" if self.in_text_body => self.push_text("\u{000B}"),
            b"t" if self.in_text_body && !empty => self.in_run_text = true,
            _ => {}
        }

        if empty {
            if local == b"pic" {
                self.finish_picture();
            }
            if depth == tree_depth + 1 {
                self.finish_shape();
            }
        }
    }

    fn end(&mut self, local: &[u8]) {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);

        let Some(tree_depth) = self.tree_depth else {
            return;
        };

        if depth == tree_depth {
            self.tree_depth = None;
            self.tree_done = true;
            return;
        }

        if self.current.is_none() {
            return;
        }

        match local {
            b"pic" => self.finish_picture(),
            b"t" => self.in_run_text = false,
            b"txBody" => self.in_text_body = false,
            _ => {}
        }

        if depth == tree_depth + 1 {
            self.finish_shape();
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(shape) = self.current.as_mut() {
            shape.text.push_str(text);
        }
    }

    fn begin_shape(&mut self, local: &[u8]) {
        self.current = Some(ShapeInfo {
            index: self.shapes.len(),
            ..ShapeInfo::default()
        });
        self.text_shape = local == b"sp";
        self.in_text_body = false;
        self.in_run_text = false;
        self.paragraphs = 0;
    }

    fn finish_picture(&mut self) {
        if let (Some(picture), Some(shape)) = (self.picture.take(), self.current.as_mut()) {
            shape.pictures.push(picture);
        }
    }

    fn finish_shape(&mut self) {
        if let Some(mut shape) = self.current.take() {
            shape.text = shape.text.trim().to_string();
            self.shapes.push(shape);
        }
        self.picture = None;
        self.in_text_body = false;
        self.in_run_text = false;
    }
}

/// Extract the top-level shapes of a slide's shape tree, in document order.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<ShapeInfo>> {
    let mut reader = Reader::from_str(xml_content);
    let mut scanner = ShapeScanner::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => scanner.start(e, false),
            Ok(Event::Empty(ref e)) => scanner.start(e, true),
            Ok(Event::Text(ref e)) => {
                if scanner.in_run_text {
                    let text = e.unescape().unwrap_or_default();
                    scanner.push_text(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                scanner.end(local_name(name.as_ref()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(scanner.shapes)
}

/// Value of the first attribute whose local name matches.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
