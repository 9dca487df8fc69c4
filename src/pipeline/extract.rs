//! Text extraction: pull plain text out of an uploaded `.docx`.
//!
//! A `.docx` is a ZIP archive whose main story lives in
//! `word/document.xml`. Only the text matters to the model, so this stage
//! streams that one part through `quick-xml` and keeps the contents of
//! `w:t` runs, turning tabs and breaks into their plain-text equivalents.
//! Paragraphs are separated by a blank line.
//!
//! The magic bytes are checked before the archive is opened so that a
//! renamed PDF or a truncated upload fails with [`AutodoxError::NotADocx`]
//! rather than a ZIP parser message.

use crate::error::AutodoxError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Local file header signature every ZIP (and so every .docx) starts with.
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Archive member holding the main document story.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Plain text pulled from a document, with a little bookkeeping for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub paragraphs: usize,
}

impl ExtractedText {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract the raw text of a `.docx` payload.
pub fn extract_text(bytes: &[u8]) -> Result<ExtractedText, AutodoxError> {
    if bytes.len() < ZIP_MAGIC.len() || &bytes[..ZIP_MAGIC.len()] != ZIP_MAGIC {
        return Err(AutodoxError::NotADocx {
            magic: bytes.iter().take(ZIP_MAGIC.len()).copied().collect(),
        });
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| corrupt(format!("unreadable archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| corrupt(format!("archive has no {}", DOCUMENT_PART)))?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(format!("cannot read {}: {}", DOCUMENT_PART, e)))?;

    let extracted = text_from_document_xml(&xml)?;
    debug!(
        "Extracted {} paragraphs, {} chars",
        extracted.paragraphs,
        extracted.char_count()
    );
    Ok(extracted)
}

/// Walk WordprocessingML and collect paragraph text.
///
/// Paragraphs nested inside text boxes are folded into their host paragraph
/// on a new line.
pub fn text_from_document_xml(xml: &str) -> Result<ExtractedText, AutodoxError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut runs = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    depth += 1;
                    if depth > 1 && !current.is_empty() {
                        current.push('\n');
                    }
                }
                b"r" => runs += 1,
                b"t" => in_text = true,
                b"tab" if runs > 0 => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                b"r" => runs = runs.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" if depth == 0 => paragraphs.push(String::new()),
                // `w:tab` in `w:pPr/w:tabs` is a tab stop, not a character.
                b"tab" if runs > 0 => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| corrupt(format!("bad text in {}: {}", DOCUMENT_PART, e)))?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(corrupt(format!(
                    "malformed XML in {} at byte {}: {}",
                    DOCUMENT_PART,
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    let count = paragraphs.len();
    let text = paragraphs.join("\n\n").trim_end().to_string();
    Ok(ExtractedText {
        text,
        paragraphs: count,
    })
}

fn corrupt(detail: String) -> AutodoxError {
    AutodoxError::CorruptDocx { detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_separated_by_blank_line() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>BAB I</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Latar </w:t></w:r><w:r><w:t>Belakang</w:t></w:r></w:p>",
        );
        let out = extract_text(&bytes).unwrap();
        assert_eq!(out.text, "BAB I\n\nLatar Belakang");
        assert_eq!(out.paragraphs, 2);
    }

    #[test]
    fn tabs_and_breaks_become_whitespace() {
        let xml = r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t><w:br/><w:t>C</w:t></w:r></w:p></w:body></w:document>"#;
        let out = text_from_document_xml(xml).unwrap();
        assert_eq!(out.text, "A\tB\nC");
    }

    #[test]
    fn tab_stops_in_paragraph_properties_are_not_text() {
        let bytes = docx_with_body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="right" w:leader="dot" w:pos="9000"/></w:tabs></w:pPr><w:r><w:t>BAB I</w:t></w:r></w:p>"#,
        );
        let out = extract_text(&bytes).unwrap();
        assert_eq!(out.text, "BAB I");
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>Tom &amp; Jerry &lt;1&gt;</w:t></w:r></w:p></w:body></w:document>"#;
        let out = text_from_document_xml(xml).unwrap();
        assert_eq!(out.text, "Tom & Jerry <1>");
    }

    #[test]
    fn instruction_text_is_ignored() {
        let xml = r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:instrText>PAGE</w:instrText></w:r><w:r><w:t>Body</w:t></w:r></w:p></w:body></w:document>"#;
        let out = text_from_document_xml(xml).unwrap();
        assert_eq!(out.text, "Body");
    }

    #[test]
    fn non_zip_payload_is_not_a_docx() {
        let err = extract_text(b"%PDF-1.7 ...").unwrap_err();
        assert!(matches!(err, AutodoxError::NotADocx { ref magic } if magic == b"%PDF"));
    }

    #[test]
    fn zip_without_document_part_is_corrupt() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("hello.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"hi").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = extract_text(&bytes).unwrap_err();
        assert!(matches!(err, AutodoxError::CorruptDocx { .. }));
    }

    #[test]
    fn malformed_xml_is_corrupt() {
        let err = text_from_document_xml("<w:document><w:p></w:r></w:document>").unwrap_err();
        assert!(matches!(err, AutodoxError::CorruptDocx { .. }));
    }
}
