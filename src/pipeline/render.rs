//! Document rendering: build the reformatted `.docx`.
//!
//! Rendering is split in two so the interesting part is testable without
//! unzipping anything:
//!
//! 1. [`layout`] turns a [`StructuredDocument`] into a [`DocumentLayout`]:
//!    the front-matter and body paragraphs as plain values.
//! 2. [`package`] builds the document with `docx-rs` and packs it into an
//!    OOXML archive.
//!
//! ## Sections
//!
//! The front section holds the title and one paragraph per remaining
//! preliminary page, numbered `lowerRoman` from i. The body restarts
//! numbering at 1 in `decimal` and holds the five generated lists. Both
//! sections share one footer with a centred `PAGE` field.
//!
//! `docx-rs` models a single body-level section and its `PageNumType` has
//! no format, so after packing, [`package`] rewrites `word/document.xml`:
//! the front section is a copy of the body section carried in the last
//! front paragraph, and both get their `w:pgNumType`.
//!
//! ## Determinism
//!
//! Paragraph ids, the settings document id and the core property dates are
//! pinned, and every ZIP entry carries the same fixed timestamp, so the
//! same structure always yields the same bytes.

use crate::config::SectionLabels;
use crate::error::AutodoxError;
use crate::model::{ListEntry, StructuredDocument};
use docx_rs::{
    AlignmentType, BreakType, Docx, FieldCharType, Footer, InstrText, PageMargin, Paragraph,
    Run, RunFonts, Style, StyleType,
};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// MIME type of a `.docx` document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// One paragraph of the generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Centred document title.
    Title(String),
    /// Heading of a generated list.
    Heading(String),
    /// List line: title in a plain run, `.... {page}` in a bold run.
    Entry { title: String, page: u32 },
    /// Bibliography line.
    Reference(String),
    /// Empty paragraph. `page_break` starts a new page before it.
    Blank { page_break: bool },
}

/// Paragraphs of both sections, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    pub title: String,
    pub front: Vec<Block>,
    pub body: Vec<Block>,
}

/// Lay out the document for a structure.
///
/// The front section has exactly `roman_page_count` paragraphs: the title
/// followed by blanks, each blank opening a new preliminary page.
pub fn layout(structure: &StructuredDocument, labels: &SectionLabels) -> DocumentLayout {
    let mut front = Vec::with_capacity(structure.roman_page_count.max(1) as usize);
    front.push(Block::Title(labels.title.clone()));
    for _ in 1..structure.roman_page_count {
        front.push(Block::Blank { page_break: true });
    }

    let mut body = Vec::new();
    for (heading, entries) in [
        (&labels.table_of_contents, &structure.table_of_contents),
        (&labels.figures, &structure.figures),
        (&labels.tables, &structure.tables),
        (&labels.appendices, &structure.appendices),
    ] {
        push_list(&mut body, heading, entries);
        body.push(Block::Blank { page_break: false });
    }

    body.push(Block::Heading(labels.bibliography.clone()));
    body.extend(
        structure
            .sorted_references()
            .iter()
            .map(|r| Block::Reference(r.citation())),
    );

    DocumentLayout {
        title: labels.title.clone(),
        front,
        body,
    }
}

fn push_list(body: &mut Vec<Block>, heading: &str, entries: &[ListEntry]) {
    body.push(Block::Heading(heading.to_string()));
    body.extend(entries.iter().map(|e| Block::Entry {
        title: e.title.clone(),
        page: e.page_number,
    }));
}

/// Lay out and package in one step.
pub fn render_document(
    structure: &StructuredDocument,
    labels: &SectionLabels,
) -> Result<Vec<u8>, AutodoxError> {
    package(&layout(structure, labels))
}

// ── Packaging ────────────────────────────────────────────────────────────

const FONT: &str = "Times New Roman";
const DOCUMENT_PART: &str = "word/document.xml";

/// Fixed package timestamp: the earliest DOS date a ZIP entry can hold.
const PACKAGE_DATE: (u16, u8, u8) = (1980, 1, 1);
const CORE_PROPS_DATE: &str = "1980-01-01T00:00:00Z";
const DOC_ID: &str = "{00000000-0000-0000-0000-000000000000}";

/// Serialise a layout into `.docx` bytes.
pub fn package(layout: &DocumentLayout) -> Result<Vec<u8>, AutodoxError> {
    let mut packed = Cursor::new(Vec::new());
    build_docx(layout)
        .build()
        .pack(&mut packed)
        .map_err(|e| render_err("archive", e))?;
    repack(packed.get_ref(), layout.front.len())
}

/// Build the document as one section: A4 portrait with a 4 cm binding
/// margin and 3 cm elsewhere (twentieths of a point).
pub fn build_docx(layout: &DocumentLayout) -> Docx {
    let mut docx = Docx::new()
        .default_fonts(RunFonts::new().ascii(FONT).hi_ansi(FONT).cs(FONT))
        .default_size(24)
        .page_size(11906, 16838)
        .page_margin(
            PageMargin::new()
                .top(1701)
                .right(1701)
                .bottom(1701)
                .left(2268)
                .header(720)
                .footer(720),
        )
        .footer(page_number_footer())
        .add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .bold()
                .size(32)
                .align(AlignmentType::Center),
        )
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .bold()
                .size(28),
        )
        .add_style(Style::new("Reference", StyleType::Paragraph).name("Reference"));

    for block in layout.front.iter().chain(&layout.body) {
        docx = docx.add_paragraph(paragraph(block));
    }
    docx
}

fn paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Title(text) => Paragraph::new()
            .style("Title")
            .align(AlignmentType::Center)
            .add_run(Run::new().add_text(text)),
        Block::Heading(text) => Paragraph::new()
            .style("Heading1")
            .add_run(Run::new().add_text(text)),
        Block::Reference(text) => Paragraph::new()
            .style("Reference")
            .add_run(Run::new().add_text(text)),
        Block::Entry { title, page } => Paragraph::new()
            .add_run(Run::new().add_text(title))
            .add_run(Run::new().add_text(format!(".... {}", page)).bold()),
        Block::Blank { page_break: true } => {
            Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
        }
        Block::Blank { page_break: false } => Paragraph::new(),
    }
}

/// Centred footer holding a `PAGE` field.
fn page_number_footer() -> Footer {
    let field = Run::new()
        .add_field_char(FieldCharType::Begin, false)
        .add_instr_text(InstrText::Unsupported(" PAGE ".to_string()))
        .add_field_char(FieldCharType::Separate, false)
        .add_text("1")
        .add_field_char(FieldCharType::End, false);
    Footer::new().add_paragraph(Paragraph::new().align(AlignmentType::Center).add_run(field))
}

/// Copy the `docx-rs` archive entry by entry, splitting the sections in
/// `word/document.xml` and pinning generated values in every XML part.
fn repack(packed: &[u8], front_paragraphs: usize) -> Result<Vec<u8>, AutodoxError> {
    let mut archive =
        ZipArchive::new(Cursor::new(packed)).map_err(|e| render_err("archive", e))?;

    let (year, month, day) = PACKAGE_DATE;
    let timestamp = zip::DateTime::from_date_and_time(year, month, day, 0, 0, 0)
        .map_err(|e| render_err("package timestamp", e))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(timestamp);

    let mut ids = 0u32;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| render_err("archive", e))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| render_err(&name, e))?;

        if name.ends_with(".xml") {
            let mut xml = String::from_utf8(data).map_err(|e| render_err(&name, e))?;
            if name == DOCUMENT_PART {
                xml = split_sections(&xml, front_paragraphs)?;
            }
            data = normalise(&name, &xml, &mut ids)?;
        }

        zip.start_file(name.as_str(), options)
            .map_err(|e| render_err(&name, e))?;
        zip.write_all(&data).map_err(|e| render_err(&name, e))?;
    }
    let cursor = zip.finish().map_err(|e| render_err("archive", e))?;
    Ok(cursor.into_inner())
}

#[derive(Debug, Clone, Copy)]
enum PageNumbering {
    LowerRoman,
    Decimal,
}

impl PageNumbering {
    fn fmt(self) -> &'static str {
        match self {
            PageNumbering::LowerRoman => "lowerRoman",
            PageNumbering::Decimal => "decimal",
        }
    }
}

/// Where the front section break goes while walking `word/document.xml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Split {
    Before,
    /// Inside the last front paragraph, before its first child.
    Opened,
    /// Inside that paragraph's `w:pPr`, opened at this depth.
    InProperties(usize),
    Done,
}

/// Close the front section on paragraph `front_paragraphs` of the body and
/// number both sections.
fn split_sections(xml: &str, front_paragraphs: usize) -> Result<String, AutodoxError> {
    let events = events(DOCUMENT_PART, xml)?;
    let body_range = body_section(&events)
        .ok_or_else(|| render_err(DOCUMENT_PART, "no body section properties"))?;
    let children = section_children(&events[body_range.clone()]);
    let front = section(children, PageNumbering::LowerRoman, Some("nextPage"));
    let body = section(children, PageNumbering::Decimal, None);

    let properties = |front: &[Event<'static>]| {
        let mut out = vec![Event::Start(BytesStart::new("w:pPr"))];
        out.extend(front.iter().cloned());
        out.push(Event::End(BytesEnd::new("w:pPr")));
        out
    };

    let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len() + 2 * front.len());
    let mut depth = 0usize;
    let mut paragraphs = 0usize;
    let mut state = Split::Before;

    for (index, event) in events.iter().enumerate() {
        if index == body_range.start {
            out.extend(body.iter().cloned());
        }
        if body_range.contains(&index) {
            continue;
        }

        match (state, event) {
            (Split::Opened, Event::Start(e)) if e.name().as_ref() == b"w:pPr" => {
                out.push(event.clone());
                depth += 1;
                state = Split::InProperties(depth);
                continue;
            }
            (Split::Opened, Event::Empty(e)) if e.name().as_ref() == b"w:pPr" => {
                out.push(Event::Start(e.clone()));
                out.extend(front.iter().cloned());
                out.push(Event::End(BytesEnd::new("w:pPr")));
                state = Split::Done;
                continue;
            }
            (Split::Opened, _) => {
                out.extend(properties(&front[..]));
                state = Split::Done;
            }
            (Split::InProperties(level), Event::End(_)) if depth == level => {
                out.extend(front.iter().cloned());
                state = Split::Done;
            }
            (Split::InProperties(level), Event::Start(e) | Event::Empty(e))
                if depth == level && e.local_name().as_ref() == b"pPrChange" =>
            {
                out.extend(front.iter().cloned());
                state = Split::Done;
            }
            _ => {}
        }

        match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 3 && e.name().as_ref() == b"w:p" {
                    paragraphs += 1;
                    if paragraphs == front_paragraphs {
                        state = Split::Opened;
                    }
                }
            }
            Event::Empty(e) if depth == 2 && e.name().as_ref() == b"w:p" => {
                paragraphs += 1;
                if paragraphs == front_paragraphs {
                    out.push(Event::Start(e.clone()));
                    out.extend(properties(&front[..]));
                    out.push(Event::End(BytesEnd::new("w:p")));
                    state = Split::Done;
                    continue;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        out.push(event.clone());
    }

    if state != Split::Done {
        return Err(render_err(
            DOCUMENT_PART,
            format!("front section needs {} paragraphs, found {}", front_paragraphs, paragraphs),
        ));
    }
    String::from_utf8(write_events(DOCUMENT_PART, out)?).map_err(|e| render_err(DOCUMENT_PART, e))
}

/// Range of the `w:sectPr` that is a direct child of `w:body`.
fn body_section(events: &[Event<'_>]) -> Option<Range<usize>> {
    let mut depth = 0usize;
    let mut start = None;
    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 3 && start.is_none() && e.name().as_ref() == b"w:sectPr" {
                    start = Some(index);
                }
            }
            Event::Empty(e) if depth == 2 && e.name().as_ref() == b"w:sectPr" => {
                return Some(index..index + 1);
            }
            Event::End(_) => {
                if depth == 3 {
                    if let Some(start) = start {
                        return Some(start..index + 1);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    None
}

fn section_children<'e, 'a>(section: &'e [Event<'a>]) -> &'e [Event<'a>] {
    if section.len() > 2 {
        &section[1..section.len() - 1]
    } else {
        &[]
    }
}

/// `w:sectPr` children after the header and footer references, in schema order.
const SECTION_ORDER: [&str; 20] = [
    "footnotePr",
    "endnotePr",
    "type",
    "pgSz",
    "pgMar",
    "paperSrc",
    "pgBorders",
    "lnNumType",
    "pgNumType",
    "cols",
    "formProt",
    "vAlign",
    "noEndnote",
    "titlePg",
    "textDirection",
    "bidi",
    "rtlGutter",
    "docGrid",
    "printerSettings",
    "sectPrChange",
];

fn section_rank(name: &str) -> usize {
    match name {
        "headerReference" | "footerReference" => 0,
        other => SECTION_ORDER
            .iter()
            .position(|n| *n == other)
            .map_or(SECTION_ORDER.len() + 1, |p| p + 1),
    }
}

/// Rebuild a `w:sectPr` from `children` with its own page numbering and,
/// when given, section type.
fn section(
    children: &[Event<'_>],
    numbering: PageNumbering,
    section_type: Option<&'static str>,
) -> Vec<Event<'static>> {
    let mut parts: Vec<(String, Vec<Event<'static>>)> = subtrees(children)
        .into_iter()
        .filter(|(name, _)| name != "pgNumType" && !(section_type.is_some() && name == "type"))
        .collect();

    parts.push((
        "pgNumType".to_string(),
        vec![Event::Empty(
            BytesStart::new("w:pgNumType")
                .with_attributes([("w:fmt", numbering.fmt()), ("w:start", "1")]),
        )],
    ));
    if let Some(kind) = section_type {
        parts.push((
            "type".to_string(),
            vec![Event::Empty(
                BytesStart::new("w:type").with_attributes([("w:val", kind)]),
            )],
        ));
    }
    parts.sort_by_key(|(name, _)| section_rank(name));

    let mut out = vec![Event::Start(BytesStart::new("w:sectPr"))];
    out.extend(parts.into_iter().flat_map(|(_, events)| events));
    out.push(Event::End(BytesEnd::new("w:sectPr")));
    out
}

/// Split a run of sibling elements into `(local name, events)` pairs.
fn subtrees(children: &[Event<'_>]) -> Vec<(String, Vec<Event<'static>>)> {
    let mut out: Vec<(String, Vec<Event<'static>>)> = Vec::new();
    let mut depth = 0usize;
    for event in children {
        match event {
            Event::Start(e) if depth == 0 => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                out.push((name, vec![event.clone().into_owned()]));
                depth += 1;
            }
            Event::Empty(e) if depth == 0 => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                out.push((name, vec![event.clone().into_owned()]));
            }
            _ if depth == 0 => {}
            _ => {
                if let Some((_, events)) = out.last_mut() {
                    events.push(event.clone().into_owned());
                }
                match event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => depth -= 1,
                    _ => {}
                }
            }
        }
    }
    out
}

/// Pin the values `docx-rs` generates per call: paragraph ids, the
/// settings document id and the core property dates.
fn normalise(part: &str, xml: &str, ids: &mut u32) -> Result<Vec<u8>, AutodoxError> {
    let mut out = Vec::new();
    let mut in_date = false;
    for event in events(part, xml)? {
        let event = match event {
            Event::Start(e) => {
                in_date = matches!(e.name().as_ref(), b"dcterms:created" | b"dcterms:modified");
                Event::Start(pin_attributes(part, e, ids)?)
            }
            Event::Empty(e) => Event::Empty(pin_attributes(part, e, ids)?),
            Event::Text(_) if in_date => Event::Text(BytesText::new(CORE_PROPS_DATE)),
            Event::End(e) => {
                in_date = false;
                Event::End(e)
            }
            other => other,
        };
        out.push(event);
    }
    write_events(part, out)
}

fn pin_attributes<'a>(
    part: &str,
    e: BytesStart<'a>,
    ids: &mut u32,
) -> Result<BytesStart<'a>, AutodoxError> {
    let doc_id = e.local_name().as_ref() == b"docId";
    let pinned = e
        .attributes()
        .flatten()
        .any(|a| matches!(a.key.local_name().as_ref(), b"paraId" | b"textId"));
    if !doc_id && !pinned {
        return Ok(e);
    }

    let mut el = e.clone();
    el.clear_attributes();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| render_err(part, err))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|err| render_err(part, err))?;
        let local = attr.key.local_name();
        if matches!(local.as_ref(), b"paraId" | b"textId") {
            *ids += 1;
            let value = format!("{:08X}", *ids);
            el.push_attribute((key, value.as_str()));
        } else if doc_id && local.as_ref() == b"val" {
            el.push_attribute((key, DOC_ID));
        } else {
            el.push_attribute(attr.clone());
        }
    }
    Ok(el)
}

fn events<'a>(part: &str, xml: &'a str) -> Result<Vec<Event<'a>>, AutodoxError> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event().map_err(|e| render_err(part, e))? {
            Event::Eof => return Ok(out),
            event => out.push(event),
        }
    }
}

fn write_events<'a>(
    part: &str,
    events: impl IntoIterator<Item = Event<'a>>,
) -> Result<Vec<u8>, AutodoxError> {
    let mut writer = Writer::new(Vec::new());
    for event in events {
        writer
            .write_event(event)
            .map_err(|e| render_err(part, e))?;
    }
    Ok(writer.into_inner())
}

fn render_err(part: &str, e: impl std::fmt::Display) -> AutodoxError {
    AutodoxError::RenderFailed(format!("{}: {}", part, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reference;
    use crate::pipeline::extract::extract_text;
    use std::io::Read;
    use zip::ZipArchive;

    fn entry(title: &str, page: u32) -> ListEntry {
        ListEntry {
            title: title.into(),
            page_number: page,
        }
    }

    fn reference(authors: &str, year: i32) -> Reference {
        Reference {
            authors: authors.into(),
            year,
            title: "Title".into(),
            source: "Source".into(),
        }
    }

    fn sample(roman: u32) -> StructuredDocument {
        StructuredDocument {
            table_of_contents: vec![entry("BAB I Pendahuluan", 1), entry("BAB II Tinjauan", 7)],
            figures: vec![entry("Gambar 1.1 Diagram", 3)],
            tables: vec![],
            appendices: vec![entry("Lampiran A", 40)],
            references: vec![
                reference("Smith", 2021),
                reference("Adams", 2019),
                reference("Smith", 2019),
            ],
            roman_page_count: roman,
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut s = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn front_section_has_roman_page_count_paragraphs() {
        let l = layout(&sample(3), &SectionLabels::default());
        assert_eq!(l.front.len(), 3);
        assert!(matches!(l.front[0], Block::Title(_)));
        assert_eq!(l.front[1], Block::Blank { page_break: true });
        assert_eq!(l.front[2], Block::Blank { page_break: true });
    }

    #[test]
    fn single_roman_page_is_title_only() {
        let l = layout(&sample(1), &SectionLabels::default());
        assert_eq!(l.front.len(), 1);
    }

    #[test]
    fn body_lists_in_fixed_order() {
        let l = layout(&sample(1), &SectionLabels::default());
        let headings: Vec<&str> = l
            .body
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec![
                "Daftar Isi",
                "Daftar Gambar",
                "Daftar Tabel",
                "Daftar Lampiran",
                "Daftar Pustaka"
            ]
        );
        assert_eq!(
            l.body[1],
            Block::Entry {
                title: "BAB I Pendahuluan".into(),
                page: 1
            }
        );
    }

    #[test]
    fn bibliography_rendered_in_sorted_order() {
        let l = layout(&sample(1), &SectionLabels::default());
        let refs: Vec<&str> = l
            .body
            .iter()
            .filter_map(|b| match b {
                Block::Reference(r) => Some(r.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            refs,
            vec![
                "Adams (2019). Title. Source.",
                "Smith (2019). Title. Source.",
                "Smith (2021). Title. Source.",
            ]
        );
    }

    #[test]
    fn document_xml_has_two_numbered_sections() {
        let bytes = render_document(&sample(2), &SectionLabels::default()).unwrap();
        let xml = read_part(&bytes, "word/document.xml");
        let roman = xml.find(r#"w:fmt="lowerRoman""#).expect("roman section");
        let decimal = xml.find(r#"w:fmt="decimal""#).expect("decimal section");
        assert!(roman < decimal);
        assert_eq!(xml.matches("<w:sectPr").count(), 2);
        assert_eq!(xml.matches(r#"<w:type w:val="nextPage"/>"#).count(), 1);
        assert_eq!(xml.matches("<w:footerReference").count(), 2);
        assert!(xml.contains(r#"w:val="Title""#));

        let front = &xml[..roman];
        let paragraphs = front.matches("<w:p>").count() + front.matches("<w:p ").count();
        assert_eq!(paragraphs, 2);
    }

    #[test]
    fn front_section_properties_follow_schema_order() {
        let bytes = render_document(&sample(3), &SectionLabels::default()).unwrap();
        let xml = read_part(&bytes, "word/document.xml");
        let start = xml.find("<w:sectPr").unwrap();
        let end = start + xml[start..].find("</w:sectPr>").unwrap();
        let front = &xml[start..end];
        let footer = front.find("<w:footerReference").unwrap();
        let kind = front.find("<w:type ").unwrap();
        let size = front.find("<w:pgSz").unwrap();
        let numbering = front.find("<w:pgNumType").unwrap();
        assert!(footer < kind && kind < size && size < numbering);
    }

    #[test]
    fn text_is_escaped() {
        let mut doc = sample(1);
        doc.figures = vec![entry("Signal <in> & out", 2)];
        let bytes = render_document(&doc, &SectionLabels::default()).unwrap();
        assert!(read_part(&bytes, "word/document.xml").contains("&amp;"));
        let text = extract_text(&bytes).unwrap().text;
        assert!(text.contains("Signal <in> & out.... 2"));
    }

    #[test]
    fn package_is_a_readable_docx() {
        let bytes = render_document(&sample(2), &SectionLabels::english()).unwrap();
        let text = extract_text(&bytes).unwrap().text;
        assert!(text.starts_with("AutoDOCx v2 - Formatted Document"));
        assert!(text.contains("Table of Contents"));
        assert!(text.contains("Gambar 1.1 Diagram.... 3"));
        assert!(read_part(&bytes, "[Content_Types].xml").contains("footer+xml"));

        let mut archive = ZipArchive::new(Cursor::new(&bytes)).unwrap();
        let footer = archive
            .file_names()
            .find(|n| n.starts_with("word/footer"))
            .map(str::to_string)
            .expect("footer part");
        let mut xml = String::new();
        archive.by_name(&footer).unwrap().read_to_string(&mut xml).unwrap();
        assert!(xml.contains("PAGE"));
        assert!(xml.contains("w:fldCharType=\"begin\""));
    }

    #[test]
    fn generated_ids_and_dates_are_pinned() {
        let bytes = render_document(&sample(1), &SectionLabels::default()).unwrap();
        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains(CORE_PROPS_DATE));
        let document = read_part(&bytes, "word/document.xml");
        if document.contains("paraId") {
            assert!(document.contains(r#"paraId="000000"#));
        }
    }

    #[test]
    fn packaging_is_deterministic() {
        let a = render_document(&sample(3), &SectionLabels::default()).unwrap();
        let b = render_document(&sample(3), &SectionLabels::default()).unwrap();
        assert_eq!(a, b);
    }
}
