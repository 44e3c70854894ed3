//! DOCX emitter.
//!
//! Produces a minimal WordprocessingML package: content types, package
//! relationships, styles, the main document part and, when the layout tree
//! has footnotes, a footnotes part. Anchors become bookmarks named after the
//! anchor (`a12`) so table-of-contents hyperlinks resolve inside Word.

use super::{other_role, Emitter, OtherRole, OutputFormat};
use crate::config::Alignment;
use crate::error::Result;
use crate::model::{Document, LayoutMetadata, LayoutNode, LayoutTree, MarkerKind, TocEntry};
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Twips per inch.
const TWIPS_PER_INCH: u32 = 1440;
/// Line height unit for `w:spacing/@w:line` with `lineRule="auto"`.
const SINGLE_LINE: f32 = 240.0;

/// Emits Office Open XML word-processing documents.
#[derive(Debug, Clone, Default)]
pub struct DocxEmitter {
    _private: (),
}

impl DocxEmitter {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Emitter for DocxEmitter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn emit(&self, document: &Document, layout: &LayoutTree, toc: &[TocEntry]) -> Result<Vec<u8>> {
        let mut body = BodyWriter::new(layout);
        body.toc(toc);
        for anchor in layout.roots() {
            if let Some(node) = layout.get(*anchor) {
                body.node(node);
            }
        }
        body.close_paragraph();

        let has_notes = !body.notes.is_empty();
        let document_xml = document_part(&body.out, &layout.metadata);
        let footnotes_xml = footnotes_part(&body.notes, &layout.metadata);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types(has_notes).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(package_rels().as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(core_properties(document).as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(document_rels(has_notes).as_bytes())?;

        zip.start_file("word/styles.xml", options)?;
        zip.write_all(styles_part(&layout.metadata).as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(document_xml.as_bytes())?;

        if has_notes {
            zip.start_file("word/footnotes.xml", options)?;
            zip.write_all(footnotes_xml.as_bytes())?;
        }

        let cursor = zip.finish()?;
        let bytes = cursor.into_inner();
        log::debug!("DOCX package: {} bytes, {} footnotes", bytes.len(), body.notes.len());
        Ok(bytes)
    }
}

/// Paragraph being filled with runs.
struct OpenParagraph {
    style: Option<&'static str>,
    page_break: bool,
    runs: String,
}

struct BodyWriter<'a> {
    layout: &'a LayoutTree,
    out: String,
    paragraph: Option<OpenParagraph>,
    notes: Vec<(u32, String)>,
}

impl<'a> BodyWriter<'a> {
    fn new(layout: &'a LayoutTree) -> Self {
        Self {
            layout,
            out: String::new(),
            paragraph: None,
            notes: Vec::new(),
        }
    }

    fn start_paragraph(&mut self, style: Option<&'static str>, page_break: bool) {
        self.close_paragraph();
        self.paragraph = Some(OpenParagraph {
            style,
            page_break,
            runs: String::new(),
        });
    }

    fn ensure_paragraph(&mut self) -> &mut OpenParagraph {
        self.paragraph.get_or_insert_with(|| OpenParagraph {
            style: None,
            page_break: false,
            runs: String::new(),
        })
    }

    fn close_paragraph(&mut self) {
        let Some(para) = self.paragraph.take() else {
            return;
        };
        let metadata = &self.layout.metadata;

        self.out.push_str("<w:p><w:pPr>");
        if let Some(style) = para.style {
            let _ = write!(self.out, "<w:pStyle w:val=\"{style}\"/>");
        }
        if para.page_break {
            self.out.push_str("<w:pageBreakBefore/>");
        }
        if metadata.direction.is_rtl() {
            self.out.push_str("<w:bidi/>");
        }
        if para.style.is_none() && metadata.alignment == Alignment::Justified {
            self.out.push_str("<w:jc w:val=\"both\"/>");
        }
        self.out.push_str("</w:pPr>");
        self.out.push_str(&para.runs);
        self.out.push_str("</w:p>");
    }

    fn text(&mut self, text: &str, style: Option<&str>) {
        let para = self.ensure_paragraph();
        para.runs.push_str("<w:r>");
        if let Some(style) = style {
            let _ = write!(para.runs, "<w:rPr><w:rStyle w:val=\"{style}\"/></w:rPr>");
        }
        let _ = write!(
            para.runs,
            "<w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape(text)
        );
    }

    fn bookmark(&mut self, node: &LayoutNode) {
        let id = node.anchor.value();
        let para = self.ensure_paragraph();
        let _ = write!(
            para.runs,
            "<w:bookmarkStart w:id=\"{id}\" w:name=\"{}\"/><w:bookmarkEnd w:id=\"{id}\"/>",
            node.anchor
        );
    }

    fn toc(&mut self, toc: &[TocEntry]) {
        if toc.is_empty() {
            return;
        }
        self.start_paragraph(Some("TOCHeading"), false);
        self.text("Contents", None);

        for entry in toc {
            let style = if entry.level == 0 { "TOC1" } else { "TOC2" };
            self.start_paragraph(Some(style), false);
            let para = self.ensure_paragraph();
            let _ = write!(
                para.runs,
                "<w:hyperlink w:anchor=\"{}\" w:history=\"1\"><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:hyperlink>",
                entry.anchor,
                escape(entry.title.as_str())
            );
        }

        self.start_paragraph(None, false);
        self.ensure_paragraph()
            .runs
            .push_str("<w:r><w:br w:type=\"page\"/></w:r>");
        self.close_paragraph();
    }

    fn children(&mut self, node: &LayoutNode) {
        let layout = self.layout;
        for child in layout.children(node) {
            self.node(child);
        }
    }

    /// Notes under hidden markers still get their reference mark.
    fn hidden_notes(&mut self, node: &LayoutNode) {
        let layout = self.layout;
        for child in layout.children(node) {
            match child.kind {
                MarkerKind::Footnote => self.node(child),
                _ => self.hidden_notes(child),
            }
        }
    }

    fn node(&mut self, node: &LayoutNode) {
        match node.kind {
            MarkerKind::Book => {
                self.start_paragraph(Some("Heading1"), false);
                self.bookmark(node);
                self.text(node.title.as_deref().unwrap_or_default(), None);
                self.close_paragraph();
                self.children(node);
                self.close_paragraph();
            }
            MarkerKind::Chapter => {
                self.start_paragraph(Some("Heading2"), node.break_before);
                self.bookmark(node);
                self.text(node.title.as_deref().unwrap_or_default(), None);
                self.close_paragraph();
                self.children(node);
                self.close_paragraph();
            }
            MarkerKind::Paragraph => {
                self.start_paragraph(None, false);
                self.children(node);
                self.close_paragraph();
            }
            MarkerKind::Verse => {
                let para = self.ensure_paragraph();
                if node.break_before && !para.runs.is_empty() {
                    para.runs.push_str("<w:r><w:br/></w:r>");
                }
                let number = format!("{} ", node.number.unwrap_or_default());
                self.text(&number, Some("VerseNumber"));
                self.children(node);
            }
            MarkerKind::TextRun => {
                self.text(&format!("{} ", node.text_or_empty()), None);
            }
            MarkerKind::Footnote => {
                let number = node.footnote_number.unwrap_or_default();
                let para = self.ensure_paragraph();
                let _ = write!(
                    para.runs,
                    "<w:r><w:rPr><w:rStyle w:val=\"FootnoteReference\"/></w:rPr><w:footnoteReference w:id=\"{number}\"/></w:r>"
                );
                self.notes.push((number, node.text_or_empty().to_string()));
            }
            MarkerKind::CrossReference => {
                self.text(&format!("({}) ", node.text_or_empty()), None);
            }
            MarkerKind::Other => match other_role(&node.tag) {
                OtherRole::Hidden => self.hidden_notes(node),
                OtherRole::Heading => {
                    self.start_paragraph(Some("Heading3"), false);
                    self.text(node.text_or_empty(), None);
                    self.children(node);
                    self.close_paragraph();
                }
                OtherRole::Block => {
                    self.start_paragraph(None, false);
                    if let Some(text) = node.text.as_deref() {
                        self.text(&format!("{} ", text), None);
                    }
                    self.children(node);
                    self.close_paragraph();
                }
            },
        }
    }
}

fn content_types(has_notes: bool) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>",
    );
    if has_notes {
        xml.push_str(
            "<Override PartName=\"/word/footnotes.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml\"/>",
        );
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"{REL_NS}/officeDocument\" Target=\"word/document.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
</Relationships>"
    )
}

fn document_rels(has_notes: bool) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"{REL_NS}/styles\" Target=\"styles.xml\"/>"
    );
    if has_notes {
        let _ = write!(
            xml,
            "<Relationship Id=\"rId2\" Type=\"{REL_NS}/footnotes\" Target=\"footnotes.xml\"/>"
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_properties(document: &Document) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
<dc:title>{}</dc:title><dc:subject>{}</dc:subject></cp:coreProperties>",
        escape(document.metadata.display_title()),
        escape(document.metadata.books.join(" ").as_str())
    )
}

fn styles_part(metadata: &LayoutMetadata) -> String {
    let half_points = metadata.text_size.points() * 2;
    let line = (SINGLE_LINE * metadata.line_spacing.factor()).round() as u32;
    let rtl = if metadata.direction.is_rtl() { "<w:rtl/>" } else { "" };

    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<w:styles xmlns:w=\"{WML_NS}\">\
<w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/>{rtl}</w:rPr></w:rPrDefault>\
<w:pPrDefault><w:pPr><w:spacing w:after=\"120\" w:line=\"{line}\" w:lineRule=\"auto\"/></w:pPr></w:pPrDefault></w:docDefaults>\
<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>"
    );

    for (id, name, scale) in [
        ("Heading1", "heading 1", 2.0),
        ("Heading2", "heading 2", 1.5),
        ("Heading3", "heading 3", 1.2),
        ("TOCHeading", "TOC Heading", 1.5),
    ] {
        let size = (half_points as f32 * scale).round() as u32;
        let _ = write!(
            xml,
            "<w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{name}\"/><w:basedOn w:val=\"Normal\"/>\
<w:next w:val=\"Normal\"/><w:pPr><w:keepNext/><w:spacing w:before=\"240\"/></w:pPr><w:rPr><w:b/><w:sz w:val=\"{size}\"/></w:rPr></w:style>"
        );
    }

    for (id, name, indent) in [("TOC1", "toc 1", 0), ("TOC2", "toc 2", TWIPS_PER_INCH / 4)] {
        let _ = write!(
            xml,
            "<w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{name}\"/><w:basedOn w:val=\"Normal\"/>\
<w:pPr><w:ind w:left=\"{indent}\"/></w:pPr></w:style>"
        );
    }

    xml.push_str(
        "<w:style w:type=\"paragraph\" w:styleId=\"FootnoteText\"><w:name w:val=\"footnote text\"/><w:basedOn w:val=\"Normal\"/>\
<w:rPr><w:sz w:val=\"18\"/></w:rPr></w:style>\
<w:style w:type=\"character\" w:styleId=\"FootnoteReference\"><w:name w:val=\"footnote reference\"/><w:rPr><w:vertAlign w:val=\"superscript\"/></w:rPr></w:style>\
<w:style w:type=\"character\" w:styleId=\"VerseNumber\"><w:name w:val=\"Verse Number\"/><w:rPr><w:b/><w:vertAlign w:val=\"superscript\"/></w:rPr></w:style>\
</w:styles>",
    );
    xml
}

fn document_part(body: &str, metadata: &LayoutMetadata) -> String {
    let margin = TWIPS_PER_INCH;
    let bidi = if metadata.direction.is_rtl() { "<w:bidi/>" } else { "" };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<w:document xmlns:w=\"{WML_NS}\" xmlns:r=\"{REL_NS}\"><w:body>{body}\
<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/>\
<w:pgMar w:top=\"{margin}\" w:right=\"{margin}\" w:bottom=\"{margin}\" w:left=\"{margin}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/>\
<w:cols w:num=\"{}\" w:space=\"720\"/>{bidi}</w:sectPr></w:body></w:document>",
        metadata.column_count
    )
}

fn footnotes_part(notes: &[(u32, String)], metadata: &LayoutMetadata) -> String {
    let bidi = if metadata.direction.is_rtl() { "<w:bidi/>" } else { "" };
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<w:footnotes xmlns:w=\"{WML_NS}\">\
<w:footnote w:type=\"separator\" w:id=\"-1\"><w:p><w:r><w:separator/></w:r></w:p></w:footnote>\
<w:footnote w:type=\"continuationSeparator\" w:id=\"0\"><w:p><w:r><w:continuationSeparator/></w:r></w:p></w:footnote>"
    );
    for (number, body) in notes {
        let _ = write!(
            xml,
            "<w:footnote w:id=\"{number}\"><w:p><w:pPr><w:pStyle w:val=\"FootnoteText\"/>{bidi}</w:pPr>\
<w:r><w:rPr><w:rStyle w:val=\"FootnoteReference\"/></w:rPr><w:footnoteRef/></w:r>\
<w:r><w:t xml:space=\"preserve\"> {}</w:t></w:r></w:p></w:footnote>",
            escape(body.as_str())
        );
    }
    xml.push_str("</w:footnotes>");
    xml
}
