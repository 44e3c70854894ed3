//! HTML emitter.

use super::{is_block, other_role, Emitter, OtherRole, OutputFormat};
use crate::config::Alignment;
use crate::error::Result;
use crate::model::{Document, LayoutMetadata, LayoutNode, LayoutTree, MarkerKind, TocEntry};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Emits a single self-contained HTML page.
///
/// Anchors become element ids (`id="a12"`), so table-of-contents links and
/// content always agree. Layout metadata is expressed as CSS.
#[derive(Debug, Clone, Default)]
pub struct HtmlEmitter {
    _private: (),
}

impl HtmlEmitter {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Render the page as a string.
    pub fn render_string(&self, document: &Document, layout: &LayoutTree, toc: &[TocEntry]) -> String {
        let mut writer = HtmlWriter::new(layout);
        writer.head(document, &layout.metadata);
        writer.toc(toc);
        writer.out.push_str("<main>\n");
        for anchor in layout.roots() {
            if let Some(node) = layout.get(*anchor) {
                writer.node(node);
            }
        }
        writer.out.push_str("</main>\n");
        writer.footnotes();
        writer.out.push_str("</body>\n</html>\n");
        writer.out
    }
}

impl Emitter for HtmlEmitter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn emit(&self, document: &Document, layout: &LayoutTree, toc: &[TocEntry]) -> Result<Vec<u8>> {
        Ok(self.render_string(document, layout, toc).into_bytes())
    }
}

struct HtmlWriter<'a> {
    layout: &'a LayoutTree,
    out: String,
    notes: Vec<(u32, String)>,
}

impl<'a> HtmlWriter<'a> {
    fn new(layout: &'a LayoutTree) -> Self {
        Self {
            layout,
            out: String::new(),
            notes: Vec::new(),
        }
    }

    fn head(&mut self, document: &Document, metadata: &LayoutMetadata) {
        let dir = if metadata.direction.is_rtl() { "rtl" } else { "ltr" };
        let align = match metadata.alignment {
            Alignment::Left => "start",
            Alignment::Justified => "justify",
        };

        // Writing into a String cannot fail
        let _ = write!(
            self.out,
            "<!DOCTYPE html>\n<html dir=\"{dir}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n\
body {{ font-size: {size}pt; line-height: {spacing}; text-align: {align}; }}\n\
main {{ column-count: {columns}; }}\n\
.chapter.break {{ break-before: page; page-break-before: always; }}\n\
.verse.break {{ display: block; }}\n\
.verse-number, .footnote-ref {{ font-size: 0.7em; vertical-align: super; }}\n\
.toc-level-1 {{ margin-left: 1.5em; }}\n\
</style>\n</head>\n<body>\n",
            title = escape(document.metadata.display_title()),
            size = metadata.text_size.points(),
            spacing = metadata.line_spacing.factor(),
            columns = metadata.column_count,
        );
    }

    fn toc(&mut self, toc: &[TocEntry]) {
        if toc.is_empty() {
            return;
        }
        self.out
            .push_str("<nav class=\"toc\">\n<h2>Contents</h2>\n<ul>\n");
        for entry in toc {
            let _ = writeln!(
                self.out,
                "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
                entry.level,
                entry.anchor,
                escape(entry.title.as_str())
            );
        }
        self.out.push_str("</ul>\n</nav>\n");
    }

    fn children(&mut self, node: &LayoutNode) {
        let layout = self.layout;
        for child in layout.children(node) {
            self.node(child);
        }
    }

    fn node(&mut self, node: &LayoutNode) {
        let anchor = node.anchor;
        let brk = if node.break_before { " break" } else { "" };

        match node.kind {
            MarkerKind::Book => {
                let _ = writeln!(self.out, "<section class=\"book\" id=\"{anchor}\">");
                let title = node.title.as_deref().unwrap_or_default();
                let _ = writeln!(self.out, "<h1 class=\"book-title\">{}</h1>", escape(title));
                self.children(node);
                self.out.push_str("</section>\n");
            }
            MarkerKind::Chapter => {
                let title = node.title.as_deref().unwrap_or_default();
                let _ = writeln!(
                    self.out,
                    "<h2 class=\"chapter{brk}\" id=\"{anchor}\">{}</h2>",
                    escape(title)
                );
                self.children(node);
            }
            MarkerKind::Paragraph => {
                let _ = write!(
                    self.out,
                    "<p class=\"{}\" id=\"{anchor}\">",
                    escape(node.tag.as_str())
                );
                self.children(node);
                self.out.push_str("</p>\n");
            }
            MarkerKind::Verse => {
                let _ = write!(
                    self.out,
                    "<span class=\"verse{brk}\" id=\"{anchor}\"><span class=\"verse-number\">{}</span> ",
                    node.number.unwrap_or_default()
                );
                self.children(node);
                self.out.push_str("</span>");
            }
            MarkerKind::TextRun => {
                let _ = write!(self.out, "{} ", escape(node.text_or_empty()));
            }
            MarkerKind::Footnote => {
                let number = node.footnote_number.unwrap_or_default();
                let _ = write!(
                    self.out,
                    "<a class=\"footnote-ref\" href=\"#fn{number}\" id=\"fnref{number}\">{number}</a> "
                );
                self.notes.push((number, node.text_or_empty().to_string()));
            }
            MarkerKind::CrossReference => {
                let _ = write!(
                    self.out,
                    "<span class=\"xref\" id=\"{anchor}\">({})</span> ",
                    escape(node.text_or_empty())
                );
            }
            MarkerKind::Other => self.other(node),
        }
    }

    fn other(&mut self, node: &LayoutNode) {
        let class = escape(node.tag.as_str()).into_owned();
        match other_role(&node.tag) {
            OtherRole::Hidden => self.hidden_notes(node),
            OtherRole::Heading => {
                let _ = write!(
                    self.out,
                    "<h3 class=\"{class}\" id=\"{}\">{}",
                    node.anchor,
                    escape(node.text_or_empty())
                );
                self.children(node);
                self.out.push_str("</h3>\n");
            }
            OtherRole::Block => {
                let _ = write!(self.out, "<div class=\"{class}\" id=\"{}\">", node.anchor);
                if let Some(text) = node.text.as_deref() {
                    let _ = write!(self.out, "{} ", escape(text));
                }
                let inline_only = self.layout.children(node).all(|c| !is_block(c.kind));
                if !inline_only {
                    self.out.push('\n');
                }
                self.children(node);
                self.out.push_str("</div>\n");
            }
        }
    }

    /// Hidden markers print nothing, but the notes inside them keep their numbers.
    fn hidden_notes(&mut self, node: &LayoutNode) {
        let layout = self.layout;
        for child in layout.children(node) {
            if child.kind == MarkerKind::Footnote {
                self.node(child);
            } else {
                self.hidden_notes(child);
            }
        }
    }

    fn footnotes(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        self.out
            .push_str("<section class=\"footnotes\">\n<ol>\n");
        for (number, body) in &self.notes {
            let _ = writeln!(
                self.out,
                "<li id=\"fn{number}\" value=\"{number}\">{} <a href=\"#fnref{number}\">&#8617;</a></li>",
                escape(body.as_str())
            );
        }
        self.out.push_str("</ol>\n</section>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FormatConfig, RawOptions};
    use crate::layout::{build_toc, transform};
    use crate::model::{Marker, MarkerTree};

    fn sample() -> Document {
        let mut tree = MarkerTree::new();
        let book = tree.add_root(Marker::book("PHM"));
        tree.add_child(book, Marker::other("h").with_text("Philemon"));
        let chapter = tree.add_child(book, Marker::chapter(1));
        tree.add_child(chapter, Marker::other("s1").with_text("Greeting"));
        let para = tree.add_child(chapter, Marker::paragraph());
        let verse = tree.add_child(para, Marker::verse(1));
        tree.add_child(verse, Marker::text_run("Paul, a prisoner <of> Christ"));
        tree.add_child(verse, Marker::footnote("Or bondservant"));
        tree.add_child(verse, Marker::cross_reference("Eph 3:1"));
        let mut doc = Document::new();
        doc.append("phm.usfm", tree);
        doc
    }

    fn render(raw: RawOptions) -> String {
        let config = FormatConfig::build(&raw).unwrap();
        let doc = sample();
        let layout = transform(&doc, &config).unwrap();
        let toc = build_toc(&layout, &config);
        HtmlEmitter::new().render_string(&doc, &layout, &toc)
    }

    #[test]
    fn test_basic_structure() {
        let html = render(RawOptions::new());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Philemon</title>"));
        assert!(html.contains("<h1 class=\"book-title\">Philemon</h1>"));
        assert!(html.contains("<h2 class=\"chapter\" id=\"a2\">Chapter 1</h2>"));
        assert!(html.contains("<h3 class=\"s1\" id=\"a3\">Greeting</h3>"));
        assert!(html.contains("Paul, a prisoner &lt;of&gt; Christ"));
        assert!(html.contains("(Eph 3:1)"));
        assert!(!html.contains("class=\"toc\""));
        assert!(!html.contains("footnotes"));
    }

    #[test]
    fn test_layout_metadata_as_css() {
        let html = render(
            RawOptions::new()
                .with_text_size("large")
                .with_line_spacing("double")
                .with_justified(true)
                .with_columns(2)
                .with_left_to_right(false),
        );
        assert!(html.contains("<html dir=\"rtl\">"));
        assert!(html.contains("font-size: 14pt"));
        assert!(html.contains("line-height: 2"));
        assert!(html.contains("text-align: justify"));
        assert!(html.contains("column-count: 2"));
    }

    #[test]
    fn test_toc_links_match_anchors() {
        let html = render(RawOptions::new().with_table_of_contents(true));
        assert!(html.contains("<li class=\"toc-level-0\"><a href=\"#a0\">Philemon</a></li>"));
        assert!(html.contains("<li class=\"toc-level-1\"><a href=\"#a2\">Chapter 1</a></li>"));
        assert!(html.contains("id=\"a0\""));
    }

    #[test]
    fn test_footnotes_and_breaks() {
        let html = render(
            RawOptions::new()
                .with_footnotes(true)
                .with_chapter_break(true)
                .with_verse_break(true),
        );
        assert!(html.contains("class=\"chapter break\""));
        assert!(html.contains("class=\"verse break\""));
        assert!(html.contains("href=\"#fn1\" id=\"fnref1\""));
        assert!(html.contains("<li id=\"fn1\" value=\"1\">Or bondservant"));
    }

    #[test]
    fn test_note_in_title_line_is_listed() {
        use crate::parser::{MarkerParser, UsfmParser};

        let source = "\\id GEN\n\\mt1 Genesis\\f + \\ft title note\\f*\n\\c 1\n\\p\n\\v 1 In the beginning\\f + \\ft verse note\\f*\n";
        let mut doc = Document::new();
        doc.append("gen.usfm", UsfmParser::new().parse(source).unwrap());
        let config = FormatConfig::build(&RawOptions::new().with_footnotes(true)).unwrap();
        let layout = transform(&doc, &config).unwrap();
        let html = HtmlEmitter::new().render_string(&doc, &layout, &[]);

        assert_eq!(layout.footnote_count(), 2);
        assert!(html.contains("<li id=\"fn1\" value=\"1\">title note"));
        assert!(html.contains("<li id=\"fn2\" value=\"2\">verse note"));
        assert!(html.contains("href=\"#fn1\" id=\"fnref1\""));
    }

    #[test]
    fn test_emitter_format() {
        assert_eq!(HtmlEmitter::new().format(), OutputFormat::Html);
    }
}
