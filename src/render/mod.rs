//! Rendering: handing a finished layout tree to one format-specific emitter.
//!
//! The set of output formats is closed. [`render`] matches on the
//! [`OutputFormat`] tag and forwards the document, layout tree and table of
//! contents to the corresponding [`Emitter`]; it performs no encoding itself.

mod docx;
mod html;
mod json;

pub use docx::DocxEmitter;
pub use html::HtmlEmitter;
pub use json::{to_json, JsonFormat};

use crate::error::{Error, Result};
use crate::model::{Document, LayoutTree, MarkerKind, TocEntry};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Office Open XML word-processing document
    Docx,
    /// Self-contained HTML page
    Html,
}

impl OutputFormat {
    /// All supported formats.
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Docx, OutputFormat::Html];

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }

    /// MIME type of the emitted bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Html => "text/html",
        }
    }

    /// Guess the format from an output path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "docx" => Some(OutputFormat::Docx),
            "html" | "htm" => Some(OutputFormat::Html),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    /// Parse a format tag such as `"DOCX"` or `"html"`.
    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_uppercase().as_str() {
            "DOCX" => Ok(OutputFormat::Docx),
            "HTML" | "HTM" => Ok(OutputFormat::Html),
            _ => Err(Error::UnsupportedFormat(tag.trim().to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Docx => "DOCX",
            OutputFormat::Html => "HTML",
        })
    }
}

/// A format-specific encoder of layout trees.
///
/// Emitters receive structures that are already consistent: every TOC anchor
/// exists in the layout tree and footnote numbers are unique and increasing.
pub trait Emitter {
    /// Format this emitter produces.
    fn format(&self) -> OutputFormat;

    /// Encode the output document.
    fn emit(&self, document: &Document, layout: &LayoutTree, toc: &[TocEntry]) -> Result<Vec<u8>>;
}

/// Encode a layout tree with the emitter for `format`.
pub fn render(
    format: OutputFormat,
    document: &Document,
    layout: &LayoutTree,
    toc: &[TocEntry],
) -> Result<Vec<u8>> {
    debug_assert!(toc.iter().all(|entry| layout.contains(entry.anchor)));
    log::debug!("Rendering {} ({} nodes)", format, layout.len());

    match format {
        OutputFormat::Docx => DocxEmitter::new().emit(document, layout, toc),
        OutputFormat::Html => HtmlEmitter::new().emit(document, layout, toc),
    }
}

/// Markers carrying book metadata rather than printable content.
const METADATA_TAGS: &[&str] = &["h", "toc", "toca", "ide", "usfm", "sts", "rem", "mt", "mte"];

/// Markers printed as section-level headings.
const HEADING_TAGS: &[&str] = &["s", "ms", "mr", "sr", "r", "d", "cl", "cp", "sp", "qa", "cd"];

/// How an `Other` node is presented by the emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OtherRole {
    Hidden,
    Heading,
    Block,
}

fn other_role(tag: &str) -> OtherRole {
    let base = tag.trim_end_matches(|c: char| c.is_ascii_digit());
    if METADATA_TAGS.contains(&base) {
        OtherRole::Hidden
    } else if HEADING_TAGS.contains(&base) {
        OtherRole::Heading
    } else {
        OtherRole::Block
    }
}

/// Whether a node starts a block of its own in the output.
fn is_block(kind: MarkerKind) -> bool {
    !kind.is_inline()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatConfig;
    use crate::layout::transform;
    use crate::model::{Marker, MarkerTree};

    #[test]
    fn test_format_tags() {
        assert_eq!("DOCX".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!(" Htm ".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
    }

    #[test]
    fn test_unsupported_format_tag() {
        let err = "PDF".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref tag) if tag == "PDF"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("out.DOCX"), Some(OutputFormat::Docx));
        assert_eq!(OutputFormat::from_path("out.htm"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::from_path("out.pdf"), None);
        assert_eq!(OutputFormat::from_path("out"), None);
    }

    #[test]
    fn test_format_display_roundtrip() {
        for format in OutputFormat::ALL {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
            assert!(!format.mime_type().is_empty());
        }
    }

    #[test]
    fn test_other_roles() {
        assert_eq!(other_role("toc1"), OtherRole::Hidden);
        assert_eq!(other_role("h"), OtherRole::Hidden);
        assert_eq!(other_role("s1"), OtherRole::Heading);
        assert_eq!(other_role("cp"), OtherRole::Heading);
        assert_eq!(other_role("b"), OtherRole::Block);
    }

    #[test]
    fn test_render_dispatches_to_emitter() {
        let mut tree = MarkerTree::new();
        let book = tree.add_root(Marker::book("JUD"));
        let chapter = tree.add_child(book, Marker::chapter(1));
        tree.add_child(chapter, Marker::text_run("Jude, a servant"));
        let mut doc = Document::new();
        doc.append("jud.usfm", tree);
        let layout = transform(&doc, &FormatConfig::default()).unwrap();

        let html = render(OutputFormat::Html, &doc, &layout, &[]).unwrap();
        assert!(String::from_utf8(html).unwrap().contains("Jude, a servant"));

        let docx = render(OutputFormat::Docx, &doc, &layout, &[]).unwrap();
        assert!(docx.starts_with(b"PK"));
    }
}
