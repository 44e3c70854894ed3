//! # usfmconv
//!
//! Converts marked-up scripture files (USFM) into DOCX and HTML documents.
//!
//! Input files are parsed independently, merged in the given order into one
//! document, and transformed in a single pass into a layout tree carrying
//! anchors, break points, footnote numbers and page-level metadata. A table
//! of contents is derived from the layout tree, and one emitter turns the
//! three structures into output bytes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use usfmconv::{RawOptions, Usfmconv};
//!
//! fn main() -> usfmconv::Result<()> {
//!     let options = RawOptions::new()
//!         .with_chapter_break(true)
//!         .with_footnotes(true)
//!         .with_table_of_contents(true);
//!
//!     let conversion = Usfmconv::new()
//!         .with_options(options)
//!         .assemble(&["08-RUT.usfm", "57-PHM.usfm"])?;
//!
//!     std::fs::write("bible.html", conversion.to_html()?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Ordered merging**: books and chapters keep input-file order
//! - **Global numbering**: footnotes numbered once across all files
//! - **Stable anchors**: TOC links and content share one anchor space
//! - **Two formats**: DOCX packages and self-contained HTML pages
//! - **Progress and cancellation**: per-file progress reports

pub mod assemble;
pub mod config;
pub mod convert;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use assemble::{
    Assembler, CancellationToken, ChannelObserver, DuplicateBookPolicy, NoProgress,
    ProgressObserver,
};
pub use config::{Alignment, Direction, FormatConfig, LineSpacing, RawOptions, TextSize};
pub use convert::{convert, ConvertRequest, ConvertSummary};
pub use detect::{collect_input_files, detect_book_code, is_supported_input};
pub use error::{Error, Result};
pub use layout::{build_toc, transform};
pub use model::{
    AnchorId, Document, DocumentStats, LayoutMetadata, LayoutNode, LayoutTree, Marker,
    MarkerKind, MarkerTree, Metadata, NodeId, TocEntry,
};
pub use parser::{MarkerParser, ParseError, ParseOptions, UsfmParser};
pub use render::{render, DocxEmitter, Emitter, HtmlEmitter, JsonFormat, OutputFormat};

use std::path::Path;

/// Parse a single USFM file into a one-file document.
///
/// # Example
///
/// ```no_run
/// use usfmconv::parse_file;
///
/// let doc = parse_file("08-RUT.usfm").unwrap();
/// println!("Books: {:?}", doc.metadata.books);
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Assembler::new().assemble(&[path], &mut NoProgress)
}

/// Parse USFM source text into a one-file document named `name`.
pub fn parse_str(name: &str, source: &str) -> Result<Document> {
    Assembler::new().assemble_sources(&[(name, source)], &mut NoProgress)
}

/// Convert files to an HTML string with the given options.
pub fn to_html<P: AsRef<Path>>(files: &[P], options: &RawOptions) -> Result<String> {
    let conversion = Usfmconv::new().with_options(options.clone()).assemble(files)?;
    Ok(conversion.html_string())
}

/// Convert files to DOCX bytes with the given options.
pub fn to_docx<P: AsRef<Path>>(files: &[P], options: &RawOptions) -> Result<Vec<u8>> {
    Usfmconv::new()
        .with_options(options.clone())
        .assemble(files)?
        .to_docx()
}

/// Builder for in-memory conversions.
///
/// # Example
///
/// ```no_run
/// use usfmconv::{DuplicateBookPolicy, Usfmconv};
///
/// let html = Usfmconv::new()
///     .with_duplicate_policy(DuplicateBookPolicy::Reject)
///     .assemble(&["41-MAT.usfm"])?
///     .to_html()?;
/// # Ok::<(), usfmconv::Error>(())
/// ```
pub struct Usfmconv {
    options: RawOptions,
    parse_options: ParseOptions,
    duplicate_policy: DuplicateBookPolicy,
}

impl Usfmconv {
    /// Create a new builder with default formatting.
    pub fn new() -> Self {
        Self {
            options: RawOptions::default(),
            parse_options: ParseOptions::default(),
            duplicate_policy: DuplicateBookPolicy::default(),
        }
    }

    /// Set formatting selectors.
    pub fn with_options(mut self, options: RawOptions) -> Self {
        self.options = options;
        self
    }

    /// Set parser options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Set the duplicate book policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicateBookPolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Assemble and lay out files.
    pub fn assemble<P: AsRef<Path>>(self, files: &[P]) -> Result<Conversion> {
        self.assemble_with_progress(files, &mut NoProgress)
    }

    /// Assemble and lay out files, reporting progress per file.
    pub fn assemble_with_progress<P: AsRef<Path>>(
        self,
        files: &[P],
        observer: &mut dyn ProgressObserver,
    ) -> Result<Conversion> {
        let config = FormatConfig::build(&self.options)?;
        let document = self.assembler().assemble(files, observer)?;
        Conversion::new(document, config)
    }

    /// Assemble and lay out in-memory sources.
    pub fn assemble_sources<N, S>(self, sources: &[(N, S)]) -> Result<Conversion>
    where
        N: AsRef<Path>,
        S: AsRef<str>,
    {
        let config = FormatConfig::build(&self.options)?;
        let document = self.assembler().assemble_sources(sources, &mut NoProgress)?;
        Conversion::new(document, config)
    }

    fn assembler(&self) -> Assembler {
        Assembler::new()
            .with_parser(UsfmParser::with_options(self.parse_options.clone()))
            .with_duplicate_policy(self.duplicate_policy)
    }
}

impl Default for Usfmconv {
    fn default() -> Self {
        Self::new()
    }
}

/// An assembled document with its layout tree and table of contents.
pub struct Conversion {
    /// The merged document
    pub document: Document,
    /// Layout produced by the transform
    pub layout: LayoutTree,
    /// Table of contents (empty when disabled)
    pub toc: Vec<TocEntry>,
}

impl Conversion {
    fn new(document: Document, config: FormatConfig) -> Result<Self> {
        let layout = transform(&document, &config)?;
        let toc = build_toc(&layout, &config);
        Ok(Self {
            document,
            layout,
            toc,
        })
    }

    /// Encode with the emitter for `format`.
    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>> {
        render(format, &self.document, &self.layout, &self.toc)
    }

    /// Render as an HTML page.
    pub fn to_html(&self) -> Result<Vec<u8>> {
        self.render(OutputFormat::Html)
    }

    /// Render as a DOCX package.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        self.render(OutputFormat::Docx)
    }

    /// Render as an HTML string.
    pub fn html_string(&self) -> String {
        HtmlEmitter::new().render_string(&self.document, &self.layout, &self.toc)
    }

    /// Dump the layout tree and table of contents as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.layout, &self.toc, format)
    }

    /// Document statistics.
    pub fn stats(&self) -> DocumentStats {
        self.document.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JONAH: &str = "\\id JON\n\\h Jonah\n\\c 1\n\\p\n\\v 1 Now the word of the Lord came\n\\v 2 Arise \\f + \\ft Or Get up\\f*go\n\\c 2\n\\p\n\\v 1 Then Jonah prayed\n";

    #[test]
    fn test_parse_str() {
        let doc = parse_str("jon.usfm", JONAH).unwrap();
        assert_eq!(doc.metadata.books, vec!["JON"]);
        assert_eq!(doc.file_count(), 1);
    }

    #[test]
    fn test_builder_produces_consistent_toc() {
        let conversion = Usfmconv::new()
            .with_options(RawOptions::new().with_table_of_contents(true).with_footnotes(true))
            .assemble_sources(&[("jon.usfm", JONAH)])
            .unwrap();

        assert_eq!(conversion.toc.len(), 3);
        assert_eq!(conversion.toc[0].title, "Jonah");
        assert!(conversion.toc.iter().all(|e| conversion.layout.contains(e.anchor)));
        assert_eq!(conversion.layout.footnote_count(), 1);
    }

    #[test]
    fn test_builder_rejects_bad_options_first() {
        let result = Usfmconv::new()
            .with_options(RawOptions::new().with_columns(0))
            .assemble(&["does-not-exist.usfm"]);
        assert!(matches!(result, Err(Error::InvalidOption { .. })));
    }

    #[test]
    fn test_conversion_outputs() {
        let conversion = Usfmconv::new()
            .assemble_sources(&[("jon.usfm", JONAH)])
            .unwrap();
        assert!(conversion.html_string().contains("Then Jonah prayed"));
        assert!(conversion.to_docx().unwrap().starts_with(b"PK"));
        assert!(conversion.to_json(JsonFormat::Compact).unwrap().starts_with('{'));
        assert_eq!(conversion.stats().verse_count, 3);
    }
}
