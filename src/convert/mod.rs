//! End-to-end conversion: input files to one output document.
//!
//! The pipeline runs in a fixed order and stops at the first failure:
//! format tag, formatting configuration, output permission check, assembly,
//! layout transform, table of contents, rendering and finally the write.
//! An unsupported format or invalid option is reported before any input is
//! read and before the output is touched.
//!
//! # Example
//!
//! ```no_run
//! use usfmconv::assemble::NoProgress;
//! use usfmconv::config::RawOptions;
//! use usfmconv::convert::{convert, ConvertRequest};
//!
//! fn main() -> usfmconv::Result<()> {
//!     let request = ConvertRequest::new(["01-GEN.usfm", "02-EXO.usfm"], "bible.docx")
//!         .with_format("DOCX")
//!         .with_options(RawOptions::new().with_chapter_break(true));
//!     let summary = convert(&request, &mut NoProgress)?;
//!     println!("wrote {} bytes", summary.bytes_written);
//!     Ok(())
//! }
//! ```

use crate::assemble::{Assembler, CancellationToken, DuplicateBookPolicy, ProgressObserver};
use crate::config::{FormatConfig, RawOptions};
use crate::error::{Error, Result};
use crate::layout::{build_toc, transform};
use crate::model::DocumentStats;
use crate::parser::{ParseOptions, UsfmParser};
use crate::render::{render, OutputFormat};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Everything needed for one conversion.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Input files, in merge order
    pub files: Vec<PathBuf>,

    /// Output document path
    pub output: PathBuf,

    /// Output format tag, e.g. `"DOCX"` or `"HTML"`
    pub format: String,

    /// Unvalidated formatting selectors
    pub options: RawOptions,

    /// Parser options for the input files
    pub parse_options: ParseOptions,

    pub duplicate_policy: DuplicateBookPolicy,

    pub cancellation: Option<CancellationToken>,
}

impl ConvertRequest {
    /// Create a request; the format defaults to the output path's extension,
    /// falling back to DOCX.
    pub fn new<I, P>(files: I, output: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let output = output.into();
        let format = OutputFormat::from_path(&output).unwrap_or(OutputFormat::Docx);
        Self {
            files: files.into_iter().map(Into::into).collect(),
            output,
            format: format.to_string(),
            options: RawOptions::default(),
            parse_options: ParseOptions::default(),
            duplicate_policy: DuplicateBookPolicy::default(),
            cancellation: None,
        }
    }

    /// Set the output format tag.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
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

    /// Allow the conversion to be cancelled between input files.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub bytes_written: usize,
    pub stats: DocumentStats,
    pub toc_entries: usize,
    pub footnotes: u32,
}

/// Run the whole conversion pipeline.
pub fn convert(
    request: &ConvertRequest,
    observer: &mut dyn ProgressObserver,
) -> Result<ConvertSummary> {
    let format: OutputFormat = request.format.parse()?;
    let config = FormatConfig::build(&request.options)?;

    let existed = request.output.exists();
    check_write_permission(&request.output)?;

    let result = run(request, format, &config, observer);
    if result.is_err() && !existed {
        // Leave no empty output behind from the permission check
        if let Err(e) = fs::remove_file(&request.output) {
            log::warn!("Could not remove {}: {}", request.output.display(), e);
        }
    }
    result
}

fn run(
    request: &ConvertRequest,
    format: OutputFormat,
    config: &FormatConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<ConvertSummary> {
    let mut assembler = Assembler::new()
        .with_parser(UsfmParser::with_options(request.parse_options.clone()))
        .with_duplicate_policy(request.duplicate_policy);
    if let Some(token) = &request.cancellation {
        assembler = assembler.with_cancellation(token.clone());
    }

    let document = assembler.assemble(&request.files, observer)?;
    let layout = transform(&document, config)?;
    let toc = build_toc(&layout, config);
    let bytes = render(format, &document, &layout, &toc)?;

    fs::write(&request.output, &bytes).map_err(|source| write_error(&request.output, source))?;

    log::info!(
        "Wrote {} ({} bytes, {} TOC entries, {} footnotes)",
        request.output.display(),
        bytes.len(),
        toc.len(),
        layout.footnote_count()
    );

    Ok(ConvertSummary {
        output: request.output.clone(),
        format,
        bytes_written: bytes.len(),
        stats: document.stats(),
        toc_entries: toc.len(),
        footnotes: layout.footnote_count(),
    })
}

fn write_error(path: &Path, source: io::Error) -> Error {
    let path = path.to_path_buf();
    match source.kind() {
        io::ErrorKind::PermissionDenied => Error::PermissionDenied { path, source },
        _ => Error::Write { path, source },
    }
}

/// Verify that the output path can be opened for writing.
///
/// The file is created if it does not exist; existing content is left as is.
pub fn check_write_permission(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map(|_| ())
        .map_err(|source| Error::PermissionDenied {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::NoProgress;

    const RUTH: &str = "\\id RUT\n\\h Ruth\n\\c 1\n\\p\n\\v 1 In the days when the judges ruled\n";

    #[test]
    fn test_request_defaults_from_output_path() {
        let request = ConvertRequest::new(["a.usfm"], "out.html");
        assert_eq!(request.format, "HTML");
        let request = ConvertRequest::new(["a.usfm"], "out");
        assert_eq!(request.format, "DOCX");
    }

    #[test]
    fn test_unsupported_format_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let request = ConvertRequest::new([dir.path().join("missing.usfm")], &output)
            .with_format("PDF");
        let result = convert(&request, &mut NoProgress);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_invalid_option_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.html");
        let request = ConvertRequest::new([dir.path().join("missing.usfm")], &output)
            .with_options(RawOptions::new().with_text_size("Huge"));
        let result = convert(&request, &mut NoProgress);
        assert!(matches!(result, Err(Error::UnsupportedOption { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_assembly_removes_created_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.html");
        let request = ConvertRequest::new([dir.path().join("missing.usfm")], &output);
        let result = convert(&request, &mut NoProgress);
        assert!(matches!(result, Err(Error::Read { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_write_errors_keep_their_kind() {
        let path = Path::new("out.docx");
        let denied = write_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, Error::PermissionDenied { .. }));

        let full = write_error(path, io::Error::new(io::ErrorKind::Other, "no space left"));
        match full {
            Error::Write { path, source } => {
                assert_eq!(path, Path::new("out.docx"));
                assert_eq!(source.kind(), io::ErrorKind::Other);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_permission_check_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("no-such-dir").join("out.docx");
        assert!(matches!(
            check_write_permission(&output),
            Err(Error::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_convert_html() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("08-RUT.usfm");
        fs::write(&input, RUTH).unwrap();
        let output = dir.path().join("ruth.html");

        let request = ConvertRequest::new([&input], &output)
            .with_options(RawOptions::new().with_table_of_contents(true));
        let summary = convert(&request, &mut NoProgress).unwrap();

        assert_eq!(summary.format, OutputFormat::Html);
        assert_eq!(summary.toc_entries, 2);
        assert_eq!(summary.stats.verse_count, 1);
        let html = fs::read_to_string(&output).unwrap();
        assert_eq!(html.len(), summary.bytes_written);
        assert!(html.contains("In the days when the judges ruled"));
    }
}
