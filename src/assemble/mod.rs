//! Document assembly: merging per-file marker trees into one document.
//!
//! Files are parsed one at a time, in the order given, and appended to the
//! document. Any read or parse failure aborts the whole assembly; a partial
//! document is never returned.
//!
//! # Example
//!
//! ```no_run
//! use usfmconv::assemble::{Assembler, NoProgress};
//!
//! fn main() -> usfmconv::Result<()> {
//!     let files = ["01-GEN.usfm", "02-EXO.usfm"];
//!     let document = Assembler::new().assemble(&files, &mut NoProgress)?;
//!     println!("{} books", document.metadata.books.len());
//!     Ok(())
//! }
//! ```

mod progress;

pub use progress::{CancellationToken, ChannelObserver, NoProgress, ProgressObserver};

use crate::error::{Error, Result};
use crate::model::{Document, MarkerKind, MarkerTree};
use crate::parser::{MarkerParser, UsfmParser};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when a book code appears in more than one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateBookPolicy {
    /// Keep every occurrence in input order and log a warning
    #[default]
    Keep,
    /// Fail the assembly, naming the file that repeats the book
    Reject,
}

/// Merges independently parsed files into one [`Document`].
pub struct Assembler {
    parser: Box<dyn MarkerParser>,
    duplicate_policy: DuplicateBookPolicy,
    cancellation: Option<CancellationToken>,
}

impl Assembler {
    /// Create an assembler using the default USFM parser.
    pub fn new() -> Self {
        Self {
            parser: Box::new(UsfmParser::new()),
            duplicate_policy: DuplicateBookPolicy::default(),
            cancellation: None,
        }
    }

    /// Use a different marker parser.
    pub fn with_parser(mut self, parser: impl MarkerParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Set the duplicate book policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicateBookPolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Check a cancellation token before each file is parsed.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Read, parse and merge the given files in order.
    pub fn assemble<P: AsRef<Path>>(
        &self,
        files: &[P],
        observer: &mut dyn ProgressObserver,
    ) -> Result<Document> {
        let paths: Vec<PathBuf> = files.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.run(&paths, observer, |path| read_source(path))
    }

    /// Parse and merge in-memory sources, each named for error messages.
    pub fn assemble_sources<N, S>(
        &self,
        sources: &[(N, S)],
        observer: &mut dyn ProgressObserver,
    ) -> Result<Document>
    where
        N: AsRef<Path>,
        S: AsRef<str>,
    {
        let paths: Vec<PathBuf> = sources
            .iter()
            .map(|(name, _)| name.as_ref().to_path_buf())
            .collect();
        let mut texts = sources.iter().map(|(_, text)| text.as_ref());
        self.run(&paths, observer, |_| {
            Ok(texts.next().unwrap_or_default().to_string())
        })
    }

    fn run<F>(
        &self,
        paths: &[PathBuf],
        observer: &mut dyn ProgressObserver,
        mut load: F,
    ) -> Result<Document>
    where
        F: FnMut(&Path) -> Result<String>,
    {
        if paths.is_empty() {
            return Err(Error::NoInputFiles);
        }

        let total = paths.len();
        let mut document = Document::new();
        let mut seen_books = HashSet::new();

        for (index, path) in paths.iter().enumerate() {
            if self.is_cancelled() {
                log::info!("Assembly cancelled before {}", path.display());
                return Err(Error::Cancelled);
            }

            let source = load(path)?;
            let tree = self.parser.parse(&source).map_err(|e| Error::Parse {
                path: path.clone(),
                line: e.line,
                message: e.message,
            })?;
            self.check_duplicates(&tree, path, &mut seen_books)?;

            log::debug!(
                "Parsed {} ({} markers, {} top-level)",
                path.display(),
                tree.len(),
                tree.roots().len()
            );
            document.append(path.clone(), tree);

            let percent = index as f64 / total as f64 * 100.0;
            observer.report(percent);
        }

        log::info!(
            "Assembled {} files into {} markers",
            total,
            document.nodes().len()
        );
        Ok(document)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn check_duplicates(
        &self,
        tree: &MarkerTree,
        path: &Path,
        seen: &mut HashSet<String>,
    ) -> Result<()> {
        let codes = tree
            .roots()
            .iter()
            .filter_map(|id| tree.get(*id))
            .filter(|m| m.kind == MarkerKind::Book)
            .map(|m| m.text_or_empty().trim().to_uppercase());

        for code in codes {
            if seen.insert(code.clone()) {
                continue;
            }
            match self.duplicate_policy {
                DuplicateBookPolicy::Keep => {
                    log::warn!("Book {} appears again in {}", code, path.display());
                }
                DuplicateBookPolicy::Reject => {
                    return Err(Error::DuplicateBook {
                        code,
                        path: path.to_path_buf(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Read an input file, replacing invalid UTF-8 sequences.
fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            log::warn!("{} is not valid UTF-8, replacing invalid bytes", path.display());
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}
