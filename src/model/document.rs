//! Document-level types.

use super::marker::book_title;
use super::{DocumentStats, Marker, MarkerKind, MarkerTree, NodeId};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// The ordered merge of all per-file marker trees of one conversion run.
///
/// All markers live in one arena. Each appended tree is offset into it, so
/// top-level markers of file *i* always precede those of file *i + 1*.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, books)
    pub metadata: Metadata,

    nodes: Vec<Marker>,
    roots: Vec<NodeId>,
    files: Vec<SourceFile>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the parsed tree of one file after everything already present.
    pub fn append(&mut self, path: impl Into<PathBuf>, tree: MarkerTree) {
        let offset = self.nodes.len();
        let (nodes, roots) = tree.into_parts();
        let first_root = self.roots.len();

        self.nodes.extend(nodes.into_iter().map(|mut marker| {
            for child in &mut marker.children {
                child.0 += offset;
            }
            marker
        }));
        self.roots
            .extend(roots.into_iter().map(|id| NodeId(id.0 + offset)));

        let span = first_root..self.roots.len();
        for id in &self.roots[span.clone()] {
            if let Some(marker) = self.nodes.get(id.index()) {
                if marker.kind == MarkerKind::Book {
                    let title = book_title(&self.nodes, marker);
                    self.metadata
                        .books
                        .push(marker.text_or_empty().trim().to_uppercase());
                    if self.metadata.title.is_none() && !title.is_empty() {
                        self.metadata.title = Some(title);
                    }
                }
            }
        }

        self.files.push(SourceFile {
            path: path.into(),
            roots: span,
        });
    }

    /// Get a marker by id.
    pub fn get(&self, id: NodeId) -> Option<&Marker> {
        self.nodes.get(id.index())
    }

    /// All markers in arena order.
    pub fn nodes(&self) -> &[Marker] {
        &self.nodes
    }

    /// Top-level markers in file order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Source files in the order they were appended.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Top-level markers contributed by one source file.
    ///
    /// `None` when the file's span does not fit the document, which only a
    /// hand-built or deserialized document can produce.
    pub fn file_roots(&self, file: &SourceFile) -> Option<&[NodeId]> {
        self.roots.get(file.roots.clone())
    }

    /// Number of source files merged into the document.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Check if the document has any markers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Display title of a book marker.
    pub fn book_title(&self, book: &Marker) -> String {
        book_title(&self.nodes, book)
    }

    /// Count structural markers and words.
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats::new();
        stats.file_count = self.files.len() as u32;
        for marker in &self.nodes {
            stats.add_marker(marker);
        }
        stats
    }
}

/// Span of top-level markers contributed by one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path (or name) of the input
    pub path: PathBuf,

    /// Range into the document's top-level markers
    pub roots: Range<usize>,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of top-level markers from this file.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Title of the first book, used as the output document title
    pub title: Option<String>,

    /// Upper-cased book codes in document order
    pub books: Vec<String>,
}

impl Metadata {
    /// Title to print on the output, falling back to a generic one.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Scripture")
    }
}
