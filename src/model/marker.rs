//! Marker tree types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a marker inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural kind of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Book,
    Chapter,
    Verse,
    Paragraph,
    Footnote,
    CrossReference,
    TextRun,
    Other,
}

impl MarkerKind {
    /// Chapter and verse markers carry an ordinal.
    pub fn is_numbered(self) -> bool {
        matches!(self, MarkerKind::Chapter | MarkerKind::Verse)
    }

    /// Kinds that are rendered inline inside a paragraph.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            MarkerKind::Verse
                | MarkerKind::Footnote
                | MarkerKind::CrossReference
                | MarkerKind::TextRun
        )
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkerKind::Book => "book",
            MarkerKind::Chapter => "chapter",
            MarkerKind::Verse => "verse",
            MarkerKind::Paragraph => "paragraph",
            MarkerKind::Footnote => "footnote",
            MarkerKind::CrossReference => "cross-reference",
            MarkerKind::TextRun => "text",
            MarkerKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One structural unit of the source markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Structural kind
    pub kind: MarkerKind,

    /// Raw markup tag without the backslash (e.g. "p", "s1"), empty for text runs
    pub tag: String,

    /// Chapter or verse ordinal
    pub number: Option<u32>,

    /// Text payload (text runs, note bodies, single-line headings)
    pub text: Option<String>,

    /// Child markers in document order
    pub children: Vec<NodeId>,
}

impl Marker {
    /// Create a marker with no payload.
    pub fn new(kind: MarkerKind, tag: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            number: None,
            text: None,
            children: Vec::new(),
        }
    }

    /// Book marker identified by its book code.
    pub fn book(code: impl Into<String>) -> Self {
        Self::new(MarkerKind::Book, "id").with_text(code)
    }

    pub fn chapter(number: u32) -> Self {
        Self::new(MarkerKind::Chapter, "c").with_number(number)
    }

    pub fn verse(number: u32) -> Self {
        Self::new(MarkerKind::Verse, "v").with_number(number)
    }

    pub fn paragraph() -> Self {
        Self::new(MarkerKind::Paragraph, "p")
    }

    pub fn footnote(body: impl Into<String>) -> Self {
        Self::new(MarkerKind::Footnote, "f").with_text(body)
    }

    pub fn cross_reference(body: impl Into<String>) -> Self {
        Self::new(MarkerKind::CrossReference, "x").with_text(body)
    }

    pub fn text_run(text: impl Into<String>) -> Self {
        Self::new(MarkerKind::TextRun, "").with_text(text)
    }

    /// Marker of a tag the structural model does not distinguish.
    pub fn other(tag: impl Into<String>) -> Self {
        Self::new(MarkerKind::Other, tag)
    }

    /// Set the ordinal.
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    /// Set the text payload.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Text payload or an empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Header tags that name a book, most preferred first.
const TITLE_TAGS: &[&str] = &["h", "toc2", "toc1", "mt", "mt1"];

/// Display title of a book marker stored in `nodes`.
///
/// Looks at the book's direct children for a running header or title line and
/// falls back to the book code.
pub fn book_title(nodes: &[Marker], book: &Marker) -> String {
    for tag in TITLE_TAGS {
        let found = book
            .children
            .iter()
            .filter_map(|id| nodes.get(id.index()))
            .find(|child| child.kind == MarkerKind::Other && child.tag == *tag)
            .and_then(|child| child.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty());
        if let Some(title) = found {
            return title.to_string();
        }
    }
    book.text_or_empty().trim().to_string()
}

/// The parsed representation of one input file, stored as an arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerTree {
    nodes: Vec<Marker>,
    roots: Vec<NodeId>,
}

impl MarkerTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a raw arena.
    ///
    /// No structural checks are made here; the layout transform rejects
    /// dangling or shared child references.
    pub fn from_parts(nodes: Vec<Marker>, roots: Vec<NodeId>) -> Self {
        Self { nodes, roots }
    }

    /// Append a top-level marker.
    pub fn add_root(&mut self, marker: Marker) -> NodeId {
        let id = self.push(marker);
        self.roots.push(id);
        id
    }

    /// Append a marker as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn add_child(&mut self, parent: NodeId, marker: Marker) -> NodeId {
        let id = self.push(marker);
        self.nodes[parent.index()].children.push(id);
        id
    }

    fn push(&mut self, marker: Marker) -> NodeId {
        self.nodes.push(marker);
        NodeId(self.nodes.len() - 1)
    }

    /// Get a marker by id.
    pub fn get(&self, id: NodeId) -> Option<&Marker> {
        self.nodes.get(id.index())
    }

    /// Get a mutable marker by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Marker> {
        self.nodes.get_mut(id.index())
    }

    /// Top-level markers in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All markers in arena order.
    pub fn nodes(&self) -> &[Marker] {
        &self.nodes
    }

    /// Number of markers in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<Marker>, Vec<NodeId>) {
        (self.nodes, self.roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_building() {
        let mut tree = MarkerTree::new();
        let book = tree.add_root(Marker::book("GEN"));
        let chapter = tree.add_child(book, Marker::chapter(1));
        let verse = tree.add_child(chapter, Marker::verse(1));
        tree.add_child(verse, Marker::text_run("In the beginning"));

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots(), &[book]);
        assert_eq!(tree.get(book).unwrap().children, vec![chapter]);
        assert_eq!(tree.get(verse).unwrap().number, Some(1));
    }

    #[test]
    fn test_book_title_prefers_header() {
        let mut tree = MarkerTree::new();
        let book = tree.add_root(Marker::book("GEN"));
        tree.add_child(book, Marker::other("toc1").with_text("The Book of Genesis"));
        tree.add_child(book, Marker::other("h").with_text("Genesis"));

        let marker = tree.get(book).unwrap();
        assert_eq!(book_title(tree.nodes(), marker), "Genesis");
    }

    #[test]
    fn test_book_title_falls_back_to_code() {
        let mut tree = MarkerTree::new();
        let book = tree.add_root(Marker::book("EXO"));
        tree.add_child(book, Marker::other("h").with_text("   "));

        let marker = tree.get(book).unwrap();
        assert_eq!(book_title(tree.nodes(), marker), "EXO");
    }

    #[test]
    fn test_kind_helpers() {
        assert!(MarkerKind::Chapter.is_numbered());
        assert!(MarkerKind::Verse.is_numbered());
        assert!(!MarkerKind::Footnote.is_numbered());
        assert!(MarkerKind::TextRun.is_inline());
        assert!(!MarkerKind::Paragraph.is_inline());
        assert_eq!(MarkerKind::CrossReference.to_string(), "cross-reference");
    }
}
