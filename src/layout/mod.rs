//! Layout transform: document + configuration -> layout tree.
//!
//! A single depth-first, pre-order walk assigns anchors, sets break flags,
//! numbers footnotes and prunes them when they are not wanted. The counters
//! are threaded through the walk as a value, so the transform is reentrant
//! and its output depends only on its inputs.
//!
//! # Example
//!
//! ```
//! use usfmconv::config::{FormatConfig, RawOptions};
//! use usfmconv::layout::{build_toc, transform};
//! use usfmconv::model::{Document, Marker, MarkerTree};
//!
//! let mut tree = MarkerTree::new();
//! let book = tree.add_root(Marker::book("JHN"));
//! tree.add_child(book, Marker::chapter(1));
//!
//! let mut document = Document::new();
//! document.append("jhn.usfm", tree);
//!
//! let raw = RawOptions::new().with_chapter_break(true).with_table_of_contents(true);
//! let config = FormatConfig::build(&raw)?;
//! let layout = transform(&document, &config)?;
//! let toc = build_toc(&layout, &config);
//!
//! assert_eq!(layout.len(), 2);
//! assert_eq!(toc.len(), 2);
//! # Ok::<(), usfmconv::Error>(())
//! ```

mod toc;

pub use toc::{build_toc, collect_toc};

use crate::config::FormatConfig;
use crate::error::{Error, Result};
use crate::model::{
    AnchorId, Document, LayoutMetadata, LayoutNode, LayoutTree, Marker, MarkerKind, NodeId,
};
use std::collections::HashSet;
use std::path::Path;

/// First footnote number of every document.
pub const FIRST_FOOTNOTE: u32 = 1;

/// Transform a merged document into a layout tree.
///
/// Fails with [`Error::MalformedDocument`] if the marker tree violates a
/// structural invariant; no partial tree is returned.
pub fn transform(document: &Document, config: &FormatConfig) -> Result<LayoutTree> {
    LayoutTransform::new(document, config).run()
}

/// Running counters of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counters {
    next_anchor: u32,
    next_footnote: u32,
}

impl Counters {
    fn start() -> Self {
        Self {
            next_anchor: 0,
            next_footnote: FIRST_FOOTNOTE,
        }
    }
}

struct LayoutTransform<'a> {
    document: &'a Document,
    config: &'a FormatConfig,
    visited: Vec<bool>,
    current_file: &'a Path,
}

impl<'a> LayoutTransform<'a> {
    fn new(document: &'a Document, config: &'a FormatConfig) -> Self {
        Self {
            document,
            config,
            visited: vec![false; document.nodes().len()],
            current_file: Path::new(""),
        }
    }

    fn run(mut self) -> Result<LayoutTree> {
        let document = self.document;
        let mut nodes = Vec::with_capacity(document.nodes().len());
        let mut roots = Vec::new();
        let mut counters = Counters::start();

        for file in document.files() {
            self.current_file = file.path();
            let file_roots = document.file_roots(file).ok_or_else(|| {
                self.malformed(format!(
                    "top-level span {}..{} exceeds {} markers",
                    file.roots.start,
                    file.roots.end,
                    document.roots().len()
                ))
            })?;
            self.check_siblings(file_roots)?;

            for id in file_roots {
                let (anchor, next) = self.visit(*id, counters, &mut nodes)?;
                counters = next;
                roots.extend(anchor);
            }
        }

        let footnote_count = counters.next_footnote - FIRST_FOOTNOTE;
        debug_assert_eq!(counters.next_anchor as usize, nodes.len());
        log::info!(
            "Layout transform produced {} nodes ({} footnotes)",
            nodes.len(),
            footnote_count
        );

        Ok(LayoutTree::new(
            LayoutMetadata::from(self.config),
            nodes,
            roots,
            footnote_count,
        ))
    }

    /// Visit one marker and its subtree.
    ///
    /// Returns the node's anchor, or `None` when the subtree was pruned,
    /// together with the advanced counters.
    fn visit(
        &mut self,
        id: NodeId,
        counters: Counters,
        nodes: &mut Vec<LayoutNode>,
    ) -> Result<(Option<AnchorId>, Counters)> {
        let document = self.document;
        let marker = self.enter(id)?;

        if marker.kind == MarkerKind::Footnote && !self.config.include_footnotes() {
            // Pruned subtrees are still checked
            self.check_siblings(&marker.children)?;
            for child in &marker.children {
                self.validate(*child)?;
            }
            return Ok((None, counters));
        }

        let mut counters = counters;
        let anchor = AnchorId(counters.next_anchor);
        counters.next_anchor += 1;

        let footnote_number = if marker.kind == MarkerKind::Footnote {
            let number = counters.next_footnote;
            counters.next_footnote += 1;
            Some(number)
        } else {
            None
        };

        let break_before = match marker.kind {
            MarkerKind::Chapter => self.config.chapter_break(),
            MarkerKind::Verse => self.config.verse_break(),
            _ => false,
        };

        let title = match marker.kind {
            MarkerKind::Book => Some(document.book_title(marker)),
            MarkerKind::Chapter => marker.number.map(|n| format!("Chapter {}", n)),
            _ => None,
        };

        nodes.push(LayoutNode {
            anchor,
            source: id,
            kind: marker.kind,
            tag: marker.tag.clone(),
            number: marker.number,
            text: marker.text.clone(),
            title,
            break_before,
            footnote_number,
            children: Vec::new(),
        });

        self.check_siblings(&marker.children)?;
        let mut children = Vec::with_capacity(marker.children.len());
        for child in &marker.children {
            let (child_anchor, next) = self.visit(*child, counters, nodes)?;
            counters = next;
            children.extend(child_anchor);
        }

        let node = &mut nodes[anchor.index()];
        debug_assert_eq!(node.anchor, anchor);
        node.children = children;

        Ok((Some(anchor), counters))
    }

    /// Resolve a marker, mark it visited and check its number.
    fn enter(&mut self, id: NodeId) -> Result<&'a Marker> {
        let document = self.document;
        let marker = document
            .get(id)
            .ok_or_else(|| self.malformed(format!("reference to missing marker #{}", id.0)))?;

        if std::mem::replace(&mut self.visited[id.index()], true) {
            return Err(self.malformed(format!("marker #{} has more than one parent", id.0)));
        }
        self.check_number(marker)?;
        Ok(marker)
    }

    /// Structural checks over a subtree that produces no layout nodes.
    fn validate(&mut self, id: NodeId) -> Result<()> {
        let marker = self.enter(id)?;
        self.check_siblings(&marker.children)?;
        for child in &marker.children {
            self.validate(*child)?;
        }
        Ok(())
    }

    fn malformed(&self, message: String) -> Error {
        Error::MalformedDocument(format!("{}: {}", self.current_file.display(), message))
    }

    /// Chapters and verses carry a positive ordinal; nothing else does.
    fn check_number(&self, marker: &Marker) -> Result<()> {
        match (marker.kind.is_numbered(), marker.number) {
            (true, Some(n)) if n > 0 => Ok(()),
            (true, _) => Err(self.malformed(format!(
                "{} marker without a positive number",
                marker.kind
            ))),
            (false, Some(n)) => Err(self.malformed(format!(
                "{} marker carries number {}",
                marker.kind, n
            ))),
            (false, None) => Ok(()),
        }
    }

    /// Chapter and verse ordinals are unique among siblings.
    fn check_siblings(&self, ids: &[NodeId]) -> Result<()> {
        let mut seen = HashSet::new();
        for marker in ids.iter().filter_map(|id| self.document.get(*id)) {
            if let (true, Some(n)) = (marker.kind.is_numbered(), marker.number) {
                if !seen.insert((marker.kind, n)) {
                    return Err(self.malformed(format!("duplicate {} {}", marker.kind, n)));
                }
            }
        }
        Ok(())
    }
}
