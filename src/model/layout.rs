//! Layout tree types produced by the layout transform.

use super::{MarkerKind, NodeId};
use crate::config::{Alignment, Direction, FormatConfig, LineSpacing, TextSize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a layout node, assigned in pre-order from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u32);

impl AnchorId {
    pub fn value(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AnchorId {
    /// Formats as the element id used by emitters (`a17`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// A node of the layout tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutNode {
    /// Unique, pre-order anchor
    pub anchor: AnchorId,

    /// Marker this node was produced from
    pub source: NodeId,

    pub kind: MarkerKind,

    /// Raw markup tag of the source marker
    pub tag: String,

    /// Chapter or verse ordinal
    pub number: Option<u32>,

    /// Text payload of the source marker
    pub text: Option<String>,

    /// Heading title for books and chapters
    pub title: Option<String>,

    /// Start a new page (chapters) or line (verses) before this node
    pub break_before: bool,

    /// Document-wide footnote number, starting at 1
    pub footnote_number: Option<u32>,

    /// Children in document order
    pub children: Vec<AnchorId>,
}

impl LayoutNode {
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Options that apply to the whole output rather than to single nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    pub text_size: TextSize,
    pub line_spacing: LineSpacing,
    pub alignment: Alignment,
    pub direction: Direction,
    pub column_count: u8,
}

impl From<&FormatConfig> for LayoutMetadata {
    fn from(config: &FormatConfig) -> Self {
        Self {
            text_size: config.text_size(),
            line_spacing: config.line_spacing(),
            alignment: config.alignment(),
            direction: config.direction(),
            column_count: config.column_count(),
        }
    }
}

/// Anchor- and break-annotated tree handed to emitters.
///
/// Nodes are stored in pre-order, so a node's anchor is also its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutTree {
    /// Document-level layout options
    pub metadata: LayoutMetadata,

    nodes: Vec<LayoutNode>,
    roots: Vec<AnchorId>,
    footnote_count: u32,
}

impl LayoutTree {
    pub(crate) fn new(
        metadata: LayoutMetadata,
        nodes: Vec<LayoutNode>,
        roots: Vec<AnchorId>,
        footnote_count: u32,
    ) -> Self {
        Self {
            metadata,
            nodes,
            roots,
            footnote_count,
        }
    }

    /// Get a node by anchor.
    pub fn get(&self, anchor: AnchorId) -> Option<&LayoutNode> {
        self.nodes.get(anchor.index())
    }

    /// Check whether an anchor belongs to this tree.
    pub fn contains(&self, anchor: AnchorId) -> bool {
        self.get(anchor).is_some()
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[AnchorId] {
        &self.roots
    }

    /// All nodes in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.iter()
    }

    /// Children of a node, resolved.
    pub fn children<'a>(&'a self, node: &'a LayoutNode) -> impl Iterator<Item = &'a LayoutNode> {
        node.children.iter().filter_map(move |anchor| self.get(*anchor))
    }

    /// Number of footnotes that survived pruning.
    pub fn footnote_count(&self) -> u32 {
        self.footnote_count
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One table-of-contents row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,

    /// Anchor of the heading node in the layout tree
    pub anchor: AnchorId,

    /// 0 for books, 1 for chapters
    pub level: u8,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, anchor: AnchorId, level: u8) -> Self {
        Self {
            title: title.into(),
            anchor,
            level,
        }
    }
}
