//! Document model types for scripture content.
//!
//! This module defines the marker arena produced by parsing, the merged
//! document built by the assembler, and the layout tree that bridges the
//! document and the format-specific emitters.

mod document;
mod layout;
mod marker;
mod stats;

pub use document::{Document, Metadata, SourceFile};
pub use layout::{AnchorId, LayoutMetadata, LayoutNode, LayoutTree, TocEntry};
pub use marker::{book_title, Marker, MarkerKind, MarkerTree, NodeId};
pub use stats::DocumentStats;
