//! Table-of-contents builder.

use crate::config::FormatConfig;
use crate::model::{LayoutTree, MarkerKind, TocEntry};

/// Build the table of contents for a finished layout tree.
///
/// Returns an empty list when the configuration does not ask for a table of
/// contents; emitters then omit the section entirely.
pub fn build_toc(layout: &LayoutTree, config: &FormatConfig) -> Vec<TocEntry> {
    if !config.table_of_contents() {
        return Vec::new();
    }
    collect_toc(layout)
}

/// Collect book (level 0) and chapter (level 1) headings in document order.
///
/// Anchors are final once the transform has returned, so every entry refers
/// to a node of `layout`.
pub fn collect_toc(layout: &LayoutTree) -> Vec<TocEntry> {
    // Nodes are stored in traversal order
    let entries: Vec<TocEntry> = layout
        .iter()
        .filter_map(|node| {
            let level = match node.kind {
                MarkerKind::Book => 0,
                MarkerKind::Chapter => 1,
                _ => return None,
            };
            let title = node.title.clone().unwrap_or_default();
            Some(TocEntry::new(title, node.anchor, level))
        })
        .collect();

    log::debug!("Table of contents has {} entries", entries.len());
    entries
}
