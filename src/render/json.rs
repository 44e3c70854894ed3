//! JSON dump of a layout tree and its table of contents.

use crate::error::{Error, Result};
use crate::model::{LayoutTree, TocEntry};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct LayoutDump<'a> {
    layout: &'a LayoutTree,
    toc: &'a [TocEntry],
}

/// Serialize a layout tree together with its table of contents.
pub fn to_json(layout: &LayoutTree, toc: &[TocEntry], format: JsonFormat) -> Result<String> {
    let dump = LayoutDump { layout, toc };
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&dump),
        JsonFormat::Compact => serde_json::to_string(&dump),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
