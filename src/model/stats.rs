//! Document statistics.

use super::{Marker, MarkerKind};
use serde::{Deserialize, Serialize};

/// Counts collected over a merged document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of source files merged
    pub file_count: u32,

    pub book_count: u32,

    pub chapter_count: u32,

    pub verse_count: u32,

    pub paragraph_count: u32,

    pub footnote_count: u32,

    pub cross_reference_count: u32,

    /// Approximate word count (whitespace-separated tokens of text runs)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl DocumentStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one marker.
    pub fn add_marker(&mut self, marker: &Marker) {
        match marker.kind {
            MarkerKind::Book => self.book_count += 1,
            MarkerKind::Chapter => self.chapter_count += 1,
            MarkerKind::Verse => self.verse_count += 1,
            MarkerKind::Paragraph => self.paragraph_count += 1,
            MarkerKind::Footnote => self.footnote_count += 1,
            MarkerKind::CrossReference => self.cross_reference_count += 1,
            MarkerKind::TextRun => self.count_text(marker.text_or_empty()),
            MarkerKind::Other => {}
        }
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_text() {
        let mut stats = DocumentStats::new();
        stats.count_text("In the beginning God created");

        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.char_count, 24);
    }

    #[test]
    fn test_add_marker() {
        let mut stats = DocumentStats::new();
        stats.add_marker(&Marker::book("GEN"));
        stats.add_marker(&Marker::chapter(1));
        stats.add_marker(&Marker::verse(1));
        stats.add_marker(&Marker::footnote("note"));
        stats.add_marker(&Marker::text_run("two words"));

        assert_eq!(stats.book_count, 1);
        assert_eq!(stats.chapter_count, 1);
        assert_eq!(stats.verse_count, 1);
        assert_eq!(stats.footnote_count, 1);
        assert_eq!(stats.word_count, 2);
    }
}
