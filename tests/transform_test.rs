//! Integration tests for the layout transform and table of contents.

use usfmconv::{
    build_toc, transform, Document, Error, FormatConfig, LayoutTree, Marker, MarkerKind,
    MarkerTree, RawOptions,
};

/// One book with the given chapter count, each chapter holding two verses
/// with one footnote each.
fn book(code: &str, chapters: u32) -> MarkerTree {
    let mut tree = MarkerTree::new();
    let book = tree.add_root(Marker::book(code));
    for c in 1..=chapters {
        let chapter = tree.add_child(book, Marker::chapter(c));
        let para = tree.add_child(chapter, Marker::paragraph());
        for v in 1..=2 {
            let verse = tree.add_child(para, Marker::verse(v));
            tree.add_child(verse, Marker::text_run(format!("{} {}:{}", code, c, v)));
            tree.add_child(verse, Marker::footnote(format!("note {} {}:{}", code, c, v)));
        }
    }
    tree
}

fn two_file_document() -> Document {
    let mut doc = Document::new();
    doc.append("01-first.usfm", book("RUT", 2));
    doc.append("02-second.usfm", book("JON", 1));
    doc
}

fn config(raw: RawOptions) -> FormatConfig {
    FormatConfig::build(&raw).unwrap()
}

fn chapters(layout: &LayoutTree) -> Vec<(String, bool)> {
    layout
        .iter()
        .filter(|n| n.kind == MarkerKind::Chapter)
        .map(|n| (n.title.clone().unwrap_or_default(), n.break_before))
        .collect()
}

#[test]
fn test_chapter_breaks_across_files() {
    let layout = transform(
        &two_file_document(),
        &config(RawOptions::new().with_chapter_break(true)),
    )
    .unwrap();

    let chapters = chapters(&layout);
    assert_eq!(chapters.len(), 3);
    assert!(chapters.iter().all(|(_, brk)| *brk));

    // Relative order follows the input files
    let books: Vec<_> = layout
        .iter()
        .filter(|n| n.kind == MarkerKind::Book)
        .map(|n| n.text_or_empty().to_string())
        .collect();
    assert_eq!(books, vec!["RUT", "JON"]);
}

#[test]
fn test_no_breaks_when_disabled() {
    let layout = transform(&two_file_document(), &FormatConfig::default()).unwrap();
    assert!(layout.iter().all(|n| !n.break_before));
}

#[test]
fn test_footnotes_numbered_across_files() {
    let layout = transform(
        &two_file_document(),
        &config(RawOptions::new().with_footnotes(true)),
    )
    .unwrap();

    let numbers: Vec<u32> = layout.iter().filter_map(|n| n.footnote_number).collect();
    assert_eq!(numbers, (1..=6).collect::<Vec<_>>());
    assert_eq!(layout.footnote_count(), 6);
}

#[test]
fn test_footnotes_pruned_when_disabled() {
    let layout = transform(&two_file_document(), &FormatConfig::default()).unwrap();
    assert!(layout.iter().all(|n| n.kind != MarkerKind::Footnote));
    assert_eq!(layout.footnote_count(), 0);
}

#[test]
fn test_anchors_unique_and_increasing() {
    let layout = transform(
        &two_file_document(),
        &config(RawOptions::new().with_footnotes(true)),
    )
    .unwrap();

    let anchors: Vec<u32> = layout.iter().map(|n| n.anchor.value()).collect();
    assert_eq!(anchors.first(), Some(&0));
    assert!(anchors.windows(2).all(|w| w[1] == w[0] + 1));
    assert_eq!(anchors.len(), layout.len());
}

#[test]
fn test_transform_is_deterministic() {
    let doc = two_file_document();
    let cfg = config(
        RawOptions::new()
            .with_footnotes(true)
            .with_verse_break(true)
            .with_table_of_contents(true),
    );
    let first = transform(&doc, &cfg).unwrap();
    let second = transform(&doc, &cfg).unwrap();
    assert_eq!(first, second);
    assert_eq!(build_toc(&first, &cfg), build_toc(&second, &cfg));
}

#[test]
fn test_toc_entries_reference_existing_anchors() {
    let cfg = config(RawOptions::new().with_table_of_contents(true));
    let layout = transform(&two_file_document(), &cfg).unwrap();
    let toc = build_toc(&layout, &cfg);

    let summary: Vec<(&str, u8)> = toc.iter().map(|e| (e.title.as_str(), e.level)).collect();
    assert_eq!(
        summary,
        vec![
            ("RUT", 0),
            ("Chapter 1", 1),
            ("Chapter 2", 1),
            ("JON", 0),
            ("Chapter 1", 1),
        ]
    );
    for entry in &toc {
        let node = layout.get(entry.anchor).unwrap();
        assert!(matches!(node.kind, MarkerKind::Book | MarkerKind::Chapter));
    }
    assert!(toc.windows(2).all(|w| w[0].anchor < w[1].anchor));
}

#[test]
fn test_toc_empty_when_disabled() {
    let cfg = FormatConfig::default();
    let layout = transform(&two_file_document(), &cfg).unwrap();
    assert!(build_toc(&layout, &cfg).is_empty());
}

#[test]
fn test_layout_metadata_copied_from_config() {
    let cfg = config(
        RawOptions::new()
            .with_alignment("justified")
            .with_direction("rtl")
            .with_columns(3),
    );
    let layout = transform(&two_file_document(), &cfg).unwrap();
    assert_eq!(layout.metadata.column_count, 3);
    assert!(layout.metadata.direction.is_rtl());
    assert_eq!(layout.metadata.alignment, usfmconv::Alignment::Justified);
}

#[test]
fn test_duplicate_chapter_is_malformed() {
    let mut tree = MarkerTree::new();
    let book = tree.add_root(Marker::book("OBA"));
    tree.add_child(book, Marker::chapter(1));
    tree.add_child(book, Marker::chapter(1));
    let mut doc = Document::new();
    doc.append("oba.usfm", tree);

    let result = transform(&doc, &FormatConfig::default());
    match result {
        Err(Error::MalformedDocument(message)) => assert!(message.contains("oba.usfm")),
        other => panic!("unexpected result: {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn test_empty_document_gives_empty_layout() {
    let layout = transform(&Document::new(), &FormatConfig::default()).unwrap();
    assert!(layout.is_empty());
    assert!(layout.roots().is_empty());
}
