//! USFM tokenizer and tree builder.

use super::{MarkerParser, ParseError, ParseOptions};
use crate::model::{Marker, MarkerKind, MarkerTree, NodeId};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Paragraph-like markers (compared without trailing level digits).
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "m", "pi", "q", "qr", "qc", "qm", "nb", "li", "pc", "pr", "pm", "pmo", "pmc", "pmr",
    "mi", "cls", "pq", "po", "ph",
];

/// Markers whose payload is the rest of their line.
const LINE_TAGS: &[&str] = &[
    "h", "toc", "toca", "mt", "mte", "s", "ms", "mr", "sr", "r", "d", "cl", "cp", "rem", "ide",
    "sts", "usfm", "sp", "qa", "cd",
];

/// Line markers that describe the book rather than the current chapter.
const BOOK_HEADER_TAGS: &[&str] = &["h", "toc", "toca", "mt", "mte", "ide", "sts", "usfm"];

/// Character-level markers whose content flows into the surrounding text.
const CHAR_TAGS: &[&str] = &[
    "add", "nd", "wj", "bk", "qs", "qac", "tl", "it", "bd", "bdit", "em", "sc", "w", "pn", "k",
    "sls", "ord", "no", "sup", "dc", "lit", "png", "addpn", "qt", "ior", "iqt", "rq", "rb",
    "fr", "ft", "fq", "fqa", "fk", "fl", "fw", "fp", "fv", "fdc", "fm", "xo", "xt", "xk", "xq",
    "xta", "xop", "xot", "xnt", "xdc",
];

/// Inline spans dropped with their content: published and alternate numbers, figures.
const SKIPPED_SPAN_TAGS: &[&str] = &["vp", "va", "ca", "fig"];

const FOOTNOTE_TAGS: &[&str] = &["f", "fe", "ef"];
const CROSS_REFERENCE_TAGS: &[&str] = &["x", "ex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Marker { name: &'a str, closing: bool },
    Text(&'a str),
}

/// Parser for Unified Standard Format Markers.
///
/// Builds the book / chapter / paragraph / verse hierarchy, keeps footnote
/// and cross-reference bodies as plain text, and flattens character markers
/// into the surrounding text.
#[derive(Debug, Clone)]
pub struct UsfmParser {
    options: ParseOptions,
    marker_regex: Regex,
}

impl UsfmParser {
    /// Create a parser with default options.
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    /// Create a parser with custom options.
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            marker_regex: Regex::new(r"\\(\+?[A-Za-z][A-Za-z0-9]*)(\*?)").unwrap(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn tokenize<'a>(&self, line: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        let mut last = 0;
        let mut after_opening = false;

        for caps in self.marker_regex.captures_iter(line) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_text(&mut tokens, &line[last..whole.start()], after_opening);

            let name = caps.get(1).map_or("", |m| m.as_str());
            let closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
            tokens.push(Token::Marker {
                name: name.trim_start_matches('+'),
                closing,
            });
            after_opening = !closing;
            last = whole.end();
        }
        push_text(&mut tokens, &line[last..], after_opening);
        tokens
    }
}

/// Push a text token, dropping the single space that delimits an opening marker.
fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, after_opening: bool) {
    let text = if after_opening {
        text.strip_prefix(|c: char| c.is_whitespace()).unwrap_or(text)
    } else {
        text
    };
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
}

impl Default for UsfmParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerParser for UsfmParser {
    fn parse(&self, source: &str) -> Result<MarkerTree, ParseError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut builder = TreeBuilder::new(&self.options);

        for (index, line) in source.lines().enumerate() {
            builder.line = index + 1;
            let mut tokens = self.tokenize(line).into_iter().peekable();

            while let Some(token) = tokens.next() {
                match token {
                    Token::Text(text) => {
                        // Attribute lists (`\w word|strong="H1"\w*`) end at the closing marker
                        let text = match tokens.peek() {
                            Some(Token::Marker { closing: true, .. }) => {
                                text.split('|').next().unwrap_or(text)
                            }
                            _ => text,
                        };
                        builder.text(text);
                    }
                    Token::Marker {
                        name,
                        closing: true,
                    } => builder.close_marker(name),
                    Token::Marker {
                        name,
                        closing: false,
                    } => {
                        let argument = match tokens.peek() {
                            Some(Token::Text(text)) if takes_argument(name) => Some(*text),
                            _ => None,
                        };
                        if argument.is_some() {
                            tokens.next();
                        }
                        builder.open_marker(name, argument)?;
                    }
                }
            }
            builder.end_line();
        }

        builder.finish()
    }
}

fn takes_argument(name: &str) -> bool {
    matches!(name, "id" | "c" | "v")
}

/// Tag without its trailing level digits ("q2" -> "q", "toc1" -> "toc").
fn base_tag(name: &str) -> &str {
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.is_empty() {
        name
    } else {
        trimmed
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], &text[pos..]),
        None => (text, ""),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading decimal ordinal of a chapter or verse argument ("3", "1-2", "4a").
fn parse_ordinal(word: &str) -> Option<u32> {
    let digits: String = word.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

struct OpenNote {
    id: NodeId,
    tag: String,
    body: String,
    caller_pending: bool,
    line: usize,
}

struct TreeBuilder<'o> {
    options: &'o ParseOptions,
    tree: MarkerTree,
    book: Option<NodeId>,
    chapter: Option<NodeId>,
    block: Option<NodeId>,
    verse: Option<NodeId>,
    note: Option<OpenNote>,
    line_target: Option<NodeId>,
    skipped_span: Option<String>,
    pending: String,
    line: usize,
}

impl<'o> TreeBuilder<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            tree: MarkerTree::new(),
            book: None,
            chapter: None,
            block: None,
            verse: None,
            note: None,
            line_target: None,
            skipped_span: None,
            pending: String::new(),
            line: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, message)
    }

    fn attach(&mut self, parent: Option<NodeId>, marker: Marker) -> NodeId {
        match parent {
            Some(parent) => self.tree.add_child(parent, marker),
            None => self.tree.add_root(marker),
        }
    }

    /// Innermost open container for inline content.
    fn inline_parent(&self) -> Option<NodeId> {
        self.verse.or(self.block).or(self.chapter).or(self.book)
    }

    /// Innermost open container for blocks.
    fn block_parent(&self) -> Option<NodeId> {
        self.chapter.or(self.book)
    }

    fn normalized(&self, text: &str) -> String {
        if self.options.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        }
    }

    fn text(&mut self, text: &str) {
        if self.skipped_span.is_some() {
            return;
        }
        let text = self.normalized(text);

        if let Some(note) = self.note.as_mut() {
            let mut text = text.as_str();
            if note.caller_pending {
                let (_caller, rest) = split_word(text);
                text = rest;
                note.caller_pending = false;
            }
            note.body.push_str(text);
            return;
        }

        if let Some(target) = self.line_target {
            if let Some(marker) = self.tree.get_mut(target) {
                marker.text.get_or_insert_with(String::new).push_str(&text);
            }
            return;
        }

        self.pending.push_str(&text);
    }

    /// Turn buffered text into a text run under the current inline parent.
    fn flush(&mut self) {
        let text = collapse_whitespace(&self.pending);
        self.pending.clear();
        if !text.is_empty() {
            let parent = self.inline_parent();
            self.attach(parent, Marker::text_run(text));
        }
    }

    fn open_marker(&mut self, name: &str, argument: Option<&str>) -> Result<(), ParseError> {
        if self.options.is_ignored(name) {
            return Ok(());
        }
        let base = base_tag(name);

        if CHAR_TAGS.contains(&base) {
            return Ok(());
        }
        if SKIPPED_SPAN_TAGS.contains(&base) {
            self.skipped_span = Some(name.to_string());
            return Ok(());
        }
        if self.note.is_some() {
            return Err(self.error(format!("\\{} inside an unclosed note", name)));
        }

        if FOOTNOTE_TAGS.contains(&name) || CROSS_REFERENCE_TAGS.contains(&name) {
            self.open_note(name);
            return Ok(());
        }

        self.flush();
        self.line_target = None;

        match name {
            "id" => {
                let (code, _rest) = split_word(argument.unwrap_or_default());
                if code.is_empty() {
                    return Err(self.error("\\id marker without a book code"));
                }
                let book = self.tree.add_root(Marker::book(code.to_uppercase()));
                log::debug!("Parsing book {}", code);
                self.book = Some(book);
                self.chapter = None;
                self.block = None;
                self.verse = None;
            }
            "c" => {
                let (word, rest) = split_word(argument.unwrap_or_default());
                let number = parse_ordinal(word)
                    .filter(|_| word.chars().all(|c| c.is_ascii_digit()))
                    .ok_or_else(|| self.error(format!("invalid chapter number {:?}", word)))?;
                let parent = self.book;
                self.chapter = Some(self.attach(parent, Marker::chapter(number)));
                self.block = None;
                self.verse = None;
                self.text(rest);
            }
            "v" => {
                let (word, rest) = split_word(argument.unwrap_or_default());
                let number = parse_ordinal(word)
                    .ok_or_else(|| self.error(format!("invalid verse number {:?}", word)))?;
                let parent = self.block.or(self.chapter).or(self.book);
                self.verse = Some(self.attach(parent, Marker::verse(number)));
                self.text(rest);
            }
            _ if PARAGRAPH_TAGS.contains(&base) => {
                let parent = self.block_parent();
                let marker = Marker::new(MarkerKind::Paragraph, name);
                self.block = Some(self.attach(parent, marker));
                self.verse = None;
            }
            _ if LINE_TAGS.contains(&base) => {
                let parent = if BOOK_HEADER_TAGS.contains(&base) {
                    self.book
                } else {
                    self.block_parent()
                };
                let id = self.attach(parent, Marker::other(name));
                self.line_target = Some(id);
                self.block = None;
                self.verse = None;
            }
            _ => {
                let parent = self.block_parent();
                self.block = Some(self.attach(parent, Marker::other(name)));
                self.verse = None;
            }
        }
        Ok(())
    }

    fn open_note(&mut self, name: &str) {
        self.flush();
        let marker = if FOOTNOTE_TAGS.contains(&name) {
            Marker::new(MarkerKind::Footnote, name)
        } else {
            Marker::new(MarkerKind::CrossReference, name)
        };
        let parent = if self.line_target.is_some() {
            self.line_target
        } else {
            self.inline_parent()
        };
        let id = self.attach(parent, marker);
        self.note = Some(OpenNote {
            id,
            tag: name.to_string(),
            body: String::new(),
            caller_pending: true,
            line: self.line,
        });
    }

    fn close_marker(&mut self, name: &str) {
        if self.skipped_span.as_deref() == Some(name) {
            self.skipped_span = None;
            return;
        }
        let is_note = FOOTNOTE_TAGS.contains(&name) || CROSS_REFERENCE_TAGS.contains(&name);
        if !is_note {
            return;
        }
        match self.note.take() {
            Some(note) if note.tag == name => {
                let body = collapse_whitespace(&note.body);
                if let Some(marker) = self.tree.get_mut(note.id) {
                    marker.text = Some(body);
                }
            }
            Some(note) => {
                log::warn!(
                    "line {}: \\{}* does not close \\{}, ignoring",
                    self.line,
                    name,
                    note.tag
                );
                self.note = Some(note);
            }
            None => {
                log::warn!("line {}: stray \\{}* without an open note", self.line, name);
            }
        }
    }

    fn end_line(&mut self) {
        if let Some(span) = self.skipped_span.take() {
            log::warn!("line {}: \\{} is not closed on its line", self.line, span);
        }
        if let Some(note) = self.note.as_mut() {
            note.body.push(' ');
            return;
        }
        if let Some(target) = self.line_target.take() {
            if let Some(marker) = self.tree.get_mut(target) {
                let text = marker.text.as_deref().map(collapse_whitespace);
                marker.text = text.filter(|t| !t.is_empty());
            }
            return;
        }
        self.pending.push(' ');
    }

    fn finish(mut self) -> Result<MarkerTree, ParseError> {
        if let Some(note) = &self.note {
            return Err(ParseError::new(
                note.line,
                format!("\\{} note is never closed", note.tag),
            ));
        }
        self.flush();
        Ok(self.tree)
    }
}
