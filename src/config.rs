//! Format configuration: user-chosen rendering options.
//!
//! Raw selections arrive as [`RawOptions`] from the CLI, a JSON options file,
//! or code. [`FormatConfig::build`] validates them once; a built configuration
//! is always valid for the layout transform.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted column count.
pub const MAX_COLUMNS: u8 = 4;

/// Body text size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    /// Body font size in points.
    pub fn points(self) -> u32 {
        match self {
            TextSize::Small => 10,
            TextSize::Medium => 12,
            TextSize::Large => 14,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "small" => Some(TextSize::Small),
            "medium" => Some(TextSize::Medium),
            "large" => Some(TextSize::Large),
            _ => None,
        }
    }
}

/// Line spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineSpacing {
    #[default]
    Single,
    OneAndHalf,
    Double,
}

impl LineSpacing {
    /// Multiple of the normal line height.
    pub fn factor(self) -> f32 {
        match self {
            LineSpacing::Single => 1.0,
            LineSpacing::OneAndHalf => 1.5,
            LineSpacing::Double => 2.0,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1" | "1.0" => return Some(LineSpacing::Single),
            "1.5" => return Some(LineSpacing::OneAndHalf),
            "2" | "2.0" => return Some(LineSpacing::Double),
            _ => {}
        }
        match normalize(s).as_str() {
            "single" => Some(LineSpacing::Single),
            "oneandhalf" | "onehalf" => Some(LineSpacing::OneAndHalf),
            "double" => Some(LineSpacing::Double),
            _ => None,
        }
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Justified,
}

impl Alignment {
    fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "left" => Some(Alignment::Left),
            "justified" | "justify" => Some(Alignment::Justified),
            _ => None,
        }
    }
}

/// Writing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        self == Direction::RightToLeft
    }

    fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "lefttoright" | "ltr" => Some(Direction::LeftToRight),
            "righttoleft" | "rtl" => Some(Direction::RightToLeft),
            _ => None,
        }
    }
}

/// Lowercase and drop separators so "One_And_Half", "one-and-half" and "1.5" compare.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Raw option selections as delivered by a configuration source.
///
/// Every field is optional; unset fields take documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOptions {
    /// "small", "medium" or "large" (default medium)
    pub text_size: Option<String>,

    /// "single", "one_and_half" or "double" (default single)
    pub line_spacing: Option<String>,

    /// "left" or "justified"; takes precedence over `justified`
    pub alignment: Option<String>,

    /// Boolean form of the alignment selector
    pub justified: Option<bool>,

    /// "ltr" or "rtl"; takes precedence over `left_to_right`
    pub direction: Option<String>,

    /// Boolean form of the direction selector
    pub left_to_right: Option<bool>,

    /// Number of text columns (default 1)
    pub column_count: Option<i64>,

    pub chapter_break: Option<bool>,

    pub verse_break: Option<bool>,

    pub include_footnotes: Option<bool>,

    pub table_of_contents: Option<bool>,
}

impl RawOptions {
    /// Create empty raw options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load raw options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse raw options from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidOption {
            field: "options",
            message: e.to_string(),
        })
    }

    pub fn with_text_size(mut self, size: impl Into<String>) -> Self {
        self.text_size = Some(size.into());
        self
    }

    pub fn with_line_spacing(mut self, spacing: impl Into<String>) -> Self {
        self.line_spacing = Some(spacing.into());
        self
    }

    pub fn with_alignment(mut self, alignment: impl Into<String>) -> Self {
        self.alignment = Some(alignment.into());
        self
    }

    pub fn with_justified(mut self, justified: bool) -> Self {
        self.justified = Some(justified);
        self
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_left_to_right(mut self, ltr: bool) -> Self {
        self.left_to_right = Some(ltr);
        self
    }

    pub fn with_columns(mut self, count: i64) -> Self {
        self.column_count = Some(count);
        self
    }

    pub fn with_chapter_break(mut self, enabled: bool) -> Self {
        self.chapter_break = Some(enabled);
        self
    }

    pub fn with_verse_break(mut self, enabled: bool) -> Self {
        self.verse_break = Some(enabled);
        self
    }

    pub fn with_footnotes(mut self, enabled: bool) -> Self {
        self.include_footnotes = Some(enabled);
        self
    }

    pub fn with_table_of_contents(mut self, enabled: bool) -> Self {
        self.table_of_contents = Some(enabled);
        self
    }
}

/// Validated, immutable rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatConfig {
    text_size: TextSize,
    line_spacing: LineSpacing,
    alignment: Alignment,
    direction: Direction,
    column_count: u8,
    chapter_break: bool,
    verse_break: bool,
    include_footnotes: bool,
    table_of_contents: bool,
}

impl FormatConfig {
    /// Validate and normalize raw selections.
    ///
    /// Empty or unset selectors take their defaults. A value outside its
    /// enumerated domain fails with [`Error::UnsupportedOption`] naming the
    /// field; a column count outside `1..=MAX_COLUMNS` fails with
    /// [`Error::InvalidOption`].
    pub fn build(raw: &RawOptions) -> Result<Self> {
        let text_size = parse_selector("text_size", raw.text_size.as_deref(), TextSize::parse)?
            .unwrap_or_default();

        let line_spacing =
            parse_selector("line_spacing", raw.line_spacing.as_deref(), LineSpacing::parse)?
                .unwrap_or_default();

        let alignment =
            match parse_selector("alignment", raw.alignment.as_deref(), Alignment::parse)? {
                Some(alignment) => alignment,
                None if raw.justified == Some(true) => Alignment::Justified,
                None => Alignment::Left,
            };

        let direction =
            match parse_selector("direction", raw.direction.as_deref(), Direction::parse)? {
                Some(direction) => direction,
                None if raw.left_to_right == Some(false) => Direction::RightToLeft,
                None => Direction::LeftToRight,
            };

        let column_count = match raw.column_count {
            None => 1,
            Some(n) if (1..=i64::from(MAX_COLUMNS)).contains(&n) => n as u8,
            Some(n) => {
                return Err(Error::InvalidOption {
                    field: "column_count",
                    message: format!("{} is not in 1..={}", n, MAX_COLUMNS),
                })
            }
        };

        let config = Self {
            text_size,
            line_spacing,
            alignment,
            direction,
            column_count,
            chapter_break: raw.chapter_break.unwrap_or(false),
            verse_break: raw.verse_break.unwrap_or(false),
            include_footnotes: raw.include_footnotes.unwrap_or(false),
            table_of_contents: raw.table_of_contents.unwrap_or(false),
        };
        log::debug!("Built format configuration: {:?}", config);
        Ok(config)
    }

    pub fn text_size(&self) -> TextSize {
        self.text_size
    }

    pub fn line_spacing(&self) -> LineSpacing {
        self.line_spacing
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn column_count(&self) -> u8 {
        self.column_count
    }

    /// Insert a page break before every chapter.
    pub fn chapter_break(&self) -> bool {
        self.chapter_break
    }

    /// Start every verse on a new line.
    pub fn verse_break(&self) -> bool {
        self.verse_break
    }

    pub fn include_footnotes(&self) -> bool {
        self.include_footnotes
    }

    pub fn table_of_contents(&self) -> bool {
        self.table_of_contents
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            text_size: TextSize::Medium,
            line_spacing: LineSpacing::Single,
            alignment: Alignment::Left,
            direction: Direction::LeftToRight,
            column_count: 1,
            chapter_break: false,
            verse_break: false,
            include_footnotes: false,
            table_of_contents: false,
        }
    }
}

fn parse_selector<T>(
    field: &'static str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse(s).map(Some).ok_or_else(|| Error::UnsupportedOption {
            field,
            value: s.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_options_take_defaults() {
        let config = FormatConfig::build(&RawOptions::new()).unwrap();
        assert_eq!(config, FormatConfig::default());
        assert_eq!(config.text_size(), TextSize::Medium);
        assert_eq!(config.line_spacing(), LineSpacing::Single);
    }

    #[test]
    fn test_empty_selector_is_unset() {
        let raw = RawOptions::new().with_text_size("").with_line_spacing("  ");
        let config = FormatConfig::build(&raw).unwrap();
        assert_eq!(config.text_size(), TextSize::Medium);
        assert_eq!(config.line_spacing(), LineSpacing::Single);
    }

    #[test]
    fn test_selectors_are_case_insensitive() {
        let raw = RawOptions::new()
            .with_text_size("LARGE")
            .with_line_spacing("One_And_Half")
            .with_alignment("Justified")
            .with_direction("RTL");
        let config = FormatConfig::build(&raw).unwrap();
        assert_eq!(config.text_size(), TextSize::Large);
        assert_eq!(config.line_spacing(), LineSpacing::OneAndHalf);
        assert_eq!(config.alignment(), Alignment::Justified);
        assert_eq!(config.direction(), Direction::RightToLeft);
    }

    #[test]
    fn test_line_spacing_numeric_forms() {
        for (input, expected) in [
            ("1", LineSpacing::Single),
            ("1.5", LineSpacing::OneAndHalf),
            ("1.0", LineSpacing::Single),
            (" 2 ", LineSpacing::Double),
            ("2.0", LineSpacing::Double),
        ] {
            let raw = RawOptions::new().with_line_spacing(input);
            assert_eq!(FormatConfig::build(&raw).unwrap().line_spacing(), expected);
        }
    }

    #[test]
    fn test_line_spacing_rejects_other_numbers() {
        for input in ["10", "15", "20", "1.50", "3"] {
            let raw = RawOptions::new().with_line_spacing(input);
            match FormatConfig::build(&raw) {
                Err(Error::UnsupportedOption { field, value }) => {
                    assert_eq!(field, "line_spacing");
                    assert_eq!(value, input);
                }
                other => panic!("{input:?} gave {:?}", other),
            }
        }
    }

    #[test]
    fn test_boolean_selectors() {
        let raw = RawOptions::new()
            .with_justified(true)
            .with_left_to_right(false);
        let config = FormatConfig::build(&raw).unwrap();
        assert_eq!(config.alignment(), Alignment::Justified);
        assert!(config.direction().is_rtl());
    }

    #[test]
    fn test_string_selector_wins_over_boolean() {
        let raw = RawOptions::new().with_alignment("left").with_justified(true);
        let config = FormatConfig::build(&raw).unwrap();
        assert_eq!(config.alignment(), Alignment::Left);
    }

    #[test]
    fn test_unsupported_option_names_field() {
        let raw = RawOptions::new().with_text_size("huge");
        let err = FormatConfig::build(&raw).unwrap_err();
        match err {
            Error::UnsupportedOption { field, value } => {
                assert_eq!(field, "text_size");
                assert_eq!(value, "huge");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_column_count_bounds() {
        for bad in [0, -1, i64::from(MAX_COLUMNS) + 1] {
            let raw = RawOptions::new().with_columns(bad);
            assert!(matches!(
                FormatConfig::build(&raw),
                Err(Error::InvalidOption {
                    field: "column_count",
                    ..
                })
            ));
        }
        let raw = RawOptions::new().with_columns(2);
        assert_eq!(FormatConfig::build(&raw).unwrap().column_count(), 2);
    }

    #[test]
    fn test_flags() {
        let raw = RawOptions::new()
            .with_chapter_break(true)
            .with_verse_break(true)
            .with_footnotes(true)
            .with_table_of_contents(true);
        let config = FormatConfig::build(&raw).unwrap();
        assert!(config.chapter_break());
        assert!(config.verse_break());
        assert!(config.include_footnotes());
        assert!(config.table_of_contents());
    }

    #[test]
    fn test_from_json() {
        let raw = RawOptions::from_json(
            r#"{"text_size": "small", "column_count": 2, "chapter_break": true}"#,
        )
        .unwrap();
        assert_eq!(raw.text_size.as_deref(), Some("small"));
        assert_eq!(raw.column_count, Some(2));
        assert_eq!(raw.line_spacing, None);

        assert!(matches!(
            RawOptions::from_json("{not json"),
            Err(Error::InvalidOption { field: "options", .. })
        ));
    }

    #[test]
    fn test_size_helpers() {
        assert_eq!(TextSize::Small.points(), 10);
        assert_eq!(TextSize::Large.points(), 14);
        assert_eq!(LineSpacing::Double.factor(), 2.0);
    }
}
