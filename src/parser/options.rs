//! Parsing options and configuration.

/// Options for parsing marked-up scripture text.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Markers dropped entirely, without the backslash (e.g. "s5")
    pub ignored_markers: Vec<String>,

    /// Apply Unicode NFC normalization to text
    pub normalize_unicode: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of ignored markers.
    pub fn with_ignored_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Add one ignored marker.
    pub fn ignore_marker(mut self, marker: impl Into<String>) -> Self {
        self.ignored_markers.push(marker.into());
        self
    }

    /// Enable or disable Unicode normalization.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Check whether a marker name is ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_markers.iter().any(|m| m == name)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            // Chunk markers left behind by translation tools
            ignored_markers: vec!["s5".to_string()],
            normalize_unicode: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .ignore_marker("rem")
            .with_normalization(false);

        assert!(options.is_ignored("s5"));
        assert!(options.is_ignored("rem"));
        assert!(!options.normalize_unicode);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.ignored_markers, vec!["s5"]);
        assert!(options.normalize_unicode);
    }

    #[test]
    fn test_replace_ignored_markers() {
        let options = ParseOptions::new().with_ignored_markers(["ide", "sts"]);
        assert!(!options.is_ignored("s5"));
        assert!(options.is_ignored("sts"));
    }
}
