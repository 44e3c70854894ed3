//! Marker parsing.
//!
//! The core treats parsing as an external collaborator behind the
//! [`MarkerParser`] trait. [`UsfmParser`] is the default implementation used
//! by the assembler and the CLI.

mod options;
mod usfm;

pub use options::ParseOptions;
pub use usfm::UsfmParser;

use crate::model::MarkerTree;
use thiserror::Error;

/// A markup-level error, positioned by line (1-based).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Turns the text of one input file into a marker tree.
pub trait MarkerParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<MarkerTree, ParseError>;
}
