//! Error types for usfmconv library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for usfmconv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during a conversion run.
///
/// Every stage fails the whole run: there is no partial-document mode.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error not attributable to a specific input or output path.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The assembler was given an empty file list.
    #[error("No input files given")]
    NoInputFiles,

    /// An input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The marker parser rejected an input file.
    #[error("Parse error in {} at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// An option value is outside its enumerated domain.
    #[error("Unsupported option value for {field}: {value:?}")]
    UnsupportedOption { field: &'static str, value: String },

    /// An option value is in range of its type but not acceptable.
    #[error("Invalid option {field}: {message}")]
    InvalidOption {
        field: &'static str,
        message: String,
    },

    /// The merged marker tree violates a structural invariant.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A book code appeared in more than one input under the `Reject` policy.
    #[error("Duplicate book {code} in {}", path.display())]
    DuplicateBook { code: String, path: PathBuf },

    /// The requested output format has no emitter.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The output path is not writable.
    #[error("Cannot write to {}: {source}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the rendered output failed for a reason other than access.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled between file parses.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Error inside an emitter.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error while packaging a DOCX archive.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Path of the input or output file this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Read { path, .. }
            | Error::Parse { path, .. }
            | Error::DuplicateBook { path, .. }
            | Error::PermissionDenied { path, .. }
            | Error::Write { path, .. } => Some(path),
            _ => None,
        }
    }
}
