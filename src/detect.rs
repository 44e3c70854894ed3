//! Input file recognition.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// File extensions accepted as marked-up scripture input (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["usfm", "sfm", "txt"];

/// Byte-order mark some editors prepend to UTF-8 files.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const ID_MARKER: &[u8] = b"\\id";

/// Number of leading bytes inspected when sniffing a file.
const SNIFF_LEN: usize = 64;

/// Check whether a path has a supported input extension.
///
/// # Example
/// ```
/// use usfmconv::detect::is_supported_input;
///
/// assert!(is_supported_input("01-GEN.usfm"));
/// assert!(is_supported_input("notes.TXT"));
/// assert!(!is_supported_input("cover.png"));
/// ```
pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

/// Read the book code from the first `\id` line of a file.
pub fn detect_book_code_from_path<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    BufReader::new(file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(detect_book_code(&header))
}

/// Read the book code from the start of a file's bytes.
///
/// Returns `None` unless the data starts (after an optional BOM and leading
/// whitespace) with an `\id` marker followed by a code.
pub fn detect_book_code(data: &[u8]) -> Option<String> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let rest = data[start..].strip_prefix(ID_MARKER)?;

    // "\idx" is a different marker
    if !rest.first().is_some_and(|b| b.is_ascii_whitespace()) {
        return None;
    }

    let code: String = rest
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_alphanumeric())
        .map(|b| b.to_ascii_uppercase() as char)
        .collect();

    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Expand inputs into an ordered file list.
///
/// Files are kept in the given order. Directories are searched recursively
/// for supported files, which are inserted sorted by path at the directory's
/// position.
pub fn collect_input_files<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            let mut found = Vec::new();
            walk_dir(input, &mut found)?;
            found.sort();
            log::debug!("{}: {} input files", input.display(), found.len());
            files.extend(found);
        } else {
            files.push(input.to_path_buf());
        }
    }
    Ok(files)
}

fn walk_dir(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk_dir(&path, found)?;
        } else if is_supported_input(&path) {
            found.push(path);
        }
    }
    Ok(())
}
