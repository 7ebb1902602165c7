/// Directory scan: list the top level of one directory, keep the regular
/// files whose path contains a filter substring, and pair each with its
/// last-modified time.
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// A matched file and its last-modified timestamp.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub modified: DateTime<Local>,
}

/// Errors from scanning a directory.
#[derive(Debug)]
pub enum ScanError {
    /// The target directory could not be opened for listing.
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An entry could not be read while iterating the directory.
    Entry {
        dir: PathBuf,
        source: std::io::Error,
    },
    /// A matching file's metadata (type or mtime) could not be read.
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::ReadDir { path, source } => {
                write!(f, "failed to read directory {}: {source}", path.display())
            }
            ScanError::Entry { dir, source } => {
                write!(
                    f,
                    "failed to read an entry of {}: {source}",
                    dir.display()
                )
            }
            ScanError::Metadata { path, source } => {
                write!(
                    f,
                    "failed to read metadata for {}: {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::ReadDir { source, .. } => Some(source),
            ScanError::Entry { source, .. } => Some(source),
            ScanError::Metadata { source, .. } => Some(source),
        }
    }
}

/// Iterate the top-level entries of `dir`, yielding each regular file whose
/// displayed path contains `filter` (case-sensitive substring, no globs or
/// regex), paired with its last-modified time.
///
/// Matches are yielded in directory order as they are discovered so the
/// caller can report them streaming. Subdirectories are never descended into;
/// an entry that is not a regular file never matches.
pub fn matching_files<'a>(
    dir: &'a Path,
    filter: &'a str,
) -> Result<impl Iterator<Item = Result<LogFile, ScanError>> + 'a, ScanError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    Ok(entries.filter_map(move |entry| scan_entry(dir, filter, entry).transpose()))
}

/// Resolve one directory entry to a match, a non-match, or an error.
fn scan_entry(
    dir: &Path,
    filter: &str,
    entry: std::io::Result<std::fs::DirEntry>,
) -> Result<Option<LogFile>, ScanError> {
    let entry = entry.map_err(|e| ScanError::Entry {
        dir: dir.to_path_buf(),
        source: e,
    })?;

    let path = entry.path();
    if !path.to_string_lossy().contains(filter) {
        return Ok(None);
    }

    let file_type = entry.file_type().map_err(|e| ScanError::Metadata {
        path: path.clone(),
        source: e,
    })?;
    if !file_type.is_file() {
        return Ok(None);
    }

    let modified = entry
        .metadata()
        .and_then(|meta| meta.modified())
        .map_err(|e| ScanError::Metadata {
            path: path.clone(),
            source: e,
        })?;

    Ok(Some(LogFile {
        path,
        modified: modified.into(),
    }))
}
