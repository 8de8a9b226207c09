//! Directory scanning and name matching between the target and reference trees
//!
//! Top-level directories are joined by exact base name. Files are looked up in
//! the reference tree by exact file name, top-down: the files of a directory
//! are checked before any of its subdirectories are entered.

use crate::error::{ReconcileError, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A directory identified by its base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: PathBuf,
}

impl DirectoryEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Base name used as the join key between the two trees
    pub fn name(&self) -> &OsStr {
        self.path
            .file_name()
            .unwrap_or_else(|| self.path.as_os_str())
    }

    pub fn display_name(&self) -> String {
        self.name().to_string_lossy().into_owned()
    }
}

/// List the immediate subdirectories of a root, in listing order
pub fn list_directories(root: &Path) -> Result<Vec<DirectoryEntry>> {
    let unreadable = |source| ReconcileError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    };

    let mut directories = Vec::new();
    for entry in fs::read_dir(root).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_dir() {
            directories.push(DirectoryEntry::new(path));
        }
    }

    debug!(
        "Found {} top-level directories in {}",
        directories.len(),
        root.display()
    );
    Ok(directories)
}

/// List the regular files directly inside a directory, in listing order
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let enumerate = |source| ReconcileError::Enumerate {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(enumerate)? {
        let path = entry.map_err(enumerate)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// First candidate whose base name equals `name` exactly (case-sensitive)
pub fn find_reference_dir<'a>(
    name: &OsStr,
    candidates: &'a [DirectoryEntry],
) -> Option<&'a DirectoryEntry> {
    candidates.iter().find(|candidate| candidate.name() == name)
}

/// Search `root` recursively for a file named `file_name`.
///
/// Directories are visited depth-first in walk order and each one is checked
/// for the file before descending further, so a match directly inside a
/// directory wins over matches in its subdirectories. Stops at the first hit.
pub fn find_file_recursive(root: &Path, file_name: &OsStr) -> Result<Option<PathBuf>> {
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| ReconcileError::Search {
            path: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let candidate = entry.path().join(file_name);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}
