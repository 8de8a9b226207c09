//! Category resolution, exclusion and file relocation
//!
//! A matched reference file's category is the name of the directory that
//! holds it. The target file is moved into a same-named subdirectory of its
//! own parent.

use crate::error::{ReconcileError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default marker for categories that must be reviewed again
pub const DEFAULT_EXCLUSION_MARKER: &str = "over";

/// Decides which categories are skipped when exclusion is enabled
#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Case-insensitive substring match
    Marker(String),
    /// Regular expression matched against the category name
    Pattern(Regex),
}

impl ExclusionRule {
    pub fn marker(marker: impl AsRef<str>) -> Self {
        ExclusionRule::Marker(marker.as_ref().to_lowercase())
    }

    pub fn pattern(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(ExclusionRule::Pattern)
    }

    pub fn is_excluded(&self, category: &str) -> bool {
        match self {
            ExclusionRule::Marker(marker) => category.to_lowercase().contains(marker.as_str()),
            ExclusionRule::Pattern(regex) => regex.is_match(category),
        }
    }
}

impl Default for ExclusionRule {
    fn default() -> Self {
        ExclusionRule::marker(DEFAULT_EXCLUSION_MARKER)
    }
}

/// What to do when the destination file already exists
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Abort the run and leave the target file where it is
    #[default]
    Fail,
    /// Replace the existing destination file
    Overwrite,
    /// Pick the first free "name (N).ext"
    Rename,
}

/// Category of a matched reference file: the name of its parent directory
pub fn category_of(reference_file: &Path) -> Option<&OsStr> {
    reference_file.parent().and_then(Path::file_name)
}

/// Compute where `file_name` lands inside `category_dir` under `policy`
pub fn resolve_destination(
    category_dir: &Path,
    file_name: &OsStr,
    policy: ConflictPolicy,
) -> Result<PathBuf> {
    let destination = category_dir.join(file_name);
    if !destination.exists() {
        return Ok(destination);
    }

    match policy {
        ConflictPolicy::Fail => Err(ReconcileError::DestinationExists(destination)),
        ConflictPolicy::Overwrite => {
            debug!("Overwriting existing file {}", destination.display());
            Ok(destination)
        }
        ConflictPolicy::Rename => Ok(next_free_name(category_dir, file_name)),
    }
}

fn next_free_name(dir: &Path, file_name: &OsStr) -> PathBuf {
    let original = Path::new(file_name);
    let stem = original.file_stem().unwrap_or(file_name);
    let extension = original.extension();

    (1u32..)
        .map(|n| {
            let mut name = OsString::from(stem);
            name.push(format!(" ({})", n));
            if let Some(ext) = extension {
                name.push(".");
                name.push(ext);
            }
            dir.join(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| dir.join(file_name))
}

/// Move `file` into `<target_dir>/<category>/`, creating the category
/// directory if needed. Returns the final path of the file.
pub fn move_into_category(
    file: &Path,
    target_dir: &Path,
    category: &OsStr,
    policy: ConflictPolicy,
) -> Result<PathBuf> {
    let category_dir = target_dir.join(category);
    fs::create_dir_all(&category_dir).map_err(|source| ReconcileError::CreateCategory {
        path: category_dir.clone(),
        source,
    })?;

    let file_name = file.file_name().unwrap_or_else(|| file.as_os_str());
    let destination = resolve_destination(&category_dir, file_name, policy)?;

    fs::rename(file, &destination).map_err(|source| ReconcileError::Move {
        from: file.to_path_buf(),
        to: destination.clone(),
        source,
    })?;

    Ok(destination)
}
