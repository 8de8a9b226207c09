//! Release folder version gate
//!
//! Released executables are published to a shared folder with the major
//! version in their name (`<prefix><major>...`). A build older than the
//! newest release is asked to update before running.

use anyhow::{bail, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::config::VersionGateConfig;

/// Outcome of comparing this build against the release folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    UpToDate { current: u32, latest: u32 },
    UpdateAvailable { current: u32, latest: u32 },
    Unavailable(String),
}

/// Major version of this build
pub fn current_major() -> u32 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}

/// Highest major version among `names` carrying `prefix`
pub fn latest_release<'a>(names: impl IntoIterator<Item = &'a str>, prefix: &str) -> Option<u32> {
    let pattern = format!(r"^{}(\d+)", regex::escape(prefix));
    let Ok(regex) = Regex::new(&pattern) else {
        return None;
    };

    names
        .into_iter()
        .filter_map(|name| regex.captures(name))
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .max()
}

/// Compare `current` against the releases published in `config.release_directory`
pub fn check_release_directory(config: &VersionGateConfig, current: u32) -> VersionStatus {
    let dir = Path::new(&config.release_directory);
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            return VersionStatus::Unavailable(format!(
                "Cannot read release directory {}: {}",
                dir.display(),
                e
            ))
        }
    };

    let names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    match latest_release(names.iter().map(String::as_str), &config.executable_prefix) {
        Some(latest) if current < latest => {
            debug!("Release {} available, running {}", latest, current);
            VersionStatus::UpdateAvailable { current, latest }
        }
        Some(latest) => VersionStatus::UpToDate { current, latest },
        None => VersionStatus::Unavailable(format!(
            "No release matching {}<version> found in {}",
            config.executable_prefix,
            dir.display()
        )),
    }
}

/// Run the gate for this build; `None` when the gate is disabled
pub fn check(config: &VersionGateConfig) -> Option<VersionStatus> {
    if !config.enabled {
        return None;
    }
    Some(check_release_directory(config, current_major()))
}

/// Refuse to run when an update is published or the release folder is unreachable
pub fn ensure_allows_run(config: &VersionGateConfig) -> Result<()> {
    match check(config) {
        None | Some(VersionStatus::UpToDate { .. }) => Ok(()),
        Some(VersionStatus::UpdateAvailable { current, latest }) => bail!(
            "Please update to the latest release (running V{}, latest V{} in {})",
            current,
            latest,
            config.release_directory
        ),
        Some(VersionStatus::Unavailable(reason)) => {
            bail!("Release folder not accessible: {}", reason)
        }
    }
}
