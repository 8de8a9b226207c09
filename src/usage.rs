//! Per-user usage log
//!
//! Each application start appends an "Open" line to `<directory>/<user>.txt`.
//! An identical line already present in the file is not written twice.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::UsageLogConfig;

/// Name identifying the current user in the usage log
pub fn current_user() -> String {
    ["USER", "USERNAME", "COMPUTERNAME", "HOSTNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Format a usage log line
pub fn format_entry(timestamp: &DateTime<Local>, user: &str) -> String {
    format!("{} {} Open\n", timestamp.format("%Y-%m-%d %H:%M:%S"), user)
}

/// Append `entry` to the user's log file unless it is already there.
/// Returns the log file path and whether a line was written.
pub fn append_entry(directory: &Path, user: &str, entry: &str) -> Result<(PathBuf, bool)> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create usage log directory: {:?}", directory))?;

    let log_path = directory.join(format!("{}.txt", user));
    let mut content = if log_path.exists() {
        fs::read_to_string(&log_path)
            .with_context(|| format!("Failed to read usage log: {:?}", log_path))?
    } else {
        String::new()
    };

    if content.contains(entry) {
        debug!("Usage entry already recorded in {:?}", log_path);
        return Ok((log_path, false));
    }

    content.push_str(entry);
    fs::write(&log_path, content)
        .with_context(|| format!("Failed to write usage log: {:?}", log_path))?;

    Ok((log_path, true))
}

/// Record an application start if the usage log is enabled. Never fatal.
pub fn record_open(config: &UsageLogConfig) {
    if !config.enabled {
        return;
    }

    let user = current_user();
    let entry = format_entry(&Local::now(), &user);

    match append_entry(Path::new(&config.directory), &user, &entry) {
        Ok((path, written)) => debug!("Usage log {:?} updated: {}", path, written),
        Err(e) => warn!("Failed to write usage log: {:#}", e),
    }
}
