//! System health checks for mirrorsort
//!
//! This module provides preflight checks to verify the configured roots,
//! the usage log location and the release version before running.

use crate::config::expand_path;
use crate::version::{self, VersionStatus};
use crate::Config;
use std::path::Path;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Configured target root status
    pub target_root: CheckResult,
    /// Configured reference root status
    pub reference_root: CheckResult,
    /// Usage log directory status (warning only, never blocks a run)
    pub usage_log: CheckResult,
    /// Release version status
    pub version: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub fn run(config: &Config) -> Self {
        Self {
            target_root: Self::check_root("Target root", config.target_root.as_deref()),
            reference_root: Self::check_root("Reference root", config.reference_root.as_deref()),
            usage_log: Self::check_usage_log(config),
            version: Self::check_version(config),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.target_root.passed
            && self.reference_root.passed
            && self.usage_log.passed
            && self.version.passed
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.results()
            .into_iter()
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.results()
            .into_iter()
            .filter(|r| r.is_warning)
            .collect()
    }

    fn results(&self) -> [&CheckResult; 4] {
        [
            &self.target_root,
            &self.reference_root,
            &self.usage_log,
            &self.version,
        ]
    }

    /// Check that a configured root is a readable directory.
    /// An unset root only warns, since it can be given on the command line.
    fn check_root(label: &str, root: Option<&str>) -> CheckResult {
        let Some(root) = root else {
            return CheckResult::warning_with_details(
                format!("{} not configured", label),
                "Pass it on the command line or set it in the config file",
            );
        };

        let expanded = match expand_path(root) {
            Ok(expanded) => expanded,
            Err(e) => {
                return CheckResult::error_with_details(
                    format!("Invalid {} path", label.to_lowercase()),
                    e.to_string(),
                )
            }
        };

        let path = Path::new(&expanded);
        if !path.is_dir() {
            return CheckResult::error_with_details(
                format!("{} does not exist", label),
                expanded.clone(),
            );
        }

        match std::fs::read_dir(path) {
            Ok(_) => CheckResult::ok_with_details(format!("{} readable", label), expanded),
            Err(e) => CheckResult::error_with_details(
                format!("{} is not readable", label),
                format!("{}: {}", expanded, e),
            ),
        }
    }

    /// Check usage log directory (warning only)
    fn check_usage_log(config: &Config) -> CheckResult {
        if !config.usage_log.enabled {
            return CheckResult::ok("Usage log disabled");
        }

        let dir = Path::new(&config.usage_log.directory);
        match std::fs::create_dir_all(dir) {
            Ok(()) => CheckResult::ok_with_details(
                "Usage log directory writable",
                config.usage_log.directory.clone(),
            ),
            Err(e) => CheckResult::warning_with_details(
                "Usage log directory unavailable",
                format!("{}: {}", config.usage_log.directory, e),
            ),
        }
    }

    /// Check this build against the release folder
    fn check_version(config: &Config) -> CheckResult {
        match version::check(&config.version_gate) {
            None => CheckResult::ok("Version gate disabled"),
            Some(status) => Self::version_result(&status),
        }
    }

    fn version_result(status: &VersionStatus) -> CheckResult {
        match status {
            VersionStatus::UpToDate { current, latest } => CheckResult::ok_with_details(
                "Running the latest release",
                format!("current V{}, latest V{}", current, latest),
            ),
            VersionStatus::UpdateAvailable { current, latest } => CheckResult::error_with_details(
                "Please update to the latest release",
                format!("current V{}, latest V{}", current, latest),
            ),
            VersionStatus::Unavailable(reason) => {
                CheckResult::error_with_details("Release folder not accessible", reason.clone())
            }
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 4] {
        [
            ("Target Root", &self.target_root),
            ("Reference Root", &self.reference_root),
            ("Usage Log", &self.usage_log),
            ("Version", &self.version),
        ]
    }
}
