use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reconcile::ReconcileOptions;
use crate::relocate::{ConflictPolicy, ExclusionRule, DEFAULT_EXCLUSION_MARKER};

/// Main configuration structure for mirrorsort
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Default folder whose files get reorganized
    #[serde(default)]
    pub target_root: Option<String>,

    /// Default folder whose categorization is mirrored
    #[serde(default)]
    pub reference_root: Option<String>,

    /// Reconciliation behavior settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-user usage log
    #[serde(default)]
    pub usage_log: UsageLogConfig,

    /// Release folder version check
    #[serde(default)]
    pub version_gate: VersionGateConfig,
}

/// Reconciliation configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReconcileConfig {
    /// Leave files in place when their category carries the exclusion marker
    #[serde(default = "default_true")]
    pub exclude_marked_category: bool,

    /// Case-insensitive substring marking excluded categories
    #[serde(default = "default_exclusion_marker")]
    pub exclusion_marker: String,

    /// Regex used instead of the marker when set
    #[serde(default)]
    pub exclusion_pattern: Option<String>,

    /// Behavior when the destination file already exists
    #[serde(default)]
    pub on_conflict: ConflictPolicy,

    /// Pause before reporting completion, in milliseconds
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

/// Usage log configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UsageLogConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding one `<user>.txt` file per user
    #[serde(default = "default_usage_log_dir")]
    pub directory: String,
}

/// Version gate configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VersionGateConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Shared folder where released executables are published
    #[serde(default)]
    pub release_directory: String,

    /// File name prefix followed by the major version, e.g. "mirrorsort_V9.exe"
    #[serde(default = "default_executable_prefix")]
    pub executable_prefix: String,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_exclusion_marker() -> String {
    DEFAULT_EXCLUSION_MARKER.to_string()
}
fn default_completion_delay_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

fn default_usage_log_dir() -> String {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        format!("{}/mirrorsort/usage", data_home)
    } else if let Ok(home) = std::env::var("HOME") {
        format!("{}/.local/share/mirrorsort/usage", home)
    } else {
        "/tmp/mirrorsort-usage".to_string()
    }
}
fn default_executable_prefix() -> String {
    "mirrorsort_V".to_string()
}

// Default implementations
impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            exclude_marked_category: default_true(),
            exclusion_marker: default_exclusion_marker(),
            exclusion_pattern: None,
            on_conflict: ConflictPolicy::default(),
            completion_delay_ms: default_completion_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl Default for UsageLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_usage_log_dir(),
        }
    }
}

impl Default for VersionGateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            release_directory: String::new(),
            executable_prefix: default_executable_prefix(),
        }
    }
}

impl ReconcileConfig {
    /// Exclusion rule: the pattern when configured, the marker otherwise
    pub fn exclusion_rule(&self) -> Result<ExclusionRule> {
        match &self.exclusion_pattern {
            Some(pattern) => ExclusionRule::pattern(pattern)
                .with_context(|| format!("Invalid exclusion pattern: {}", pattern)),
            None => Ok(ExclusionRule::marker(&self.exclusion_marker)),
        }
    }

    /// Build run options from this configuration
    pub fn to_options(&self) -> Result<ReconcileOptions> {
        Ok(ReconcileOptions {
            exclusion: self.exclusion_rule()?,
            on_conflict: self.on_conflict,
            completion_delay: Duration::from_millis(self.completion_delay_ms),
            dry_run: false,
        })
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        // Surface a bad exclusion pattern at load time rather than mid-run
        config.reconcile.exclusion_rule()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("mirrorsort").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(root) = &self.target_root {
            self.target_root = Some(expand_path(root).context("Failed to expand target_root path")?);
        }

        if let Some(root) = &self.reference_root {
            self.reference_root =
                Some(expand_path(root).context("Failed to expand reference_root path")?);
        }

        self.usage_log.directory = expand_path(&self.usage_log.directory)
            .context("Failed to expand usage_log.directory path")?;

        if !self.version_gate.release_directory.is_empty() {
            self.version_gate.release_directory =
                expand_path(&self.version_gate.release_directory)
                    .context("Failed to expand version_gate.release_directory path")?;
        }

        Ok(())
    }
}

/// Expand `~` and environment variables, then normalise the path
pub fn expand_path(raw: &str) -> Result<String> {
    let expanded = shellexpand::full(raw.trim())?;
    Ok(path_clean::clean(expanded.as_ref())
        .to_string_lossy()
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    // Helper function to create a temporary config directory
    fn setup_test_config_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("mirrorsort");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        (temp_dir, config_dir)
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert!(config.target_root.is_none());
        assert!(config.reference_root.is_none());
        assert!(config.reconcile.exclude_marked_category);
        assert_eq!(config.reconcile.exclusion_marker, "over");
        assert!(config.reconcile.exclusion_pattern.is_none());
        assert_eq!(config.reconcile.on_conflict, ConflictPolicy::Fail);
        assert_eq!(config.reconcile.completion_delay_ms, 100);
        assert!(!config.usage_log.enabled);
        assert!(!config.version_gate.enabled);
        assert_eq!(config.version_gate.executable_prefix, "mirrorsort_V");
    }

    #[test]
    #[serial]
    fn test_expand_paths() {
        env::set_var("TEST_MIRRORSORT_HOME", "/test/home");

        let mut config = Config::default();
        config.target_root = Some("${TEST_MIRRORSORT_HOME}/photos/../lots".to_string());
        config.usage_log.directory = "$TEST_MIRRORSORT_HOME/usage/".to_string();

        config.expand_paths().expect("Failed to expand paths");

        assert_eq!(config.target_root.as_deref(), Some("/test/home/lots"));
        assert_eq!(config.usage_log.directory, "/test/home/usage");
        assert!(config.reference_root.is_none());

        env::remove_var("TEST_MIRRORSORT_HOME");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let nonexistent_path = Path::new("/nonexistent/path/config.yml");
        let result = Config::load(nonexistent_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let (_temp_dir, config_dir) = setup_test_config_dir();
        let config_path = config_dir.join("config.yml");

        let mut config = Config::default();
        config.target_root = Some("/custom/target".to_string());
        config.reconcile.on_conflict = ConflictPolicy::Rename;
        config.reconcile.exclusion_marker = "recheck".to_string();

        config.save(&config_path).expect("Failed to save config");
        let loaded_config = Config::load(&config_path).expect("Failed to load config");

        assert_eq!(loaded_config.target_root.as_deref(), Some("/custom/target"));
        assert_eq!(loaded_config.reconcile.on_conflict, ConflictPolicy::Rename);
        assert_eq!(loaded_config.reconcile.exclusion_marker, "recheck");
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("mirrorsort"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    fn test_invalid_pattern_rejected_on_load() {
        let (_temp_dir, config_dir) = setup_test_config_dir();
        let config_path = config_dir.join("config.yml");
        std::fs::write(&config_path, "reconcile:\n  exclusion_pattern: \"(\"\n").unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("Invalid exclusion pattern"));
    }

    #[test]
    fn test_to_options() {
        let mut reconcile = ReconcileConfig::default();
        reconcile.completion_delay_ms = 0;
        reconcile.exclusion_pattern = Some("^Over".to_string());

        let options = reconcile.to_options().unwrap();
        assert!(options.completion_delay.is_zero());
        assert!(options.exclusion.is_excluded("OverKill"));
        assert!(!options.exclusion.is_excluded("Leftover"));
        assert!(!options.dry_run);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
target_root: "/data/aoi"
reference_root: "/data/reviewed"
reconcile:
  exclude_marked_category: false
  exclusion_marker: "Recheck"
  on_conflict: overwrite
  completion_delay_ms: 0
logging:
  level: "debug"
  format: "json"
  color: false
usage_log:
  enabled: true
  directory: "/srv/logs"
version_gate:
  enabled: true
  release_directory: "/srv/apps"
  executable_prefix: "Comparison_V"
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.target_root.as_deref(), Some("/data/aoi"));
        assert_eq!(config.reference_root.as_deref(), Some("/data/reviewed"));
        assert!(!config.reconcile.exclude_marked_category);
        assert_eq!(config.reconcile.exclusion_marker, "Recheck");
        assert_eq!(config.reconcile.on_conflict, ConflictPolicy::Overwrite);
        assert_eq!(config.reconcile.completion_delay_ms, 0);
        assert!(!config.logging.color);
        assert!(config.usage_log.enabled);
        assert_eq!(config.usage_log.directory, "/srv/logs");
        assert!(config.version_gate.enabled);
        assert_eq!(config.version_gate.executable_prefix, "Comparison_V");
    }
}
