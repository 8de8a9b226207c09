//! Common test utilities and helpers for mirrorsort tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A target tree, a reference tree and a private config file in one temp dir
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub target: PathBuf,
    pub reference: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let target = temp_dir.path().join("target");
        let reference = temp_dir.path().join("reference");
        std::fs::create_dir_all(&target).expect("Failed to create target dir");
        std::fs::create_dir_all(&reference).expect("Failed to create reference dir");
        let config_path = temp_dir.path().join("config.yml");

        Self {
            temp_dir,
            target,
            reference,
            config_path,
        }
    }

    /// Create a file (and its parents) under the target root
    pub fn target_file(&self, relative: &str) -> PathBuf {
        touch(&self.target.join(relative))
    }

    /// Create a file (and its parents) under the reference root
    pub fn reference_file(&self, relative: &str) -> PathBuf {
        touch(&self.reference.join(relative))
    }

    pub fn create_test_config(&self, content: &str) -> PathBuf {
        std::fs::write(&self.config_path, content).expect("Failed to write test config");
        self.config_path.clone()
    }

    /// Config pointing at both roots with no completion pause
    pub fn create_minimal_config(&self) -> PathBuf {
        let content = format!(
            r#"
target_root: "{}"
reference_root: "{}"
reconcile:
  completion_delay_ms: 0
"#,
            self.target.display(),
            self.reference.display()
        );
        self.create_test_config(&content)
    }

    /// The built binary with `--config` pointing at this environment
    pub fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_mirrorsort"));
        command
            .arg("--config")
            .arg(&self.config_path)
            .env("XDG_CONFIG_HOME", self.temp_dir.path())
            .env("XDG_DATA_HOME", self.temp_dir.path());
        command
    }
}

pub fn touch(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(path, path.to_string_lossy().as_bytes()).expect("Failed to write file");
    path.to_path_buf()
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}

pub fn assert_contains_any(text: &str, expected: &[&str]) {
    let found = expected.iter().any(|item| text.contains(item));
    assert!(
        found,
        "Expected text to contain at least one of {:?}, but it didn't. Text: {}",
        expected,
        text
    );
}
