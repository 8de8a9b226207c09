//! Reconciler - Mirrors the reference tree's categorization onto the target tree
//!
//! For every top-level directory of the target root, the first reference
//! top-level directory with the same name is located. Each file directly
//! inside the target directory is then looked up by name anywhere under the
//! reference directory and moved into a subdirectory named after the
//! category it was found in. Only the target tree is ever modified.

use crate::error::{ReconcileError, Result};
use crate::progress::{ProgressTracker, ProgressUpdate};
use crate::relocate::{
    category_of, move_into_category, resolve_destination, ConflictPolicy, ExclusionRule,
};
use crate::scan::{find_file_recursive, find_reference_dir, list_directories, list_files};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Immutable configuration of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationTask {
    pub target_root: PathBuf,
    pub reference_root: PathBuf,
    pub exclude_marked_category: bool,
}

impl ReconciliationTask {
    pub fn new(
        target_root: impl Into<PathBuf>,
        reference_root: impl Into<PathBuf>,
        exclude_marked_category: bool,
    ) -> Self {
        Self {
            target_root: target_root.into(),
            reference_root: reference_root.into(),
            exclude_marked_category,
        }
    }
}

/// Behavior knobs that are not part of the task itself
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub exclusion: ExclusionRule,
    pub on_conflict: ConflictPolicy,
    /// Pause after the last progress update, so fast runs stay visible in a UI
    pub completion_delay: Duration,
    pub dry_run: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            exclusion: ExclusionRule::default(),
            on_conflict: ConflictPolicy::default(),
            completion_delay: Duration::from_millis(100),
            dry_run: false,
        }
    }
}

/// What happened to one file of a target directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Moved (or, in a dry run, would be moved) into its category
    Moved {
        from: PathBuf,
        to: PathBuf,
        category: String,
    },
    /// Matched a category carrying the exclusion marker
    Excluded { file: PathBuf, category: String },
    /// No file with the same name under the reference directory
    Unmatched { file: PathBuf },
}

/// Result of processing one top-level target directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryOutcome {
    pub name: String,
    pub matched: bool,
    pub files: Vec<FileOutcome>,
}

/// Results from a complete reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    pub total_directories: usize,
    pub matched_directories: usize,
    pub moved: usize,
    pub excluded: usize,
    pub unmatched: usize,
    pub duration: Duration,
    pub dry_run: bool,
    pub directories: Vec<DirectoryOutcome>,
}

impl ReconcileSummary {
    fn compile(directories: Vec<DirectoryOutcome>, duration: Duration, dry_run: bool) -> Self {
        let mut moved = 0;
        let mut excluded = 0;
        let mut unmatched = 0;

        for outcome in directories.iter().flat_map(|d| d.files.iter()) {
            match outcome {
                FileOutcome::Moved { .. } => moved += 1,
                FileOutcome::Excluded { .. } => excluded += 1,
                FileOutcome::Unmatched { .. } => unmatched += 1,
            }
        }

        Self {
            total_directories: directories.len(),
            matched_directories: directories.iter().filter(|d| d.matched).count(),
            moved,
            excluded,
            unmatched,
            duration,
            dry_run,
            directories,
        }
    }
}

/// Runs one reconciliation task on the calling thread
pub struct Reconciler {
    task: ReconciliationTask,
    options: ReconcileOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl Reconciler {
    pub fn new(task: ReconciliationTask, options: ReconcileOptions) -> Self {
        Self {
            task,
            options,
            cancel: None,
        }
    }

    /// Check `flag` between top-level directories and stop once it is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn task(&self) -> &ReconciliationTask {
        &self.task
    }

    /// Process every top-level target directory, calling `on_progress` after each
    pub fn run<F>(&self, mut on_progress: F) -> Result<ReconcileSummary>
    where
        F: FnMut(ProgressUpdate),
    {
        let start_time = Instant::now();

        info!(
            "Starting reconciliation: target={}, reference={}, exclude_marked={}, dry_run={}",
            self.task.target_root.display(),
            self.task.reference_root.display(),
            self.task.exclude_marked_category,
            self.options.dry_run
        );

        let targets = list_directories(&self.task.target_root)?;
        let references = list_directories(&self.task.reference_root)?;

        let mut tracker = ProgressTracker::new(targets.len());
        let mut directories = Vec::with_capacity(targets.len());

        for target in &targets {
            self.check_cancelled()?;

            let outcome = match find_reference_dir(target.name(), &references) {
                Some(reference) => {
                    debug!(
                        "Matched {} with {}",
                        target.path.display(),
                        reference.path.display()
                    );
                    DirectoryOutcome {
                        name: target.display_name(),
                        matched: true,
                        files: self.process_directory(&target.path, &reference.path)?,
                    }
                }
                None => {
                    debug!("No reference directory named {}", target.display_name());
                    DirectoryOutcome {
                        name: target.display_name(),
                        matched: false,
                        files: Vec::new(),
                    }
                }
            };
            directories.push(outcome);

            on_progress(tracker.advance());
        }

        if !targets.is_empty() && !self.options.completion_delay.is_zero() {
            std::thread::sleep(self.options.completion_delay);
        }

        let summary = ReconcileSummary::compile(directories, start_time.elapsed(), self.options.dry_run);

        info!(
            "Reconciliation completed in {:.2}s: {} moved, {} excluded, {} unmatched across {}/{} matched directories",
            summary.duration.as_secs_f64(),
            summary.moved,
            summary.excluded,
            summary.unmatched,
            summary.matched_directories,
            summary.total_directories
        );

        Ok(summary)
    }

    /// Relocate the files directly inside `target_dir` according to `reference_dir`
    pub fn process_directory(
        &self,
        target_dir: &Path,
        reference_dir: &Path,
    ) -> Result<Vec<FileOutcome>> {
        list_files(target_dir)?
            .into_iter()
            .map(|file| self.reconcile_file(&file, target_dir, reference_dir))
            .collect()
    }

    fn reconcile_file(
        &self,
        file: &Path,
        target_dir: &Path,
        reference_dir: &Path,
    ) -> Result<FileOutcome> {
        let Some(file_name) = file.file_name() else {
            return Ok(FileOutcome::Unmatched {
                file: file.to_path_buf(),
            });
        };

        let Some(reference_file) = find_file_recursive(reference_dir, file_name)? else {
            debug!("No reference file for {}", file.display());
            return Ok(FileOutcome::Unmatched {
                file: file.to_path_buf(),
            });
        };

        let Some(category) = category_of(&reference_file) else {
            return Ok(FileOutcome::Unmatched {
                file: file.to_path_buf(),
            });
        };
        let category_name = category.to_string_lossy().into_owned();

        if self.task.exclude_marked_category && self.options.exclusion.is_excluded(&category_name)
        {
            debug!(
                "Leaving {} in place: category {} is excluded",
                file.display(),
                category_name
            );
            return Ok(FileOutcome::Excluded {
                file: file.to_path_buf(),
                category: category_name,
            });
        }

        let destination = if self.options.dry_run {
            resolve_destination(&target_dir.join(category), file_name, self.options.on_conflict)?
        } else {
            move_into_category(file, target_dir, category, self.options.on_conflict)?
        };

        debug!("{} -> {}", file.display(), destination.display());

        Ok(FileOutcome::Moved {
            from: file.to_path_buf(),
            to: destination,
            category: category_name,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => {
                info!("Reconciliation cancelled");
                Err(ReconcileError::Cancelled)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn options() -> ReconcileOptions {
        ReconcileOptions {
            completion_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_calculation() {
        let directories = vec![
            DirectoryOutcome {
                name: "LotA".to_string(),
                matched: true,
                files: vec![
                    FileOutcome::Moved {
                        from: "/t/LotA/a.jpg".into(),
                        to: "/t/LotA/Pass/a.jpg".into(),
                        category: "Pass".to_string(),
                    },
                    FileOutcome::Excluded {
                        file: "/t/LotA/b.jpg".into(),
                        category: "OverKill".to_string(),
                    },
                    FileOutcome::Unmatched {
                        file: "/t/LotA/c.jpg".into(),
                    },
                ],
            },
            DirectoryOutcome {
                name: "LotB".to_string(),
                matched: false,
                files: Vec::new(),
            },
        ];

        let summary = ReconcileSummary::compile(directories, Duration::from_secs(2), false);

        assert_eq!(summary.total_directories, 2);
        assert_eq!(summary.matched_directories, 1);
        assert_eq!(summary.moved, 1);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.duration, Duration::from_secs(2));
    }

    #[test]
    fn test_process_directory_mixed_outcomes() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target/LotA");
        let reference = temp.path().join("reference/LotA");
        touch(&target.join("a.jpg"));
        touch(&target.join("b.jpg"));
        touch(&target.join("c.jpg"));
        touch(&reference.join("Pass/a.jpg"));
        touch(&reference.join("OverKill/b.jpg"));

        let task = ReconciliationTask::new(temp.path().join("target"), temp.path().join("reference"), true);
        let reconciler = Reconciler::new(task, options());

        let mut outcomes = reconciler.process_directory(&target, &reference).unwrap();
        outcomes.sort_by_key(|o| format!("{:?}", o));

        assert!(outcomes.contains(&FileOutcome::Moved {
            from: target.join("a.jpg"),
            to: target.join("Pass/a.jpg"),
            category: "Pass".to_string(),
        }));
        assert!(outcomes.contains(&FileOutcome::Excluded {
            file: target.join("b.jpg"),
            category: "OverKill".to_string(),
        }));
        assert!(outcomes.contains(&FileOutcome::Unmatched {
            file: target.join("c.jpg"),
        }));
        assert!(target.join("Pass/a.jpg").is_file());
        assert!(target.join("b.jpg").is_file());
    }

    #[test]
    fn test_dry_run_does_not_touch_files() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("target/LotA/a.jpg"));
        touch(&temp.path().join("reference/LotA/Pass/a.jpg"));

        let task = ReconciliationTask::new(temp.path().join("target"), temp.path().join("reference"), true);
        let reconciler = Reconciler::new(
            task,
            ReconcileOptions {
                dry_run: true,
                ..options()
            },
        );

        let summary = reconciler.run(|_| {}).unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.moved, 1);
        assert!(temp.path().join("target/LotA/a.jpg").is_file());
        assert!(!temp.path().join("target/LotA/Pass").exists());
    }

    #[test]
    fn test_cancel_flag_stops_before_next_directory() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("target/LotA/a.jpg"));
        touch(&temp.path().join("reference/LotA/Pass/a.jpg"));

        let flag = Arc::new(AtomicBool::new(true));
        let task = ReconciliationTask::new(temp.path().join("target"), temp.path().join("reference"), true);
        let reconciler = Reconciler::new(task, options()).with_cancel_flag(flag);

        let mut events = 0;
        let result = reconciler.run(|_| events += 1);

        assert!(matches!(result, Err(ReconcileError::Cancelled)));
        assert_eq!(events, 0);
        assert!(temp.path().join("target/LotA/a.jpg").is_file());
    }

    #[test]
    fn test_missing_reference_root_fails_to_start() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("target/LotA")).unwrap();

        let task = ReconciliationTask::new(temp.path().join("target"), temp.path().join("nope"), true);
        let err = Reconciler::new(task, options()).run(|_| {}).unwrap_err();

        assert!(err.is_start_failure());
    }
}
