//! mirrorsort - Mirror the categorization of a reference folder tree
//!
//! mirrorsort compares two folder trees of categorized files (for example QA
//! inspection photo sets) and reorganizes the target tree's files into the
//! categories under which same-named files were filed in the reference tree.
//!
//! ## Core Features
//!
//! - **Name Matching**: Top-level directories and files are paired by exact name
//! - **Category Relocation**: Files move into a subdirectory named after the reference category
//! - **Exclusion Marker**: Categories flagged for re-review can be left untouched
//! - **Background Runs**: Progress and remaining-time events streamed from a worker thread
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`reconcile`]: The reconciliation algorithm and run summary
//! - [`runner`]: Background execution, run handles and the run controller
//! - [`config`]: Configuration management and parsing

pub mod config;
pub mod error;
pub mod health;
pub mod progress;
pub mod reconcile;
pub mod relocate;
pub mod runner;
pub mod scan;
pub mod tui;
pub mod usage;
pub mod version;

pub use config::Config;
pub use error::ReconcileError;
pub use health::HealthCheck;
pub use progress::ProgressUpdate;
pub use reconcile::{
    DirectoryOutcome, FileOutcome, ReconcileOptions, ReconcileSummary, Reconciler,
    ReconciliationTask,
};
pub use relocate::{ConflictPolicy, ExclusionRule};
pub use runner::{spawn_run, RunController, RunEvent, RunHandle};
