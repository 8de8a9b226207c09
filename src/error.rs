//! Error types for a reconciliation run
//!
//! Application code (CLI, TUI, config) works with `anyhow`; the reconciler
//! itself reports a typed error so hosts can tell a run that never started
//! from one that failed partway through.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to read root directory {path:?}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list directory {path:?}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to search reference directory {path:?}: {source}")]
    Search {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to create category directory {path:?}: {source}")]
    CreateCategory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {from:?} to {to:?}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination already exists: {0:?}")]
    DestinationExists(PathBuf),

    #[error("run cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// Whether the run failed before any top-level directory was processed
    pub fn is_start_failure(&self) -> bool {
        matches!(self, ReconcileError::RootUnreadable { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
