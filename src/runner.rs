//! Background execution of reconciliation runs
//!
//! A run executes on a blocking worker thread and reports back over a one-way
//! channel: zero or more progress events followed by exactly one terminal
//! event. The worker owns all filesystem access for the run.

use crate::error::ReconcileError;
use crate::progress::ProgressUpdate;
use crate::reconcile::{ReconcileOptions, ReconcileSummary, Reconciler, ReconciliationTask};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Notifications sent from the worker to the host
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// One top-level directory finished
    Progress(ProgressUpdate),
    /// All top-level directories were processed
    Completed(ReconcileSummary),
    /// The run aborted on a filesystem error
    Failed(String),
    /// The run stopped at a cancellation checkpoint
    Cancelled,
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Progress(_))
    }
}

/// Handle to one active run. Invalid once the terminal event was received.
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<RunEvent>,
    cancel: Arc<AtomicBool>,
}

impl RunHandle {
    /// Wait for the next event; `None` once the worker is gone
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Ask the worker to stop before the next top-level directory
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn try_next_event(&mut self) -> Result<RunEvent, mpsc::error::TryRecvError> {
        self.events.try_recv()
    }
}

/// Start `task` on a worker thread. Must be called from within a tokio runtime.
pub fn spawn_run(task: ReconciliationTask, options: ReconcileOptions) -> RunHandle {
    let (sender, receiver) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancel.clone();

    tokio::task::spawn_blocking(move || {
        let reconciler = Reconciler::new(task, options).with_cancel_flag(cancel_flag);

        let progress_sender = sender.clone();
        let result = reconciler.run(|update| {
            let _ = progress_sender.send(RunEvent::Progress(update));
        });

        let terminal = match result {
            Ok(summary) => RunEvent::Completed(summary),
            Err(ReconcileError::Cancelled) => RunEvent::Cancelled,
            Err(e) => {
                error!("Reconciliation failed: {}", e);
                let message = if e.is_start_failure() {
                    format!("Run failed to start: {}", e)
                } else {
                    format!("Run failed: {}", e)
                };
                RunEvent::Failed(message)
            }
        };
        let _ = sender.send(terminal);
    });

    RunHandle {
        events: receiver,
        cancel,
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControllerError {
    #[error("a reconciliation run is already active")]
    AlreadyRunning,
}

/// Owns zero or one active run on behalf of a host
#[derive(Default)]
pub struct RunController {
    active: Option<RunHandle>,
}

impl RunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Start a run unless one is already active
    pub fn start(
        &mut self,
        task: ReconciliationTask,
        options: ReconcileOptions,
    ) -> Result<(), ControllerError> {
        if self.active.is_some() {
            return Err(ControllerError::AlreadyRunning);
        }

        info!(
            "Starting run: {} <- {}",
            task.target_root.display(),
            task.reference_root.display()
        );
        self.active = Some(spawn_run(task, options));
        Ok(())
    }

    /// Request cancellation of the active run, if any
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Drain pending events without blocking. The active run is released
    /// once its terminal event has been returned.
    pub fn poll(&mut self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        let Some(handle) = self.active.as_mut() else {
            return events;
        };

        loop {
            match handle.try_next_event() {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    events.push(event);
                    if terminal {
                        self.active = None;
                        break;
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    events.push(RunEvent::Failed(
                        "Worker stopped without reporting a result".to_string(),
                    ));
                    self.active = None;
                    break;
                }
            }
        }

        events
    }
}
