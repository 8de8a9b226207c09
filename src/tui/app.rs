//! Main application state for the TUI

use super::events::{key_handler, AppAction, NavigationAction};
use super::widgets::{
    Button, ColorScheme, HelpDialog, LogViewer, MessageDialog, PathInput, ProgressGauge, Toggle,
};
use crate::config::expand_path;
use crate::progress::ProgressUpdate;
use crate::reconcile::{ReconcileSummary, ReconciliationTask};
use crate::runner::{RunController, RunEvent};
use crate::version;
use crate::Config;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};
use std::path::PathBuf;

const MAX_LOG_LINES: usize = 1000;

/// Which form element has focus
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusedField {
    Target,
    Reference,
    Exclusion,
    Run,
}

impl FocusedField {
    fn next(self) -> Self {
        match self {
            FocusedField::Target => FocusedField::Reference,
            FocusedField::Reference => FocusedField::Exclusion,
            FocusedField::Exclusion => FocusedField::Run,
            FocusedField::Run => FocusedField::Target,
        }
    }

    fn previous(self) -> Self {
        match self {
            FocusedField::Target => FocusedField::Run,
            FocusedField::Reference => FocusedField::Target,
            FocusedField::Exclusion => FocusedField::Reference,
            FocusedField::Run => FocusedField::Exclusion,
        }
    }

    fn is_text(self) -> bool {
        matches!(self, FocusedField::Target | FocusedField::Reference)
    }
}

/// Application state
pub struct App {
    config: Config,
    controller: RunController,

    // UI state
    colors: ColorScheme,
    focused: FocusedField,
    target_input: String,
    reference_input: String,
    exclude_marked: bool,

    // Run state
    progress: Option<ProgressUpdate>,
    last_summary: Option<ReconcileSummary>,
    status_message: String,
    logs: Vec<String>,

    // Popup state
    show_help: bool,
    show_error: Option<String>,
    show_completion: bool,

    // Exit flag
    should_exit: bool,
}

impl App {
    /// Create a new application instance with the fields prefilled from config
    pub fn new(config: Config) -> Self {
        let target_input = config.target_root.clone().unwrap_or_default();
        let reference_input = config.reference_root.clone().unwrap_or_default();
        let exclude_marked = config.reconcile.exclude_marked_category;

        let mut app = Self {
            config,
            controller: RunController::new(),
            colors: ColorScheme::default(),
            focused: FocusedField::Target,
            target_input,
            reference_input,
            exclude_marked,
            progress: None,
            last_summary: None,
            status_message: "Ready".to_string(),
            logs: Vec::new(),
            show_help: false,
            show_error: None,
            show_completion: false,
            should_exit: false,
        };
        app.add_log(format!("mirrorsort v{} ready", env!("CARGO_PKG_VERSION")));
        app
    }

    /// Check if the application should exit
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> Result<()> {
        // Handle popup-specific keys first
        if self.show_help || self.show_error.is_some() || self.show_completion {
            if matches!(key_event.code, KeyCode::Esc | KeyCode::Enter) {
                self.show_help = false;
                self.show_error = None;
                self.show_completion = false;
            }
            return Ok(());
        }

        if let Some(action) = key_handler::key_to_app_action(&key_event) {
            self.apply_action(action);
            return Ok(());
        }

        if let Some(navigation) = key_handler::key_to_navigation(&key_event) {
            match navigation {
                NavigationAction::NextField => self.focused = self.focused.next(),
                NavigationAction::PreviousField => self.focused = self.focused.previous(),
                NavigationAction::Select => self.activate_focused(),
                NavigationAction::Back => {
                    if self.controller.is_running() {
                        self.apply_action(AppAction::CancelRun);
                    } else {
                        self.should_exit = true;
                    }
                }
            }
            return Ok(());
        }

        match key_event.code {
            KeyCode::Backspace if self.focused.is_text() => {
                self.focused_input_mut().pop();
            }
            KeyCode::Char(' ') if self.focused == FocusedField::Exclusion => {
                self.apply_action(AppAction::ToggleExclusion);
            }
            _ if self.focused.is_text() => {
                if let Some(c) = key_handler::text_input(&key_event) {
                    self.focused_input_mut().push(c);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn apply_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit => {
                self.controller.cancel();
                self.should_exit = true;
            }
            AppAction::StartRun => self.start_run(),
            AppAction::CancelRun => {
                if self.controller.cancel() {
                    self.add_log("Cancel requested, stopping after the current folder".to_string());
                    self.status_message = "Cancelling...".to_string();
                }
            }
            AppAction::ToggleExclusion => {
                self.exclude_marked = !self.exclude_marked;
                let state = if self.exclude_marked { "on" } else { "off" };
                self.add_log(format!("Skip marked categories: {}", state));
            }
            AppAction::ShowHelp => self.show_help = true,
        }
    }

    fn activate_focused(&mut self) {
        match self.focused {
            FocusedField::Target | FocusedField::Reference => self.focused = self.focused.next(),
            FocusedField::Exclusion => self.apply_action(AppAction::ToggleExclusion),
            FocusedField::Run => self.start_run(),
        }
    }

    fn focused_input_mut(&mut self) -> &mut String {
        match self.focused {
            FocusedField::Reference => &mut self.reference_input,
            _ => &mut self.target_input,
        }
    }

    /// Build the task from the form fields
    fn build_task(&self) -> Result<ReconciliationTask> {
        let target = self.target_input.trim();
        let reference = self.reference_input.trim();
        if target.is_empty() || reference.is_empty() {
            anyhow::bail!("Select both the folder to sort and the reference folder");
        }

        Ok(ReconciliationTask::new(
            PathBuf::from(expand_path(target)?),
            PathBuf::from(expand_path(reference)?),
            self.exclude_marked,
        ))
    }

    /// Start a reconciliation run in the background
    fn start_run(&mut self) {
        if self.controller.is_running() {
            self.add_log("WARN: A run is already in progress".to_string());
            return;
        }

        if let Err(e) = version::ensure_allows_run(&self.config.version_gate) {
            self.fail(e.to_string());
            return;
        }

        match self.spawn_from_form() {
            Ok(line) => {
                self.progress = None;
                self.last_summary = None;
                self.status_message = "Running...".to_string();
                self.add_log(line);
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn spawn_from_form(&mut self) -> Result<String> {
        let task = self.build_task()?;
        let options = self.config.reconcile.to_options()?;
        let line = format!(
            "Comparing {} against {}",
            task.target_root.display(),
            task.reference_root.display()
        );
        self.controller.start(task, options)?;
        Ok(line)
    }

    fn fail(&mut self, message: String) {
        self.add_log(format!("ERROR: {}", message));
        self.status_message = "Error".to_string();
        self.show_error = Some(message);
    }

    /// Add a log message
    fn add_log(&mut self, message: String) {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.logs.push(format!("[{}] {}", timestamp, message));

        if self.logs.len() > MAX_LOG_LINES {
            self.logs.drain(..self.logs.len() - MAX_LOG_LINES);
        }
    }

    /// Process pending run events
    pub fn update(&mut self) {
        for event in self.controller.poll() {
            match event {
                RunEvent::Progress(update) => {
                    self.add_log(update.message.clone());
                    self.status_message = format!("{}%", update.percentage);
                    self.progress = Some(update);
                }
                RunEvent::Completed(summary) => {
                    self.add_log(format!(
                        "Comparison complete: {} moved, {} left for review, {} without reference ({:.2}s)",
                        summary.moved,
                        summary.excluded,
                        summary.unmatched,
                        summary.duration.as_secs_f64()
                    ));
                    self.status_message = "Comparison complete".to_string();
                    self.last_summary = Some(summary);
                    self.show_completion = true;
                }
                RunEvent::Failed(error) => self.fail(error),
                RunEvent::Cancelled => {
                    self.add_log("WARN: Run cancelled".to_string());
                    self.status_message = "Cancelled".to_string();
                }
            }
        }
    }

    /// Draw the application UI
    pub fn draw(&self, frame: &mut Frame) {
        let size = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Target folder
                Constraint::Length(3), // Reference folder
                Constraint::Length(3), // Options + run button
                Constraint::Length(3), // Progress
                Constraint::Min(0),    // Log
                Constraint::Length(1), // Status line
            ])
            .split(size);

        PathInput::new(
            "Folder to sort",
            &self.target_input,
            self.focused == FocusedField::Target,
            &self.colors,
        )
        .render(frame, chunks[0]);
        PathInput::new(
            "Reference folder",
            &self.reference_input,
            self.focused == FocusedField::Reference,
            &self.colors,
        )
        .render(frame, chunks[1]);

        let option_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(16)])
            .split(chunks[2]);

        let exclusion_label = format!(
            "Leave files in '{}' categories",
            self.config.reconcile.exclusion_marker
        );
        Toggle::new(
            &exclusion_label,
            self.exclude_marked,
            self.focused == FocusedField::Exclusion,
            &self.colors,
        )
        .render(frame, option_chunks[0]);

        let running = self.controller.is_running();
        let run_label = if running { "Running..." } else { "Run" };
        Button::new(
            run_label,
            !running,
            self.focused == FocusedField::Run,
            &self.colors,
        )
        .render(frame, option_chunks[1]);

        ProgressGauge::new(
            self.progress.as_ref(),
            self.last_summary.as_ref(),
            running,
            &self.colors,
        )
        .render(frame, chunks[3]);

        // Follow the tail of the log
        let visible = chunks[4].height.saturating_sub(2) as usize;
        let offset = self.logs.len().saturating_sub(visible);
        LogViewer::new(&self.logs, &self.colors, offset).render(frame, chunks[4]);

        self.draw_status_line(frame, chunks[5]);

        // Draw popups
        if self.show_help {
            HelpDialog::new(&self.colors).render(frame, size);
        }

        if let Some(error) = &self.show_error {
            MessageDialog::new("Error", error, self.colors.error, &self.colors).render(frame, size);
        }

        if self.show_completion {
            let message = match &self.last_summary {
                Some(summary) if summary.dry_run => {
                    format!("Dry run complete. {} files would move.", summary.moved)
                }
                Some(summary) => format!("Comparison complete. {} files moved.", summary.moved),
                None => "Comparison complete.".to_string(),
            };
            MessageDialog::new("Done", &message, self.colors.success, &self.colors)
                .render(frame, size);
        }
    }

    /// Draw status line
    fn draw_status_line(&self, frame: &mut Frame, area: Rect) {
        let state = if self.controller.is_running() {
            "●"
        } else {
            "○"
        };
        let status_text = format!(" {} {} | F1 help | Ctrl+C quit ", state, self.status_message);

        let paragraph = Paragraph::new(status_text).style(
            Style::default()
                .fg(self.colors.secondary)
                .bg(self.colors.background),
        );

        frame.render_widget(paragraph, area);
    }
}
