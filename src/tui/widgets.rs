//! Reusable widgets for the TUI application
//!
//! This module provides the form inputs, progress gauge, log viewer and
//! popups that make up the mirrorsort interface.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::progress::ProgressUpdate;
use crate::reconcile::ReconcileSummary;

/// Color scheme for the TUI
pub struct ColorScheme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub background: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Magenta,
            text: Color::White,
            background: Color::Black,
            border: Color::Gray,
        }
    }
}

/// Single-line editable path field
pub struct PathInput<'a> {
    title: &'a str,
    value: &'a str,
    focused: bool,
    colors: &'a ColorScheme,
}

impl<'a> PathInput<'a> {
    pub fn new(title: &'a str, value: &'a str, focused: bool, colors: &'a ColorScheme) -> Self {
        Self {
            title,
            value,
            focused,
            colors,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let border_color = if self.focused {
            self.colors.primary
        } else {
            self.colors.border
        };

        let mut spans = vec![Span::styled(self.value, Style::default().fg(self.colors.text))];
        if self.focused {
            spans.push(Span::styled(
                "_",
                Style::default()
                    .fg(self.colors.primary)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .title(self.title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        );

        frame.render_widget(paragraph, area);
    }
}

/// Checkbox-style toggle
pub struct Toggle<'a> {
    label: &'a str,
    checked: bool,
    focused: bool,
    colors: &'a ColorScheme,
}

impl<'a> Toggle<'a> {
    pub fn new(label: &'a str, checked: bool, focused: bool, colors: &'a ColorScheme) -> Self {
        Self {
            label,
            checked,
            focused,
            colors,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mark = if self.checked { "[x]" } else { "[ ]" };
        let border_color = if self.focused {
            self.colors.primary
        } else {
            self.colors.border
        };

        let paragraph = Paragraph::new(format!("{} {}", mark, self.label))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border_color)),
            )
            .style(Style::default().fg(self.colors.text));

        frame.render_widget(paragraph, area);
    }
}

/// Button that renders dimmed while disabled
pub struct Button<'a> {
    label: &'a str,
    enabled: bool,
    focused: bool,
    colors: &'a ColorScheme,
}

impl<'a> Button<'a> {
    pub fn new(label: &'a str, enabled: bool, focused: bool, colors: &'a ColorScheme) -> Self {
        Self {
            label,
            enabled,
            focused,
            colors,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let style = match (self.enabled, self.focused) {
            (false, _) => Style::default()
                .fg(self.colors.border)
                .add_modifier(Modifier::DIM),
            (true, true) => Style::default()
                .fg(Color::Black)
                .bg(self.colors.primary)
                .add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(self.colors.primary),
        };
        let border_color = if self.focused {
            self.colors.primary
        } else {
            self.colors.border
        };

        let paragraph = Paragraph::new(self.label)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border_color)),
            )
            .style(style)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }
}

/// Progress gauge for the current run
pub struct ProgressGauge<'a> {
    progress: Option<&'a ProgressUpdate>,
    summary: Option<&'a ReconcileSummary>,
    running: bool,
    colors: &'a ColorScheme,
}

impl<'a> ProgressGauge<'a> {
    pub fn new(
        progress: Option<&'a ProgressUpdate>,
        summary: Option<&'a ReconcileSummary>,
        running: bool,
        colors: &'a ColorScheme,
    ) -> Self {
        Self {
            progress,
            summary,
            running,
            colors,
        }
    }

    /// Percentage and label to show; a finished run always reads 100%
    pub fn status(&self) -> (u16, String) {
        if let (false, Some(summary)) = (self.running, self.summary) {
            let label = if summary.dry_run {
                format!("Dry run complete: {} would move", summary.moved)
            } else {
                format!("Comparison complete: {} moved", summary.moved)
            };
            return (100, label);
        }

        match self.progress {
            Some(update) => (u16::from(update.percentage), update.message.clone()),
            None if self.running => (0, "Starting...".to_string()),
            None => (0, "Ready".to_string()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (percent, label) = self.status();
        let color = if percent >= 100 {
            self.colors.success
        } else {
            self.colors.primary
        };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title("Progress")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.border)),
            )
            .gauge_style(Style::default().fg(color))
            .percent(percent.min(100))
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Log viewer widget with scrolling capability
pub struct LogViewer<'a> {
    logs: &'a [String],
    colors: &'a ColorScheme,
    scroll_offset: usize,
}

impl<'a> LogViewer<'a> {
    pub fn new(logs: &'a [String], colors: &'a ColorScheme, scroll_offset: usize) -> Self {
        Self {
            logs,
            colors,
            scroll_offset,
        }
    }

    /// Render the log viewer widget
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible_height = area.height.saturating_sub(2) as usize; // Account for borders
        let start_idx = self.scroll_offset.min(self.logs.len().saturating_sub(1));
        let end_idx = (start_idx + visible_height).min(self.logs.len());

        let visible_logs = if start_idx < self.logs.len() {
            &self.logs[start_idx..end_idx]
        } else {
            &[]
        };

        let items: Vec<ListItem> = visible_logs
            .iter()
            .map(|log| {
                let color = if log.contains("ERROR") {
                    self.colors.error
                } else if log.contains("WARN") {
                    self.colors.warning
                } else if log.contains("Progress") {
                    self.colors.info
                } else {
                    self.colors.text
                };

                ListItem::new(Line::from(Span::styled(
                    log.as_str(),
                    Style::default().fg(color),
                )))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("Log ({})", self.logs.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.colors.border)),
        );

        frame.render_widget(list, area);
    }
}

/// Help dialog widget
pub struct HelpDialog<'a> {
    colors: &'a ColorScheme,
}

impl<'a> HelpDialog<'a> {
    pub fn new(colors: &'a ColorScheme) -> Self {
        Self { colors }
    }

    /// Render the help dialog
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 70, area);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = Text::from(vec![
            Line::from(vec![Span::styled(
                "Keyboard Shortcuts",
                Style::default()
                    .fg(self.colors.primary)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from("Form:"),
            Line::from("  Tab/↓      Next field"),
            Line::from("  Shift+Tab/↑ Previous field"),
            Line::from("  Enter      Toggle option / start run"),
            Line::from("  Space      Toggle option"),
            Line::from("  Backspace  Delete character"),
            Line::from(""),
            Line::from("Actions:"),
            Line::from("  F5/Ctrl+R  Start run"),
            Line::from("  Ctrl+X     Cancel run after current folder"),
            Line::from("  Ctrl+E     Toggle 'over' exclusion"),
            Line::from(""),
            Line::from("General:"),
            Line::from("  F1         Show this help"),
            Line::from("  Esc        Close popup / quit"),
            Line::from("  Ctrl+C     Quit"),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Press Esc to close",
                Style::default().fg(self.colors.secondary),
            )]),
        ]);

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .title("Help")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.border)),
            )
            .style(Style::default().fg(self.colors.text))
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, popup_area);
    }
}

/// Modal message box used for errors and the completion notice
pub struct MessageDialog<'a> {
    title: &'a str,
    message: &'a str,
    accent: Color,
    colors: &'a ColorScheme,
}

impl<'a> MessageDialog<'a> {
    pub fn new(title: &'a str, message: &'a str, accent: Color, colors: &'a ColorScheme) -> Self {
        Self {
            title,
            message,
            accent,
            colors,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let paragraph = Paragraph::new(self.message)
            .block(
                Block::default()
                    .title(format!("{} (press Esc to close)", self.title))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.accent)),
            )
            .style(Style::default().fg(self.colors.text))
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

/// Helper to create a centered rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
