//! Toast notifications for the dashboard
//!
//! Refresh failures and source advisories surface here. Toasts auto-dismiss,
//! at most a few are shown at once, and a repeat of the newest message
//! renews it instead of stacking (a failing timed refresh would otherwise
//! pile up one toast per interval).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Maximum number of toasts to display at once
const MAX_VISIBLE_TOASTS: usize = 3;

/// Default auto-dismiss duration in seconds
const DEFAULT_DISMISS_SECONDS: u64 = 6;

/// Width of the toast column
const TOAST_WIDTH: u16 = 48;

/// Notification level (determines styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn color(&self) -> Color {
        match self {
            NotificationLevel::Info => Color::Blue,
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        }
    }
}

/// A single toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: Instant,
    /// How long before auto-dismiss
    pub duration: Duration,
}

impl Toast {
    pub fn new(id: u64, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            created_at: Instant::now(),
            duration: Duration::from_secs(DEFAULT_DISMISS_SECONDS),
        }
    }

    /// Check if this toast should be dismissed due to timeout
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

/// Notification manager - active toasts, newest first
#[derive(Debug, Default)]
pub struct NotificationManager {
    toasts: VecDeque<Toast>,
    next_id: u64,
    /// Toasts beyond the visible limit
    pub overflow_count: usize,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new notification
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();

        if let Some(newest) = self.toasts.front_mut() {
            if newest.level == level && newest.message == message {
                newest.created_at = Instant::now();
                return;
            }
        }

        self.next_id += 1;
        self.toasts
            .push_front(Toast::new(self.next_id, level, message));
        self.update_overflow();
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    /// Remove expired toasts
    pub fn cleanup(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
        self.update_overflow();
    }

    /// Dismiss all toasts
    pub fn dismiss_all(&mut self) {
        self.toasts.clear();
        self.update_overflow();
    }

    /// Get visible toasts (limited by MAX_VISIBLE_TOASTS)
    pub fn visible_toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().take(MAX_VISIBLE_TOASTS)
    }

    pub fn has_toasts(&self) -> bool {
        !self.toasts.is_empty()
    }

    fn update_overflow(&mut self) {
        self.overflow_count = self.toasts.len().saturating_sub(MAX_VISIBLE_TOASTS);
    }

    /// Draw visible toasts stacked in the top-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = TOAST_WIDTH.min(area.width);
        let x = area.x + area.width.saturating_sub(width + 1);
        let mut y = area.y + 1;

        for toast in self.visible_toasts() {
            let text = format!("{} {}", toast.level.icon(), toast.message);
            // Borders take two columns and two rows
            let inner_width = width.saturating_sub(2).max(1) as usize;
            let lines = text.chars().count().div_ceil(inner_width).max(1) as u16;
            let height = (lines + 2).min(area.height.saturating_sub(y - area.y));
            if height < 3 {
                break;
            }

            let rect = Rect::new(x, y, width, height);
            let style = Style::default().fg(toast.level.color());
            let widget = Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(style));
            frame.render_widget(Clear, rect);
            frame.render_widget(widget, rect);
            y += height;
        }

        if self.overflow_count > 0 && y < area.y + area.height {
            let rect = Rect::new(x, y, width, 1);
            let more = Paragraph::new(format!("+{} more (x to dismiss)", self.overflow_count))
                .alignment(Alignment::Right)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(Clear, rect);
            frame.render_widget(more, rect);
        }
    }
}
