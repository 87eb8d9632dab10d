// Console tab state.
// Activity log of session progress and fetch failures, with an unread badge count.

use chrono::{DateTime, Utc};
use ratatui::widgets::ListState;

/// Oldest messages are dropped past this many.
const MAX_MESSAGES: usize = 500;

/// Console message level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

/// A console message for the activity log.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConsoleMessage {
    fn new(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Complete state for the Console tab.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    pub messages: Vec<ConsoleMessage>,
    pub list_state: ListState,
    /// Warnings and errors not yet seen (for the tab badge).
    pub unread: usize,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(ConsoleLevel::Info, message));
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(ConsoleLevel::Warn, message));
        self.unread += 1;
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(ConsoleLevel::Error, message));
        self.unread += 1;
    }

    /// Clear the badge once the console is on screen.
    pub fn mark_read(&mut self) {
        self.unread = 0;
    }

    fn push(&mut self, message: ConsoleMessage) {
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
        // Newest is rendered first
        self.list_state.select(Some(0));
    }

    /// Select the next older message.
    pub fn select_next(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.messages.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the next newer message.
    pub fn select_prev(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let i = self.list_state.selected().unwrap_or(0).saturating_sub(1);
        self.list_state.select(Some(i));
    }
}
