//! Inline messages shown to the user after an action.
//!
//! Nothing that fails inside an action is allowed to escape it; the failure is
//! turned into an error notice here and rendered on the status line.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::logging::{self, LogLevel};

const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl From<NoticeLevel> for LogLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => LogLevel::Info,
            NoticeLevel::Warning => LogLevel::Warning,
            NoticeLevel::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: Instant,
}

#[derive(Debug)]
pub struct Notices {
    items: VecDeque<Notice>,
    capacity: usize,
}

impl Default for Notices {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Notices {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        logging::log(level.into(), &message);
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(Notice {
            level,
            message,
            at: Instant::now(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message)
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message)
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message)
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    /// The notice that belongs on the status line right now. Errors stay until
    /// something newer replaces them; everything else fades after `ttl`.
    pub fn current(&self, ttl: Duration) -> Option<&Notice> {
        self.latest()
            .filter(|n| n.level == NoticeLevel::Error || n.at.elapsed() < ttl)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter(|n| n.level == NoticeLevel::Error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_notices_are_dropped_at_capacity() {
        let mut notices = Notices::with_capacity(2);
        notices.info("one");
        notices.success("two");
        notices.error("three");
        let messages: Vec<_> = notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(notices.errors().count(), 1);
    }

    #[test]
    fn success_is_logged_as_info() {
        assert_eq!(LogLevel::from(NoticeLevel::Success), LogLevel::Info);
        assert_eq!(LogLevel::from(NoticeLevel::Warning), LogLevel::Warning);
    }

    #[test]
    fn errors_outlive_the_status_ttl() {
        let mut notices = Notices::default();
        notices.info("loaded");
        assert!(notices.current(Duration::ZERO).is_none());

        notices.error("save failed");
        let current = notices.current(Duration::ZERO).unwrap();
        assert_eq!(current.level, NoticeLevel::Error);
    }
}
