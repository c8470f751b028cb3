//! User-facing notices (toasts / snackbars), decoupled from any UI toolkit.
//!
//! Views push notices as they work; the embedding UI drains the sink on its
//! own cadence and renders however it likes. Failures that must not
//! interrupt a flow are reported here instead of being returned.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Severity of a notice, mapped to toast styling by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Cloneable notice queue shared between views and the UI.
#[derive(Clone, Default)]
pub struct NoticeSink {
    queue: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        self.lock().push_back(notice);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    /// Take all pending notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.lock().drain(..).collect()
    }

    /// Whether anything is waiting to be shown.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notice>> {
        // A panicking pusher cannot corrupt a VecDeque of owned strings;
        // recover instead of propagating the poison.
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_push_order() {
        let sink = NoticeSink::new();
        sink.success("Connection request sent!");
        sink.error("Could not send message");

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert_eq!(drained[1].level, NoticeLevel::Error);
        assert!(sink.is_empty());
    }

    #[test]
    fn clones_share_the_queue() {
        let sink = NoticeSink::new();
        let clone = sink.clone();
        clone.info("hello");

        assert_eq!(sink.drain().len(), 1);
    }
}
