//! Owner filter for privileged viewers.
//!
//! Typing only edits the draft. The active filter changes on an explicit
//! submit or clear, and every change is published on a watch channel so
//! the poller picks it up for its next tick.

use tokio::sync::watch;

pub struct SearchFilter {
    draft: String,
    active: watch::Sender<Option<String>>,
}

impl SearchFilter {
    pub fn new() -> Self {
        let (active, _) = watch::channel(None);
        Self {
            draft: String::new(),
            active,
        }
    }

    pub fn input(&self) -> &str {
        &self.draft
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Currently applied filter.
    pub fn active(&self) -> Option<String> {
        self.active.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.active.subscribe()
    }

    /// Applies the draft. A blank draft means no filter. Subscribers are
    /// notified even when the value did not change.
    pub fn submit(&mut self) -> Option<String> {
        let value = Some(self.draft.trim().to_string()).filter(|v| !v.is_empty());
        self.active.send_replace(value.clone());
        value
    }

    /// Empties the draft and removes the filter.
    pub fn clear(&mut self) {
        self.draft.clear();
        self.active.send_replace(None);
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new()
    }
}
