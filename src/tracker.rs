//! Scroll position tracker.
//!
//! Classifies the container as at-bottom or not, and separates active user
//! scrolling from a settled position. Every native scroll event marks the
//! user as scrolling and (re)arms a debounce; the flag clears only when a
//! full debounce window passes without another event.

use crate::container::Metrics;
use crate::timer::Deadline;
use bubbletea_rs::Cmd;
use std::time::Duration;

/// Fired when the user-scroll debounce window elapses.
#[derive(Debug, Clone)]
pub struct DebounceMsg {
    /// Id of the owning viewport.
    pub id: u64,
    tag: u64,
}

/// Bottom-proximity and user-activity classifier.
#[derive(Debug, Clone)]
pub struct Tracker {
    threshold: f64,
    debounce: Duration,
    at_bottom: bool,
    user_scrolling: bool,
    debounce_timer: Deadline,
}

impl Tracker {
    /// Creates a tracker for the viewport with id `owner`.
    ///
    /// It starts out at the bottom: an empty list has nothing to scroll
    /// away from.
    pub fn new(owner: u64, threshold: f64, debounce: Duration) -> Self {
        Self {
            threshold,
            debounce,
            at_bottom: true,
            user_scrolling: false,
            debounce_timer: Deadline::new(owner),
        }
    }

    /// Last classification against the threshold.
    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Whether scroll events arrived within the last debounce window.
    pub fn is_user_scrolling(&self) -> bool {
        self.user_scrolling
    }

    /// Records a native scroll event.
    ///
    /// Returns whether this event started a new burst, together with the
    /// debounce command that will clear the flag.
    pub fn on_native_scroll(&mut self, metrics: Metrics) -> (bool, Cmd) {
        let started = !self.user_scrolling;
        self.user_scrolling = true;
        self.reclassify(metrics);
        let cmd = self
            .debounce_timer
            .arm(self.debounce, |id, tag| DebounceMsg { id, tag });
        tracing::trace!(
            tag = self.debounce_timer.tag(),
            at_bottom = self.at_bottom,
            started,
            "debounce armed"
        );
        (started, cmd)
    }

    /// Handles a debounce firing. Returns whether it cleared the flag.
    pub fn on_debounce(&mut self, msg: &DebounceMsg) -> bool {
        if !self.debounce_timer.fire(msg.id, msg.tag) {
            tracing::trace!(tag = msg.tag, "stale debounce ignored");
            return false;
        }
        self.user_scrolling = false;
        tracing::trace!(tag = msg.tag, "user scrolling settled");
        true
    }

    /// Recomputes `is_at_bottom` from fresh geometry. Returns the new value.
    pub fn reclassify(&mut self, metrics: Metrics) -> bool {
        self.at_bottom = metrics.is_at_bottom(self.threshold);
        self.at_bottom
    }

    /// Asserts the bottom state after the controller's own scroll settled.
    pub fn assert_at_bottom(&mut self) {
        self.at_bottom = true;
    }

    /// Treats the next events as untrusted: clears the user flag and cancels
    /// the pending debounce.
    pub fn suppress(&mut self) {
        self.user_scrolling = false;
        self.debounce_timer.cancel();
    }

    /// Cancels the pending debounce for teardown.
    pub fn cancel(&mut self) {
        self.debounce_timer.cancel();
    }

    #[cfg(test)]
    pub(crate) fn debounce_msg(&self) -> DebounceMsg {
        DebounceMsg {
            id: self.debounce_timer.owner(),
            tag: self.debounce_timer.tag(),
        }
    }
}
