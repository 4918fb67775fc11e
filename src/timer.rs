//! Tagged one-shot deadlines.
//!
//! bubbletea commands cannot be cancelled once handed to the runtime, so a
//! deadline is cancelled by making its message stale instead. Every message
//! produced by [`Deadline::arm`] carries the owning component's id and the
//! deadline's tag at arming time; [`Deadline::fire`] only accepts the message
//! whose tag is still current. Re-arming or cancelling bumps the tag, which
//! is how a burst of scroll events keeps only the last debounce alive and how
//! teardown neutralises everything still in flight.
//!
//! ```rust
//! use bubbletea_scrollback::timer::Deadline;
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone)]
//! struct Ping { id: u64, tag: u64 }
//!
//! let mut deadline = Deadline::new(7);
//! let _cmd = deadline.arm(Duration::from_millis(10), |id, tag| Ping { id, tag });
//! let stale = deadline.tag();
//! let _cmd = deadline.arm(Duration::from_millis(10), |id, tag| Ping { id, tag });
//!
//! assert!(!deadline.fire(7, stale));
//! assert!(deadline.fire(7, deadline.tag()));
//! assert!(!deadline.is_armed());
//! ```

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// Internal ID management for component instances
static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Returns a process-unique, non-zero component id.
///
/// Deferred messages are addressed by id so several viewports can share one
/// bubbletea program without reacting to each other's timers.
pub fn next_id() -> u64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// A restartable one-shot timer whose stale firings are ignored.
#[derive(Debug, Clone)]
pub struct Deadline {
    owner: u64,
    tag: u64,
    armed: bool,
}

impl Deadline {
    /// Creates an unarmed deadline belonging to component `owner`.
    pub fn new(owner: u64) -> Self {
        Self {
            owner,
            tag: 0,
            armed: false,
        }
    }

    /// Arms (or re-arms) the deadline, invalidating any earlier arming.
    ///
    /// `make` builds the message from the owner id and the new tag; the
    /// returned command delivers it after `delay`.
    pub fn arm<M, F>(&mut self, delay: Duration, make: F) -> Cmd
    where
        M: Any + Clone + Send + 'static,
        F: FnOnce(u64, u64) -> M,
    {
        self.tag = self.tag.wrapping_add(1);
        self.armed = true;
        let msg = make(self.owner, self.tag);
        bubbletea_tick(delay, move |_| Box::new(msg.clone()) as Msg)
    }

    /// Invalidates the pending firing, if any.
    pub fn cancel(&mut self) {
        if self.armed {
            self.tag = self.tag.wrapping_add(1);
        }
        self.armed = false;
    }

    /// Consumes a firing. Returns `true` only for the current arming.
    pub fn fire(&mut self, owner: u64, tag: u64) -> bool {
        if !self.armed || owner != self.owner || tag != self.tag {
            return false;
        }
        self.armed = false;
        true
    }

    /// Whether a firing is outstanding.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Tag of the most recent arming.
    pub fn tag(&self) -> u64 {
        self.tag
    }

    /// Id of the owning component.
    pub fn owner(&self) -> u64 {
        self.owner
    }
}
