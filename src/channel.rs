//! Bottom-state subscription channel.
//!
//! A "jump to bottom" affordance usually lives outside the viewport's own
//! part of the model tree, so it cannot simply read the viewport's fields.
//! Each viewport instead creates one [`Channel`]; handles to it can be
//! cloned out to anything that needs to observe whether the viewport is at
//! the bottom or to request a scroll there.
//!
//! The channel lives exactly as long as its viewport. Once the viewport is
//! torn down the channel is closed: subscribers are dropped, no further
//! notifications happen and [`Channel::scroll_to_bottom`] returns `None`.
//!
//! ```rust
//! use bubbletea_scrollback::viewport::Model;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let viewport = Model::new(80, 24);
//! let channel = viewport.channel();
//! assert!(channel.is_at_bottom());
//!
//! let flips = Arc::new(AtomicUsize::new(0));
//! let counter = flips.clone();
//! let subscription = channel.subscribe(move |_at_bottom| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! subscription.unsubscribe();
//! assert_eq!(channel.subscriber_count(), 0);
//! ```

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

type Callback = Arc<dyn Fn(bool) + Send + Sync>;

/// Asks the viewport with `id` to scroll to its bottom.
#[derive(Debug, Clone)]
pub struct ScrollToBottomMsg {
    /// Id of the target viewport.
    pub id: u64,
    /// Animate instead of jumping.
    pub smooth: bool,
}

struct Inner {
    viewport_id: u64,
    at_bottom: bool,
    open: bool,
    next_key: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Handle to a viewport's bottom-state channel.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Channel")
            .field("viewport_id", &inner.viewport_id)
            .field("at_bottom", &inner.at_bottom)
            .field("open", &inner.open)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl Channel {
    pub(crate) fn new(viewport_id: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                viewport_id,
                at_bottom: true,
                open: true,
                next_key: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    // Only one thread ever drives a bubbletea model, so a poisoned lock can
    // only come from a panicking subscriber; its data is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Id of the viewport this channel belongs to.
    pub fn viewport_id(&self) -> u64 {
        self.lock().viewport_id
    }

    /// Last broadcast bottom state. A closed channel reports `true` so any
    /// affordance bound to it hides.
    pub fn is_at_bottom(&self) -> bool {
        let inner = self.lock();
        !inner.open || inner.at_bottom
    }

    /// Whether the owning viewport is still alive.
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Registers `callback` to run on every bottom-state flip.
    ///
    /// Subscribing to a closed channel returns an inert subscription.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let key = inner.next_key;
        inner.next_key += 1;
        if inner.open {
            inner.subscribers.push((key, Arc::new(callback)));
        }
        Subscription {
            channel: Arc::downgrade(&self.inner),
            key,
        }
    }

    /// Requests a scroll to the bottom, overriding a detached viewport.
    ///
    /// The returned command delivers a [`ScrollToBottomMsg`] to the viewport
    /// on the next turn of the event loop. `None` once the viewport is gone.
    pub fn scroll_to_bottom(&self, smooth: bool) -> Option<Cmd> {
        let inner = self.lock();
        if !inner.open {
            return None;
        }
        let id = inner.viewport_id;
        Some(bubbletea_tick(Duration::from_nanos(1), move |_| {
            Box::new(ScrollToBottomMsg { id, smooth }) as Msg
        }))
    }

    /// Stores and broadcasts a new bottom state. Callbacks run only when the
    /// value flips, and outside the lock so they may use the channel.
    pub(crate) fn publish(&self, at_bottom: bool) {
        let callbacks: Vec<Callback> = {
            let mut inner = self.lock();
            if !inner.open || inner.at_bottom == at_bottom {
                return;
            }
            inner.at_bottom = at_bottom;
            inner.subscribers.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in callbacks {
            callback(at_bottom);
        }
    }

    /// Closes the channel and drops every subscriber.
    pub(crate) fn close(&self) {
        let dropped = {
            let mut inner = self.lock();
            inner.open = false;
            std::mem::take(&mut inner.subscribers)
        };
        drop(dropped);
    }
}

/// Registration returned by [`Channel::subscribe`].
///
/// Dropping it keeps the callback registered until the channel closes; call
/// [`Subscription::unsubscribe`] to remove it earlier.
#[derive(Debug)]
pub struct Subscription {
    channel: Weak<Mutex<Inner>>,
    key: u64,
}

impl Subscription {
    /// Removes the callback. A no-op once the channel is gone.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.channel.upgrade() {
            let removed = {
                let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                inner
                    .subscribers
                    .iter()
                    .position(|(key, _)| *key == self.key)
                    .map(|at| inner.subscribers.remove(at))
            };
            drop(removed);
        }
    }
}
