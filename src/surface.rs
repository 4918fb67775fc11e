//! An in-memory scroll container for terminal rendering.
//!
//! A terminal has no native scrolling element, so the transcript
//! [`viewport`](crate::viewport) owns one of these instead. Units are rows.
//! Smooth scrolls are animated in discrete frames: the owner calls
//! [`Surface::step`] once per frame until [`Surface::is_animating`] turns
//! false, treating every step that moved as a native scroll event.

use crate::container::{ScrollBehavior, ScrollContainer};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    target: f64,
    frames_left: u8,
}

/// Row-based scroll container with frame-stepped smooth scrolling.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    scroll_top: f64,
    scroll_height: f64,
    client_height: f64,
    smooth_frames: u8,
    animation: Option<Animation>,
    writes: usize,
}

impl Surface {
    /// Creates an empty surface showing `client_height` rows whose smooth
    /// scrolls take `smooth_frames` frames.
    pub fn new(client_height: f64, smooth_frames: u8) -> Self {
        Self {
            scroll_top: 0.0,
            scroll_height: 0.0,
            client_height: client_height.max(0.0),
            smooth_frames,
            animation: None,
            writes: 0,
        }
    }

    fn max_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    fn clamp_top(&mut self) -> bool {
        let clamped = self.scroll_top.clamp(0.0, self.max_top());
        let moved = clamped != self.scroll_top;
        self.scroll_top = clamped;
        moved
    }

    /// Resizes the visible area. Returns whether the scroll position had to
    /// move to stay in range.
    pub fn set_client_height(&mut self, client_height: f64) -> bool {
        self.client_height = client_height.max(0.0);
        self.clamp_top()
    }

    /// Updates the content height. Returns whether the scroll position had to
    /// move to stay in range.
    pub fn set_scroll_height(&mut self, scroll_height: f64) -> bool {
        self.scroll_height = if scroll_height.is_finite() {
            scroll_height.max(0.0)
        } else {
            0.0
        };
        self.clamp_top()
    }

    /// Scrolls by `delta` rows on behalf of the user, abandoning any running
    /// animation. Returns whether the position changed.
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.animation = None;
        let before = self.scroll_top;
        self.scroll_top = (self.scroll_top + delta).clamp(0.0, self.max_top());
        self.scroll_top != before
    }

    /// Jumps to `top` on behalf of the user. Returns whether the position
    /// changed.
    pub fn jump_to(&mut self, top: f64) -> bool {
        self.scroll_by(top - self.scroll_top)
    }

    /// Whether a smooth scroll is in progress.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advances a running animation by one frame. Returns whether the
    /// position changed.
    pub fn step(&mut self) -> bool {
        let Some(mut animation) = self.animation.take() else {
            return false;
        };
        let before = self.scroll_top;
        let target = animation.target.clamp(0.0, self.max_top());
        if animation.frames_left <= 1 {
            self.scroll_top = target;
        } else {
            self.scroll_top += (target - self.scroll_top) / f64::from(animation.frames_left);
            animation.frames_left -= 1;
            self.animation = Some(animation);
        }
        self.scroll_top != before
    }

    /// First visible row.
    pub fn top_row(&self) -> usize {
        self.scroll_top.round().max(0.0) as usize
    }

    /// Number of programmatic [`ScrollContainer::scroll_to`] calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ScrollContainer for Surface {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_height(&self) -> f64 {
        self.scroll_height
    }

    fn client_height(&self) -> f64 {
        self.client_height
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        self.writes += 1;
        let target = if top.is_finite() { top } else { self.max_top() };
        match behavior {
            ScrollBehavior::Smooth if self.smooth_frames > 0 => {
                self.animation = Some(Animation {
                    target,
                    frames_left: self.smooth_frames,
                });
            }
            _ => {
                self.animation = None;
                self.scroll_top = target.clamp(0.0, self.max_top());
            }
        }
    }
}
