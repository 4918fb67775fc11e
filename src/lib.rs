#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/bubbletea-scrollback/")]

//! # bubbletea-scrollback
//!
//! An auto-following, virtualized scrollback viewport for
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs) applications, built
//! for chat transcripts and log tails whose newest content streams in at the
//! bottom.
//!
//! ## Overview
//!
//! The viewport keeps the newest item in view while the user is at the
//! bottom, and stops following the moment the user scrolls away. Only the
//! items that intersect the visible rows are wrapped and rendered, so long
//! transcripts stay cheap.
//!
//! The crate is layered so each part can be used on its own:
//!
//! - [`window`]: pure windowing math over estimated and measured item sizes
//! - [`container`]: the [`ScrollContainer`] abstraction and scroll-ancestor
//!   discovery
//! - [`surface`]: an in-memory row container for terminals
//! - [`tracker`]: debounced user-scroll detection and bottom classification
//! - [`follow`]: the [`AutoScroll`] controller state machine
//! - [`channel`]: the bottom-state subscription channel
//! - [`viewport`]: the bubbletea-rs component tying everything together
//! - [`affordance`]: a detached "jump to bottom" component
//!
//! ## Following a Stream
//!
//! ```rust
//! use bubbletea_scrollback::prelude::*;
//!
//! let mut transcript = Viewport::new(60, 12);
//! let jump = JumpToBottom::new(transcript.channel());
//!
//! let _cmd = transcript.push_item("user: how do lifetimes work?");
//! let _cmd = transcript.push_item("assistant: ");
//! let _cmd = transcript.append_to_item(1, "A lifetime names a region of code...");
//!
//! assert_eq!(transcript.follow_state(), FollowState::AutoScrolling);
//! assert!(!jump.visible());
//! ```
//!
//! Every command returned by the viewport must be handed back to the
//! bubbletea-rs runtime: the follow controller waits for layout frames and a
//! settle delay through them.
//!
//! ## Configuration
//!
//! Timing and sizing constants live in [`Config`], which can be loaded from
//! TOML:
//!
//! ```rust
//! use bubbletea_scrollback::Config;
//!
//! let config = Config::from_toml_str("threshold = 2.0\nsettle_delay_ms = 300").unwrap();
//! assert_eq!(config.threshold, 2.0);
//! ```
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! bubbletea-scrollback = "0.1.0"
//! bubbletea-rs = "0.0.7"
//! crossterm = "0.29"
//! ```

pub mod affordance;
pub mod channel;
pub mod config;
pub mod container;
pub mod error;
pub mod follow;
pub mod key;
pub mod surface;
pub mod timer;
pub mod tracker;
pub mod viewport;
pub mod window;

pub use affordance::JumpToBottom;
pub use channel::{Channel, ScrollToBottomMsg, Subscription};
pub use config::Config;
pub use container::{
    find_scroll_ancestor, Metrics, Overflow, ScrollBehavior, ScrollContainer, ScrollNode,
};
pub use error::{Error, Result};
pub use follow::{AutoScroll, FollowState, LayoutMsg, ScrollState, SettleMsg};
pub use key::{Binding, Help as KeyHelp, KeyMap, KeyPress};
pub use surface::Surface;
pub use tracker::{DebounceMsg, Tracker};
pub use viewport::{FrameMsg, Model as Viewport, ViewportKeyMap};
pub use window::{VirtualItem, VirtualWindow, Windowing};

/// Prelude module for convenient imports.
///
/// ```rust
/// use bubbletea_scrollback::prelude::*;
///
/// let viewport = Viewport::new(40, 10);
/// assert_eq!(viewport.follow_state(), FollowState::Idle);
/// ```
pub mod prelude {
    pub use crate::affordance::JumpToBottom;
    pub use crate::channel::{Channel, Subscription};
    pub use crate::config::Config;
    pub use crate::container::{ScrollBehavior, ScrollContainer};
    pub use crate::follow::{AutoScroll, FollowState, ScrollState};
    pub use crate::key::{Binding, KeyMap, KeyPress};
    pub use crate::surface::Surface;
    pub use crate::viewport::{new as viewport_new, Model as Viewport, ViewportKeyMap};
    pub use crate::window::{VirtualItem, Windowing};
}
