//! Auto-following transcript viewport.
//!
//! This component displays a growing list of variable-height items, such as
//! streamed chat turns, and keeps the newest one in view while the user is at
//! the bottom. Only the items intersecting the visible rows (plus overscan)
//! are wrapped and rendered; every other item is represented by its last
//! measured height, or by the configured estimate if it was never visible.
//!
//! Following is handled by an [`AutoScroll`] controller over an in-memory
//! [`Surface`]: growth while pinned schedules a smooth scroll after the new
//! content has been laid out, a user who scrolled up is left alone, and the
//! bottom state is published on a [`Channel`] for detached "jump to bottom"
//! affordances.
//!
//! # Basic Usage
//!
//! ```rust
//! use bubbletea_scrollback::viewport::Model;
//! use bubbletea_scrollback::follow::FollowState;
//!
//! let mut viewport = Model::new(40, 10);
//! let _cmd = viewport.push_item("user: hello");
//! let _cmd = viewport.push_item("assistant: hi there");
//!
//! assert_eq!(viewport.item_count(), 2);
//! assert_eq!(viewport.follow_state(), FollowState::AutoScrolling);
//! assert!(viewport.view().contains("hello"));
//! ```
//!
//! # bubbletea-rs Integration
//!
//! ```rust
//! use bubbletea_rs::{Cmd, Model as BubbleTeaModel, Msg};
//! use bubbletea_scrollback::viewport;
//!
//! struct Chat {
//!     transcript: viewport::Model,
//! }
//!
//! impl BubbleTeaModel for Chat {
//!     fn init() -> (Self, Option<Cmd>) {
//!         (Self { transcript: viewport::new(80, 20) }, None)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         // Forward everything: the viewport ignores messages that are not
//!         // addressed to it.
//!         self.transcript.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.transcript.view()
//!     }
//! }
//! ```

use crate::channel::Channel;
use crate::config::Config;
use crate::container::{Metrics, ScrollContainer};
use crate::error::Result;
use crate::follow::{AutoScroll, FollowState, ScrollState};
use crate::key::{self, KeyMap as KeyMapTrait, KeyPress};
use crate::surface::Surface;
use crate::timer::Deadline;
use crate::window::{VirtualItem, Windowing};
use bubbletea_rs::{batch, Cmd, KeyMsg, Model as BubbleTeaModel, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use lipgloss_extras::prelude::*;

const SPACEBAR: char = ' ';

/// Key bindings for keyboard navigation.
///
/// Any binding that moves the viewport counts as explicit user input: it
/// aborts an in-flight automatic scroll before moving.
#[derive(Debug, Clone)]
pub struct ViewportKeyMap {
    /// One page down.
    pub page_down: key::Binding,
    /// One page up.
    pub page_up: key::Binding,
    /// Half a page up.
    pub half_page_up: key::Binding,
    /// Half a page down.
    pub half_page_down: key::Binding,
    /// One row down.
    pub down: key::Binding,
    /// One row up.
    pub up: key::Binding,
    /// Oldest content.
    pub top: key::Binding,
    /// Newest content; re-pins the viewport.
    pub bottom: key::Binding,
}

impl Default for ViewportKeyMap {
    fn default() -> Self {
        Self {
            page_down: key::Binding::new(vec![
                KeyCode::PageDown,
                KeyCode::Char(SPACEBAR),
                KeyCode::Char('f'),
            ])
            .with_help("f/pgdn", "page down"),
            page_up: key::Binding::new(vec![KeyCode::PageUp, KeyCode::Char('b')])
                .with_help("b/pgup", "page up"),
            half_page_up: key::Binding::new(vec![
                KeyPress::from(KeyCode::Char('u')),
                KeyPress::from((KeyCode::Char('u'), KeyModifiers::CONTROL)),
            ])
            .with_help("u/ctrl+u", "½ page up"),
            half_page_down: key::Binding::new(vec![
                KeyPress::from(KeyCode::Char('d')),
                KeyPress::from((KeyCode::Char('d'), KeyModifiers::CONTROL)),
            ])
            .with_help("d/ctrl+d", "½ page down"),
            up: key::Binding::new(vec![KeyCode::Up, KeyCode::Char('k')]).with_help("↑/k", "up"),
            down: key::Binding::new(vec![KeyCode::Down, KeyCode::Char('j')])
                .with_help("↓/j", "down"),
            top: key::Binding::new(vec![KeyCode::Home, KeyCode::Char('g')])
                .with_help("g/home", "top"),
            bottom: key::Binding::new(vec![KeyCode::End, KeyCode::Char('G')])
                .with_help("G/end", "bottom"),
        }
    }
}

impl KeyMapTrait for ViewportKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.up, &self.down, &self.page_up, &self.page_down, &self.bottom]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![
            vec![&self.up, &self.down],
            vec![&self.page_up, &self.page_down],
            vec![&self.half_page_up, &self.half_page_down],
            vec![&self.top, &self.bottom],
        ]
    }
}

/// One frame of a smooth scroll animation.
#[derive(Debug, Clone)]
pub struct FrameMsg {
    /// Id of the owning viewport.
    pub id: u64,
    tag: u64,
}

/// An auto-following, virtualized transcript viewport.
#[derive(Debug)]
pub struct Model {
    /// Total width, including the style's frame.
    pub width: usize,
    /// Total height, including the style's frame.
    pub height: usize,
    /// Style wrapped around the rendered rows.
    pub style: Style,
    /// Navigation bindings.
    pub keymap: ViewportKeyMap,

    // Internal state
    items: Vec<String>,
    windowing: Windowing,
    follow: AutoScroll<Surface>,
    frame_timer: Deadline,
    config: Config,
}

impl Model {
    /// Creates a viewport with the terminal configuration preset.
    pub fn new(width: usize, height: usize) -> Self {
        Self::build(width, height, Config::terminal())
    }

    /// Creates a viewport with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::error::Error::InvalidConfig) when `config` fails
    /// [`Config::validate`].
    pub fn with_config(width: usize, height: usize, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(width, height, config))
    }

    fn build(width: usize, height: usize, config: Config) -> Self {
        let style = Style::new();
        let rows = height.saturating_sub(frame_size(&style).0);
        let surface = Surface::new(rows as f64, config.smooth_scroll_frames);
        let follow = AutoScroll::with_container(&config, surface);
        let frame_timer = Deadline::new(follow.id());
        Self {
            width,
            height,
            style,
            keymap: ViewportKeyMap::default(),
            items: Vec::new(),
            windowing: Windowing::new(config.estimate_size, config.gap, config.overscan),
            follow,
            frame_timer,
            config,
        }
    }

    /// Builder-style style setter. Frame sizes shrink the content area, so
    /// measurements are taken again on the next change.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        let rows = self.content_height() as f64;
        if let Some(surface) = self.follow.container_mut() {
            surface.set_client_height(rows);
        }
        self.windowing.reset_measurements();
        self
    }

    /// Instance id; deferred messages carry it.
    pub fn id(&self) -> u64 {
        self.follow.id()
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle to the bottom-state channel for detached affordances.
    pub fn channel(&self) -> Channel {
        self.follow.channel()
    }

    /// Current follow state.
    pub fn follow_state(&self) -> FollowState {
        self.follow.state()
    }

    /// Geometry and classification snapshot.
    pub fn scroll_state(&self) -> ScrollState {
        self.follow.scroll_state()
    }

    /// Whether the viewport counts as being at the bottom.
    pub fn at_bottom(&self) -> bool {
        self.follow.is_at_bottom()
    }

    /// Whether the first row is visible.
    pub fn at_top(&self) -> bool {
        self.metrics().scroll_top <= 0.0
    }

    /// Fraction of the scrollable range above the viewport, `0.0..=1.0`.
    pub fn scroll_percent(&self) -> f64 {
        let metrics = self.metrics();
        let max = metrics.max_scroll_top();
        if max <= 0.0 {
            return 1.0;
        }
        (metrics.scroll_top / max).clamp(0.0, 1.0)
    }

    /// The items, in order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items currently rendered (visible plus overscan) with their offsets
    /// and sizes.
    pub fn mounted_items(&self) -> Vec<VirtualItem> {
        let metrics = self.metrics();
        self.windowing
            .compute(metrics.scroll_top, metrics.client_height)
            .items
    }

    /// Appends an item.
    pub fn push_item(&mut self, content: impl Into<String>) -> Option<Cmd> {
        self.items.push(normalize(content.into()));
        self.sync()
    }

    /// Replaces every item. Measurements are discarded.
    pub fn set_items(&mut self, items: Vec<String>) -> Option<Cmd> {
        self.items = items.into_iter().map(normalize).collect();
        self.windowing.set_count(0);
        self.sync()
    }

    /// Replaces the content of an existing item, e.g. a turn that is still
    /// streaming. Out-of-range indices are ignored.
    pub fn update_item(&mut self, index: usize, content: impl Into<String>) -> Option<Cmd> {
        let slot = self.items.get_mut(index)?;
        *slot = normalize(content.into());
        self.sync()
    }

    /// Appends text to an existing item.
    pub fn append_to_item(&mut self, index: usize, chunk: &str) -> Option<Cmd> {
        let slot = self.items.get_mut(index)?;
        slot.push_str(&chunk.replace("\r\n", "\n"));
        self.sync()
    }

    /// Removes every item.
    pub fn clear(&mut self) -> Option<Cmd> {
        self.items.clear();
        self.windowing.set_count(0);
        self.sync()
    }

    /// Resizes the viewport. A width change re-measures every item.
    pub fn set_size(&mut self, width: usize, height: usize) -> Option<Cmd> {
        let width_changed = width != self.width;
        let height_changed = height != self.height;
        self.width = width;
        self.height = height;
        let rows = self.content_height() as f64;
        if let Some(surface) = self.follow.container_mut() {
            surface.set_client_height(rows);
        }
        if width_changed {
            self.windowing.reset_measurements();
        }
        let synced = self.sync();
        if !height_changed {
            return synced;
        }
        let resized = self.follow.on_resize();
        combine(vec![synced, resized])
    }

    /// Scrolls to the newest content, re-pinning the viewport.
    pub fn scroll_to_bottom(&mut self, smooth: bool) -> Option<Cmd> {
        self.follow.scroll_to_bottom(smooth)
    }

    /// Tears the viewport down. Pending timers are cancelled and the channel
    /// is closed; later deferred messages are ignored.
    pub fn destroy(&mut self) {
        self.frame_timer.cancel();
        self.follow.destroy();
    }

    /// Scrolls by `rows` on behalf of the user (negative is up).
    pub fn scroll_by(&mut self, rows: isize) -> Option<Cmd> {
        if !self.follow.is_mounted() {
            return None;
        }
        self.follow.on_user_input();
        self.frame_timer.cancel();
        let moved = self
            .follow
            .container_mut()
            .is_some_and(|surface| surface.scroll_by(rows as f64));
        if !moved {
            return None;
        }
        let scrolled = self.follow.on_native_scroll();
        combine(vec![scrolled, self.sync()])
    }

    /// Jumps to the first row on behalf of the user.
    pub fn goto_top(&mut self) -> Option<Cmd> {
        let top = self.metrics().scroll_top.ceil() as isize;
        self.scroll_by(-top)
    }

    fn metrics(&self) -> Metrics {
        self.follow
            .container()
            .map(|surface| surface.metrics())
            .unwrap_or_default()
    }

    fn content_width(&self) -> usize {
        self.width.saturating_sub(frame_size(&self.style).1)
    }

    fn content_height(&self) -> usize {
        self.height.saturating_sub(frame_size(&self.style).0)
    }

    /// Wraps every mounted item and records its height. A changed height can
    /// shift the window, so this runs until the window's sizes are stable.
    fn measure_mounted(&mut self) {
        let width = self.content_width();
        for _ in 0..4 {
            let mut changed = false;
            for item in self.mounted_items() {
                let rows = wrap_rows(&self.items[item.index], width).len();
                changed |= self.windowing.measure(item.index, rows as f64);
            }
            if !changed {
                break;
            }
        }
    }

    /// Re-measures and hands the new extent to the follow controller.
    fn sync(&mut self) -> Option<Cmd> {
        self.windowing.set_count(self.items.len());
        // Shrinking content clamps the position, which mounts other items.
        for _ in 0..4 {
            self.measure_mounted();
            let extent = self.windowing.total_extent();
            let clamped = self
                .follow
                .container_mut()
                .is_some_and(|surface| surface.set_scroll_height(extent));
            if !clamped {
                break;
            }
        }
        let extent = self.windowing.total_extent();
        let cmd = self.follow.on_content_change(self.items.len(), extent);
        self.with_animation(cmd)
    }

    /// Adds a frame tick when the surface started animating.
    fn with_animation(&mut self, cmd: Option<Cmd>) -> Option<Cmd> {
        let animating = self
            .follow
            .container()
            .is_some_and(|surface| surface.is_animating());
        if !animating || self.frame_timer.is_armed() || !self.follow.is_mounted() {
            return cmd;
        }
        let frame = self
            .frame_timer
            .arm(self.config.frame_interval(), |id, tag| FrameMsg { id, tag });
        combine(vec![cmd, Some(frame)])
    }

    fn on_frame(&mut self, msg: &FrameMsg) -> Option<Cmd> {
        if !self.follow.is_mounted() || !self.frame_timer.fire(msg.id, msg.tag) {
            return None;
        }
        let moved = self
            .follow
            .container_mut()
            .is_some_and(|surface| surface.step());
        let mut cmds = Vec::new();
        if moved {
            cmds.push(self.follow.on_native_scroll());
            cmds.push(self.sync());
        }
        cmds.push(self.with_animation(None));
        combine(cmds)
    }

    fn on_key(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        let page = self.content_height().max(1) as isize;
        if self.keymap.bottom.matches(key_msg) {
            self.scroll_to_bottom(true)
        } else if self.keymap.top.matches(key_msg) {
            self.goto_top()
        } else if self.keymap.page_down.matches(key_msg) {
            self.scroll_by(page)
        } else if self.keymap.page_up.matches(key_msg) {
            self.scroll_by(-page)
        } else if self.keymap.half_page_down.matches(key_msg) {
            self.scroll_by((page / 2).max(1))
        } else if self.keymap.half_page_up.matches(key_msg) {
            self.scroll_by(-(page / 2).max(1))
        } else if self.keymap.down.matches(key_msg) {
            self.scroll_by(1)
        } else if self.keymap.up.matches(key_msg) {
            self.scroll_by(-1)
        } else {
            None
        }
    }

    /// Processes a message: navigation keys, animation frames, and the
    /// follow controller's deferred messages. Messages addressed to other
    /// viewports are ignored.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            return self.on_key(key_msg);
        }
        if let Some(frame) = msg.downcast_ref::<FrameMsg>() {
            return self.on_frame(frame);
        }
        let cmd = self.follow.update(&msg);
        if cmd.is_none() {
            return None;
        }
        // A layout message may have just written the new position; the
        // rows it revealed need measuring.
        let cmd = self.with_animation(cmd);
        combine(vec![cmd, self.sync()])
    }

    /// Renders the visible rows.
    pub fn view(&self) -> String {
        let rows = self.content_height();
        let width = self.content_width();
        let top = self
            .follow
            .container()
            .map_or(0, |surface| surface.top_row());

        let mut lines = vec![String::new(); rows];
        for item in self.mounted_items() {
            let start = item.offset.round().max(0.0) as usize;
            let size = item.size.round().max(0.0) as usize;
            for (i, line) in wrap_rows(&self.items[item.index], width)
                .into_iter()
                .take(size)
                .enumerate()
            {
                let row = start + i;
                if row >= top && row < top + rows {
                    lines[row - top] = line;
                }
            }
        }

        self.style.render(&lines.join("\n"))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl BubbleTeaModel for Model {
    fn init() -> (Self, Option<Cmd>) {
        (Self::default(), None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        self.update(msg)
    }

    fn view(&self) -> String {
        self.view()
    }
}

/// Rows and columns taken by the style's padding, margins and drawn border.
///
/// Border sides count as enabled until set otherwise, but nothing is drawn
/// without a border style, so an unset border takes no space.
fn frame_size(style: &Style) -> (usize, usize) {
    let (border_v, border_h) = if style.get_border_style() == hidden_border() {
        (0, 0)
    } else {
        (
            style.get_vertical_border_size(),
            style.get_horizontal_border_size(),
        )
    };
    let v = style.get_vertical_padding() + style.get_vertical_margins() + border_v;
    let h = style.get_horizontal_padding() + style.get_horizontal_margins() + border_h;
    (v.max(0) as usize, h.max(0) as usize)
}

fn normalize(content: String) -> String {
    if content.contains('\r') {
        content.replace("\r\n", "\n")
    } else {
        content
    }
}

/// Wraps `text` to `width` columns. Every item takes at least one row.
fn wrap_rows(text: &str, width: usize) -> Vec<String> {
    let rows: Vec<String> = textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if rows.is_empty() {
        vec![String::new()]
    } else {
        rows
    }
}

fn combine(cmds: Vec<Option<Cmd>>) -> Option<Cmd> {
    let mut cmds: Vec<Cmd> = cmds.into_iter().flatten().collect();
    match cmds.len() {
        0 => None,
        1 => cmds.pop(),
        _ => Some(batch(cmds)),
    }
}

/// Creates a viewport with the terminal configuration preset.
pub fn new(width: usize, height: usize) -> Model {
    Model::new(width, height)
}

#[cfg(test)]
mod tests;
