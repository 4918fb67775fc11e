//! "Jump to bottom" affordance.
//!
//! A small component that appears while its viewport is scrolled away from
//! the bottom and, when activated, asks the viewport to scroll back down.
//! It only talks to the viewport through a [`Channel`], so it can live
//! anywhere in the model tree: a status bar, a footer or an overlay.
//!
//! ```rust
//! use bubbletea_scrollback::affordance::JumpToBottom;
//! use bubbletea_scrollback::viewport;
//!
//! let transcript = viewport::new(80, 20);
//! let jump = JumpToBottom::new(transcript.channel());
//!
//! // A fresh viewport is at the bottom, so there is nothing to show.
//! assert!(!jump.visible());
//! assert_eq!(jump.view(), "");
//! ```
//!
//! An affordance with no channel, or whose viewport is gone, stays hidden
//! and does nothing.

use crate::channel::Channel;
use crate::key::{self, KeyPress};
use bubbletea_rs::{Cmd, KeyMsg, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;
use unicode_width::UnicodeWidthChar;

const ELLIPSIS: char = '…';

/// Button-like component that scrolls a detached viewport back down.
#[derive(Debug, Clone)]
pub struct JumpToBottom {
    /// Text shown while visible.
    pub label: String,
    /// Style applied to the label.
    pub style: Style,
    /// Key that activates the affordance.
    pub binding: key::Binding,
    /// Maximum label width in cells; `0` means unlimited.
    pub width: usize,
    /// Animate the requested scroll.
    pub smooth: bool,
    channel: Option<Channel>,
}

impl Default for JumpToBottom {
    fn default() -> Self {
        Self {
            label: "↓ new messages".to_string(),
            style: Style::new().bold(true).foreground(lipgloss::AdaptiveColor {
                Light: "#5A56E0",
                Dark: "#7571F9",
            }),
            binding: key::Binding::new(vec![KeyPress::from((
                KeyCode::Char('e'),
                KeyModifiers::CONTROL,
            ))])
            .with_help("ctrl+e", "jump to bottom"),
            width: 0,
            smooth: true,
            channel: None,
        }
    }
}

impl JumpToBottom {
    /// Creates an affordance bound to a viewport's channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            channel: Some(channel),
            ..Self::default()
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the label style.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Limits the label to `width` cells.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Binds to another viewport's channel.
    pub fn bind(&mut self, channel: Channel) {
        self.channel = Some(channel);
    }

    /// Drops the channel; the affordance hides.
    pub fn unbind(&mut self) {
        self.channel = None;
    }

    /// The bound channel, if any.
    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    /// Shown only while a live viewport is away from the bottom.
    pub fn visible(&self) -> bool {
        self.channel
            .as_ref()
            .is_some_and(|channel| channel.is_open() && !channel.is_at_bottom())
    }

    /// Requests the scroll. `None` while hidden.
    pub fn activate(&self) -> Option<Cmd> {
        if !self.visible() {
            return None;
        }
        let channel = self.channel.as_ref()?;
        tracing::debug!(
            viewport = channel.viewport_id(),
            "jump to bottom requested"
        );
        channel.scroll_to_bottom(self.smooth)
    }

    /// Activates on the bound key.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        let key_msg = msg.downcast_ref::<KeyMsg>()?;
        if self.binding.matches(key_msg) {
            return self.activate();
        }
        None
    }

    /// Renders the label, or an empty string while hidden.
    pub fn view(&self) -> String {
        if !self.visible() {
            return String::new();
        }
        self.style.render(&truncate(&self.label, self.width))
    }
}

/// Cuts `text` to at most `width` cells, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if width == 0 || unicode_width::UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ScrollToBottomMsg;
    use crate::follow::FollowState;
    use crate::viewport;

    fn ctrl_e() -> Msg {
        Box::new(KeyMsg {
            key: KeyCode::Char('e'),
            modifiers: KeyModifiers::CONTROL,
        })
    }

    fn scrolled_up() -> viewport::Model {
        let mut vp = viewport::new(20, 5);
        for i in 0..10 {
            vp.push_item(format!("line {i}"));
        }
        // Interrupts the initial scroll one row below the top.
        vp.update(Box::new(KeyMsg {
            key: KeyCode::Down,
            modifiers: KeyModifiers::NONE,
        }));
        vp
    }

    #[test]
    fn test_hidden_without_channel() {
        let mut jump = JumpToBottom::default();
        assert!(!jump.visible());
        assert_eq!(jump.view(), "");
        assert!(jump.activate().is_none());
        assert!(jump.update(&ctrl_e()).is_none());
    }

    #[test]
    fn test_hidden_while_at_bottom() {
        let vp = viewport::new(20, 5);
        let jump = JumpToBottom::new(vp.channel());
        assert!(!jump.visible());
        assert!(jump.activate().is_none());
    }

    #[test]
    fn test_visible_once_scrolled_away() {
        let vp = scrolled_up();
        assert!(!vp.at_bottom());
        let jump = JumpToBottom::new(vp.channel())
            .with_label("more below")
            .with_style(Style::new());
        assert!(jump.visible());
        assert!(jump.view().contains("more below"));
    }

    #[tokio::test]
    async fn test_key_requests_scroll() {
        let mut vp = scrolled_up();
        let mut jump = JumpToBottom::new(vp.channel());

        let other_key: Msg = Box::new(KeyMsg {
            key: KeyCode::Char('e'),
            modifiers: KeyModifiers::NONE,
        });
        assert!(jump.update(&other_key).is_none());

        let cmd = jump.update(&ctrl_e()).expect("visible affordance");
        let msg = cmd.await.expect("request");
        let request = msg.downcast_ref::<ScrollToBottomMsg>().expect("scroll request");
        assert_eq!(request.id, vp.id());
        assert!(request.smooth);

        assert!(vp.update(msg).is_some());
        assert_eq!(vp.follow_state(), FollowState::AutoScrolling);
    }

    #[test]
    fn test_hidden_after_viewport_teardown() {
        let mut vp = scrolled_up();
        let mut jump = JumpToBottom::new(vp.channel());
        assert!(jump.visible());
        vp.destroy();
        assert!(!jump.visible());
        assert!(jump.activate().is_none());

        jump.unbind();
        assert!(jump.channel().is_none());
        jump.bind(scrolled_up().channel());
        assert!(!jump.visible());
    }

    #[test]
    fn test_truncate_counts_cells() {
        assert_eq!(truncate("new messages", 0), "new messages");
        assert_eq!(truncate("new messages", 12), "new messages");
        assert_eq!(truncate("new messages", 5), "new …");
        assert_eq!(truncate("新しいメッセージ", 5), "新し…");
        assert_eq!(truncate("abc", 1), "…");
    }
}
