//! Auto-scroll controller.
//!
//! [`AutoScroll`] decides, on every content change, whether to move the
//! scroll container to the bottom. It is a state machine driven by discrete
//! inputs: content changes, native scroll events, explicit requests and the
//! deferred messages it schedules for itself.
//!
//! ```text
//!            first content                 growth while at bottom
//!   Idle ───────────────────► AutoScrolling ◄──────────────── Pinned
//!                                  │  ▲                          ▲  │
//!                  settle elapsed  │  │ scroll_to_bottom()       │  │ growth while
//!                                  ▼  │                          │  │ scrolled away
//!                               Pinned      UserDetached ────────┘  ▼
//!                                           (user back at bottom)  UserDetached
//! ```
//!
//! A programmatic scroll runs in three steps. The layout wait lets the
//! grown content reach the container before the new bottom is read. The
//! write moves the container. The settle delay outlasts the smooth
//! animation. `auto_scroll_pending` stays set for the whole flight, so the
//! scroll events caused by the controller's own write are never mistaken
//! for the user.
//!
//! Growth observed while the user is actively scrolling never triggers a
//! scroll: user input always wins over following.

use crate::channel::{Channel, ScrollToBottomMsg};
use crate::config::Config;
use crate::container::{
    find_scroll_ancestor, Metrics, ScrollBehavior, ScrollContainer, ScrollNode,
};
use crate::timer::{next_id, Deadline};
use crate::tracker::{DebounceMsg, Tracker};
use bubbletea_rs::{Cmd, Msg};
use std::time::Duration;

/// Observable follow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    /// No content seen yet.
    Idle,
    /// At the bottom and following growth.
    Pinned,
    /// The user scrolled away; growth is not followed.
    UserDetached,
    /// A programmatic scroll to the bottom is in flight.
    AutoScrolling,
}

impl std::fmt::Display for FollowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FollowState::Idle => "idle",
                FollowState::Pinned => "pinned",
                FollowState::UserDetached => "detached",
                FollowState::AutoScrolling => "auto-scrolling",
            }
        )
    }
}

/// Snapshot of the scroll classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// Distance scrolled from the top.
    pub scroll_top: f64,
    /// Total scrollable content height.
    pub scroll_height: f64,
    /// Visible height.
    pub client_height: f64,
    /// Within the threshold of the bottom.
    pub is_at_bottom: bool,
    /// Scroll events arrived within the debounce window.
    pub is_user_scrolling: bool,
    /// A programmatic scroll is in flight.
    pub auto_scroll_pending: bool,
}

/// One layout frame elapsed while waiting to write.
#[derive(Debug, Clone)]
pub struct LayoutMsg {
    /// Id of the owning viewport.
    pub id: u64,
    tag: u64,
}

/// The settle delay after a programmatic write elapsed.
#[derive(Debug, Clone)]
pub struct SettleMsg {
    /// Id of the owning viewport.
    pub id: u64,
    tag: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pinned,
    UserDetached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingLayout { frames_left: u8 },
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flight {
    behavior: ScrollBehavior,
    stage: Stage,
}

/// The follow state machine bound to one scroll container.
pub struct AutoScroll<C> {
    id: u64,
    container: Option<C>,
    tracker: Tracker,
    channel: Channel,
    phase: Phase,
    flight: Option<Flight>,
    flight_timer: Deadline,
    frame_interval: Duration,
    layout_frames: u8,
    settle_delay: Duration,
    last_count: usize,
    last_extent: f64,
    mounted: bool,
}

impl<C: ScrollContainer + std::fmt::Debug> std::fmt::Debug for AutoScroll<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoScroll")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("container", &self.container)
            .field("tracker", &self.tracker)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl<C: ScrollContainer> AutoScroll<C> {
    /// Creates a controller whose container is not resolved yet.
    ///
    /// Until [`AutoScroll::attach`] is called every operation is a no-op.
    /// `config` is used as given; run [`Config::validate`] on untrusted input.
    pub fn new(config: &Config) -> Self {
        let id = next_id();
        Self {
            id,
            container: None,
            tracker: Tracker::new(id, config.threshold, config.debounce()),
            channel: Channel::new(id),
            phase: Phase::Idle,
            flight: None,
            flight_timer: Deadline::new(id),
            frame_interval: config.frame_interval(),
            layout_frames: config.layout_frames.max(1),
            settle_delay: config.settle_delay(),
            last_count: 0,
            last_extent: 0.0,
            mounted: true,
        }
    }

    /// Creates a controller with an injected container.
    pub fn with_container(config: &Config, container: C) -> Self {
        let mut follow = Self::new(config);
        follow.container = Some(container);
        follow
    }

    /// Creates a controller for the content rooted at `start`, using the
    /// nearest scrollable ancestor as its container.
    ///
    /// When no ancestor scrolls, the controller starts unresolved and
    /// [`AutoScroll::attach`] can supply a container later.
    pub fn discover<N>(config: &Config, start: &N) -> Self
    where
        N: ScrollNode<Container = C>,
    {
        let mut follow = Self::new(config);
        follow.container = find_scroll_ancestor(start);
        if follow.container.is_none() {
            tracing::debug!(viewport = follow.id, "no scrollable ancestor found");
        }
        follow
    }

    /// Resolves the container after construction.
    ///
    /// If content arrived while the container was missing, the initial
    /// scroll to the bottom starts now.
    pub fn attach(&mut self, container: C) -> Option<Cmd> {
        if !self.mounted {
            return None;
        }
        tracing::debug!(viewport = self.id, "scroll container attached");
        self.container = Some(container);
        if self.phase == Phase::Idle && self.last_count > 0 && self.flight.is_none() {
            return self.begin_flight(ScrollBehavior::Instant);
        }
        None
    }

    /// Instance id used to address deferred messages.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The resolved container, if any.
    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    /// Mutable access to the resolved container.
    ///
    /// Geometry changes made through it should be followed by
    /// [`AutoScroll::on_content_change`] or [`AutoScroll::on_native_scroll`].
    pub fn container_mut(&mut self) -> Option<&mut C> {
        self.container.as_mut()
    }

    /// Handle to the bottom-state channel.
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// Current follow state.
    pub fn state(&self) -> FollowState {
        if self.flight.is_some() {
            return FollowState::AutoScrolling;
        }
        match self.phase {
            Phase::Idle => FollowState::Idle,
            Phase::Pinned => FollowState::Pinned,
            Phase::UserDetached => FollowState::UserDetached,
        }
    }

    /// Last bottom classification.
    pub fn is_at_bottom(&self) -> bool {
        self.tracker.is_at_bottom()
    }

    /// Whether the user scrolled within the debounce window.
    pub fn is_user_scrolling(&self) -> bool {
        self.tracker.is_user_scrolling()
    }

    /// Whether a programmatic scroll is in flight.
    pub fn auto_scroll_pending(&self) -> bool {
        self.flight.is_some()
    }

    /// Whether the controller has not been torn down.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Geometry and classification snapshot.
    pub fn scroll_state(&self) -> ScrollState {
        let metrics = self
            .container
            .as_ref()
            .map(|c| c.metrics())
            .unwrap_or_default();
        ScrollState {
            scroll_top: metrics.scroll_top,
            scroll_height: metrics.scroll_height,
            client_height: metrics.client_height,
            is_at_bottom: self.tracker.is_at_bottom(),
            is_user_scrolling: self.tracker.is_user_scrolling(),
            auto_scroll_pending: self.flight.is_some(),
        }
    }

    fn metrics(&self) -> Option<Metrics> {
        self.container.as_ref().map(|c| c.metrics())
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(
                viewport = self.id,
                from = ?self.phase,
                to = ?phase,
                "follow state changed"
            );
            self.phase = phase;
        }
    }

    fn publish(&self) {
        self.channel.publish(self.tracker.is_at_bottom());
    }

    /// Reacts to a change in item count or total extent.
    ///
    /// The decision uses the bottom classification from before the change:
    /// right after growth the container is, by construction, no longer at
    /// its new bottom.
    pub fn on_content_change(&mut self, count: usize, total_extent: f64) -> Option<Cmd> {
        if !self.mounted {
            return None;
        }
        let grew = count > self.last_count || total_extent > self.last_extent;
        self.last_count = count;
        self.last_extent = total_extent;

        let metrics = self.metrics()?;

        if let Some(flight) = self.flight {
            // The write reads the bottom when it happens; only a flight that
            // already wrote needs to go again.
            if grew && flight.stage == Stage::Settling {
                return self.begin_flight(flight.behavior);
            }
            return None;
        }

        match self.phase {
            Phase::Idle => {
                if count > 0 {
                    return self.begin_flight(ScrollBehavior::Instant);
                }
                None
            }
            Phase::Pinned if grew => {
                if self.tracker.is_user_scrolling() {
                    tracing::debug!(viewport = self.id, "growth while user scrolls, not following");
                    if !self.tracker.is_at_bottom() {
                        self.set_phase(Phase::UserDetached);
                    }
                    return None;
                }
                if self.tracker.is_at_bottom() {
                    return self.begin_flight(ScrollBehavior::Smooth);
                }
                self.set_phase(Phase::UserDetached);
                self.tracker.reclassify(metrics);
                self.publish();
                None
            }
            Phase::Pinned | Phase::UserDetached => {
                // While the user is active their scroll events keep the
                // classification current.
                if self.tracker.is_user_scrolling() {
                    return None;
                }
                if self.phase == Phase::Pinned && self.tracker.is_at_bottom() {
                    return None;
                }
                self.tracker.reclassify(metrics);
                if self.phase == Phase::UserDetached && self.tracker.is_at_bottom() {
                    self.set_phase(Phase::Pinned);
                }
                self.publish();
                None
            }
        }
    }

    /// Reacts to a change of the container's visible height.
    ///
    /// A pinned viewport left short of its bottom by the new geometry
    /// scrolls back there; otherwise the classification is refreshed.
    pub fn on_resize(&mut self) -> Option<Cmd> {
        if !self.mounted || self.flight.is_some() {
            return None;
        }
        let metrics = self.metrics()?;
        let at_bottom = self.tracker.reclassify(metrics);
        if self.phase == Phase::Pinned && !at_bottom && !self.tracker.is_user_scrolling() {
            tracing::debug!(viewport = self.id, "resized away from bottom, following");
            return self.begin_flight(ScrollBehavior::Instant);
        }
        if self.phase == Phase::UserDetached && at_bottom {
            self.set_phase(Phase::Pinned);
        }
        self.publish();
        None
    }

    /// Handles a native scroll event from the container.
    ///
    /// Events during a programmatic flight are the controller's own doing
    /// and are ignored.
    pub fn on_native_scroll(&mut self) -> Option<Cmd> {
        if !self.mounted || self.flight.is_some() {
            return None;
        }
        let metrics = self.metrics()?;
        let (_, cmd) = self.tracker.on_native_scroll(metrics);
        if self.phase == Phase::UserDetached && self.tracker.is_at_bottom() {
            self.set_phase(Phase::Pinned);
        }
        self.publish();
        Some(cmd)
    }

    /// Marks explicit user input (a key press that scrolls).
    ///
    /// Aborts an in-flight programmatic scroll so the user's own scroll is
    /// classified normally, even while content streams in continuously.
    pub fn on_user_input(&mut self) {
        if !self.mounted {
            return;
        }
        if self.flight.take().is_some() {
            self.flight_timer.cancel();
            tracing::debug!(viewport = self.id, "user input aborted auto-scroll");
            if self.phase == Phase::Idle {
                self.set_phase(Phase::Pinned);
            }
        }
    }

    /// Scrolls to the bottom regardless of state, overriding a detached
    /// viewport.
    pub fn scroll_to_bottom(&mut self, smooth: bool) -> Option<Cmd> {
        if !self.mounted || self.container.is_none() {
            return None;
        }
        self.begin_flight(ScrollBehavior::from_smooth(smooth))
    }

    fn begin_flight(&mut self, behavior: ScrollBehavior) -> Option<Cmd> {
        self.container.as_ref()?;
        self.tracker.suppress();
        self.flight = Some(Flight {
            behavior,
            stage: Stage::AwaitingLayout {
                frames_left: self.layout_frames,
            },
        });
        let cmd = self
            .flight_timer
            .arm(self.frame_interval, |id, tag| LayoutMsg { id, tag });
        tracing::debug!(
            viewport = self.id,
            tag = self.flight_timer.tag(),
            ?behavior,
            "auto-scroll scheduled"
        );
        Some(cmd)
    }

    fn on_layout(&mut self, msg: &LayoutMsg) -> Option<Cmd> {
        if !self.mounted || !self.flight_timer.fire(msg.id, msg.tag) {
            return None;
        }
        let mut flight = self.flight?;
        let Stage::AwaitingLayout { frames_left } = flight.stage else {
            return None;
        };
        if frames_left > 1 {
            flight.stage = Stage::AwaitingLayout {
                frames_left: frames_left - 1,
            };
            self.flight = Some(flight);
            return Some(
                self.flight_timer
                    .arm(self.frame_interval, |id, tag| LayoutMsg { id, tag }),
            );
        }

        let container = self.container.as_mut()?;
        let top = container.metrics().max_scroll_top();
        container.scroll_to(top, flight.behavior);
        tracing::debug!(viewport = self.id, top, behavior = ?flight.behavior, "scrolled to bottom");

        flight.stage = Stage::Settling;
        self.flight = Some(flight);
        Some(
            self.flight_timer
                .arm(self.settle_delay, |id, tag| SettleMsg { id, tag }),
        )
    }

    fn on_settle(&mut self, msg: &SettleMsg) -> Option<Cmd> {
        if !self.mounted || !self.flight_timer.fire(msg.id, msg.tag) {
            return None;
        }
        self.flight = None;
        self.tracker.assert_at_bottom();
        self.set_phase(Phase::Pinned);
        self.publish();
        None
    }

    /// Routes messages addressed to this controller.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(layout) = msg.downcast_ref::<LayoutMsg>() {
            if layout.id == self.id {
                return self.on_layout(layout);
            }
        } else if let Some(settle) = msg.downcast_ref::<SettleMsg>() {
            if settle.id == self.id {
                return self.on_settle(settle);
            }
        } else if let Some(debounce) = msg.downcast_ref::<DebounceMsg>() {
            if debounce.id == self.id && self.mounted {
                self.tracker.on_debounce(debounce);
            }
        } else if let Some(request) = msg.downcast_ref::<ScrollToBottomMsg>() {
            if request.id == self.id {
                return self.scroll_to_bottom(request.smooth);
            }
        }
        None
    }

    /// Tears the controller down: cancels every pending timer and closes the
    /// channel. Deferred messages that arrive afterwards are ignored.
    pub fn destroy(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.flight = None;
        self.flight_timer.cancel();
        self.tracker.cancel();
        self.channel.close();
        tracing::debug!(viewport = self.id, "auto-scroll torn down");
    }

    #[cfg(test)]
    pub(crate) fn awaiting_layout(&self) -> bool {
        matches!(
            self.flight,
            Some(Flight {
                stage: Stage::AwaitingLayout { .. },
                ..
            })
        )
    }

    #[cfg(test)]
    pub(crate) fn pending_layout(&self) -> LayoutMsg {
        LayoutMsg {
            id: self.id,
            tag: self.flight_timer.tag(),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_settle(&self) -> SettleMsg {
        SettleMsg {
            id: self.id,
            tag: self.flight_timer.tag(),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_debounce(&self) -> DebounceMsg {
        self.tracker.debounce_msg()
    }
}

impl<C> Drop for AutoScroll<C> {
    fn drop(&mut self) {
        self.channel.close();
    }
}
