//! The scroll container contract.
//!
//! The container is owned by the host, never by the viewport: the follow
//! controller only reads its geometry and asks it to move. Hosts normally
//! inject a container directly; [`find_scroll_ancestor`] is a fallback for
//! trees where the viewport only knows its own node and has to look upward
//! for whatever ancestor scrolls vertically.

/// How a programmatic scroll should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Jump straight to the target.
    Instant,
    /// Animate towards the target.
    Smooth,
}

impl ScrollBehavior {
    /// `Smooth` when `smooth` is true.
    pub fn from_smooth(smooth: bool) -> Self {
        if smooth {
            Self::Smooth
        } else {
            Self::Instant
        }
    }
}

/// Geometry snapshot of a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    /// Distance scrolled from the top.
    pub scroll_top: f64,
    /// Total scrollable content height.
    pub scroll_height: f64,
    /// Visible height.
    pub client_height: f64,
}

impl Metrics {
    /// Largest valid `scroll_top`.
    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Remaining distance to the bottom edge.
    ///
    /// Non-finite geometry reads as infinitely far away, so a broken
    /// container is never mistaken for one that is at the bottom.
    pub fn distance_from_bottom(&self) -> f64 {
        let distance = self.scroll_height - self.scroll_top - self.client_height;
        if distance.is_nan() {
            f64::INFINITY
        } else {
            distance
        }
    }

    /// `scrollHeight - scrollTop - clientHeight < threshold`.
    pub fn is_at_bottom(&self, threshold: f64) -> bool {
        self.distance_from_bottom() < threshold
    }
}

/// A vertically scrollable region owned by the host.
pub trait ScrollContainer {
    /// Distance scrolled from the top.
    fn scroll_top(&self) -> f64;

    /// Total scrollable content height.
    fn scroll_height(&self) -> f64;

    /// Visible height.
    fn client_height(&self) -> f64;

    /// Moves the scroll position. Targets out of range are clamped by the
    /// container.
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);

    /// Current geometry.
    fn metrics(&self) -> Metrics {
        Metrics {
            scroll_top: self.scroll_top(),
            scroll_height: self.scroll_height(),
            client_height: self.client_height(),
        }
    }
}

/// Vertical overflow mode of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Content spills over, nothing scrolls.
    Visible,
    /// Content is clipped, nothing scrolls.
    Hidden,
    /// Scrolls when content overflows.
    Auto,
    /// Always scrollable.
    Scroll,
}

impl Overflow {
    /// Whether this mode enables vertical scrolling.
    pub fn scrolls(self) -> bool {
        matches!(self, Overflow::Auto | Overflow::Scroll)
    }
}

/// A node in the host's containing tree.
///
/// Nodes are handles (cheap to clone, e.g. `Rc`-backed) so walking to a
/// parent yields an owned value.
pub trait ScrollNode: Sized {
    /// Container type produced by a scrollable node.
    type Container: ScrollContainer;

    /// The containing node, or `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// Vertical overflow mode.
    fn overflow_y(&self) -> Overflow;

    /// A container handle for this node, if it can act as one.
    fn as_container(&self) -> Option<Self::Container>;
}

/// Walks up from `start` (exclusive) to the nearest ancestor that scrolls
/// vertically and can act as a container.
pub fn find_scroll_ancestor<N: ScrollNode>(start: &N) -> Option<N::Container> {
    let mut current = start.parent();
    while let Some(node) = current {
        if node.overflow_y().scrolls() {
            if let Some(container) = node.as_container() {
                return Some(container);
            }
        }
        current = node.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Fixed(Metrics, &'static str);

    impl ScrollContainer for Fixed {
        fn scroll_top(&self) -> f64 {
            self.0.scroll_top
        }
        fn scroll_height(&self) -> f64 {
            self.0.scroll_height
        }
        fn client_height(&self) -> f64 {
            self.0.client_height
        }
        fn scroll_to(&mut self, top: f64, _behavior: ScrollBehavior) {
            self.0.scroll_top = top;
        }
    }

    struct Node {
        name: &'static str,
        overflow: Overflow,
        parent: Option<Rc<Node>>,
    }

    #[derive(Clone)]
    struct Handle(Rc<Node>);

    impl ScrollNode for Handle {
        type Container = Fixed;

        fn parent(&self) -> Option<Self> {
            self.0.parent.clone().map(Handle)
        }

        fn overflow_y(&self) -> Overflow {
            self.0.overflow
        }

        fn as_container(&self) -> Option<Fixed> {
            Some(Fixed(Metrics::default(), self.0.name))
        }
    }

    fn node(name: &'static str, overflow: Overflow, parent: Option<&Handle>) -> Handle {
        Handle(Rc::new(Node {
            name,
            overflow,
            parent: parent.map(|p| p.0.clone()),
        }))
    }

    #[test]
    fn test_bottom_classification() {
        let metrics = Metrics {
            scroll_top: 460.0,
            scroll_height: 1000.0,
            client_height: 500.0,
        };
        assert_eq!(metrics.distance_from_bottom(), 40.0);
        assert!(metrics.is_at_bottom(50.0));
        assert!(!metrics.is_at_bottom(40.0));
        assert_eq!(metrics.max_scroll_top(), 500.0);
    }

    #[test]
    fn test_nan_geometry_is_not_at_bottom() {
        let metrics = Metrics {
            scroll_top: f64::NAN,
            scroll_height: 100.0,
            client_height: 50.0,
        };
        assert!(!metrics.is_at_bottom(50.0));
    }

    #[test]
    fn test_short_content_has_zero_max_top() {
        let metrics = Metrics {
            scroll_top: 0.0,
            scroll_height: 20.0,
            client_height: 50.0,
        };
        assert_eq!(metrics.max_scroll_top(), 0.0);
        assert!(metrics.is_at_bottom(1.0));
    }

    #[test]
    fn test_finds_nearest_scrolling_ancestor() {
        let root = node("root", Overflow::Scroll, None);
        let panel = node("panel", Overflow::Auto, Some(&root));
        let clip = node("clip", Overflow::Hidden, Some(&panel));
        let leaf = node("leaf", Overflow::Scroll, Some(&clip));

        let found = find_scroll_ancestor(&leaf).expect("ancestor");
        assert_eq!(found.1, "panel");
    }

    #[test]
    fn test_no_scrolling_ancestor() {
        let root = node("root", Overflow::Visible, None);
        let leaf = node("leaf", Overflow::Auto, Some(&root));
        assert!(find_scroll_ancestor(&leaf).is_none());
    }

    #[test]
    fn test_behavior_from_flag() {
        assert_eq!(ScrollBehavior::from_smooth(true), ScrollBehavior::Smooth);
        assert_eq!(ScrollBehavior::from_smooth(false), ScrollBehavior::Instant);
    }
}
