//! Windowing engine.
//!
//! Given an item count, a per-item size estimate, the measured sizes known so
//! far, a gap and an overscan count, [`Windowing::compute`] works out which
//! items intersect the visible region (plus overscan) and how tall the whole
//! list is. The result, a [`VirtualWindow`], is a pure function of those
//! inputs and is recomputed whenever any of them changes.
//!
//! ```rust
//! use bubbletea_scrollback::window::Windowing;
//!
//! let mut windowing = Windowing::new(10.0, 0.0, 1);
//! windowing.set_count(100);
//! assert_eq!(windowing.total_extent(), 1000.0);
//!
//! let window = windowing.compute(200.0, 50.0);
//! assert_eq!(window.range(), Some(19..=25));
//! ```

use std::ops::RangeInclusive;

/// One item placed in a [`VirtualWindow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualItem {
    /// Item index in `[0, N)`.
    pub index: usize,
    /// Cumulative offset of the item's leading edge.
    pub offset: f64,
    /// Measured size, or the estimate when not yet measured.
    pub size: f64,
}

impl VirtualItem {
    /// Offset of the item's trailing edge.
    pub fn end(&self) -> f64 {
        self.offset + self.size
    }
}

/// The set of items to render for one scroll position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VirtualWindow {
    /// Contiguous, ascending run of items.
    pub items: Vec<VirtualItem>,
    /// Sum of all item sizes plus the gaps between them.
    pub total_extent: f64,
}

impl VirtualWindow {
    /// First rendered index.
    pub fn start_index(&self) -> Option<usize> {
        self.items.first().map(|item| item.index)
    }

    /// Last rendered index (inclusive).
    pub fn end_index(&self) -> Option<usize> {
        self.items.last().map(|item| item.index)
    }

    /// Rendered indices, or `None` for an empty list.
    pub fn range(&self) -> Option<RangeInclusive<usize>> {
        Some(self.start_index()?..=self.end_index()?)
    }

    /// Whether no items are rendered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Item sizes and the parameters that turn them into windows.
#[derive(Debug, Clone)]
pub struct Windowing {
    estimate: f64,
    gap: f64,
    overscan: usize,
    measured: Vec<Option<f64>>,
}

impl Windowing {
    /// Creates an empty engine.
    ///
    /// A non-positive or non-finite `estimate` falls back to `1.0`; a
    /// negative or non-finite `gap` falls back to `0.0`.
    pub fn new(estimate: f64, gap: f64, overscan: usize) -> Self {
        Self {
            estimate: if estimate.is_finite() && estimate > 0.0 {
                estimate
            } else {
                1.0
            },
            gap: if gap.is_finite() && gap >= 0.0 { gap } else { 0.0 },
            overscan,
            measured: Vec::new(),
        }
    }

    /// Number of items.
    pub fn count(&self) -> usize {
        self.measured.len()
    }

    /// Grows or shrinks the item list. Existing measurements are kept.
    pub fn set_count(&mut self, count: usize) {
        self.measured.resize(count, None);
    }

    /// Overscan count.
    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Changes the overscan count.
    pub fn set_overscan(&mut self, overscan: usize) {
        self.overscan = overscan;
    }

    /// Records the rendered size of `index`. Returns whether the size changed.
    ///
    /// Negative, NaN or infinite sizes are not trusted: the item falls back
    /// to the estimate instead.
    pub fn measure(&mut self, index: usize, size: f64) -> bool {
        let Some(slot) = self.measured.get_mut(index) else {
            return false;
        };
        let size = if size.is_finite() && size >= 0.0 {
            size
        } else {
            tracing::warn!(index, size, "rejected item measurement, using estimate");
            self.estimate
        };
        if *slot == Some(size) {
            return false;
        }
        *slot = Some(size);
        true
    }

    /// Whether `index` has been measured.
    pub fn is_measured(&self, index: usize) -> bool {
        matches!(self.measured.get(index), Some(Some(_)))
    }

    /// Forgets every measurement, e.g. after the available width changed.
    pub fn reset_measurements(&mut self) {
        self.measured.iter_mut().for_each(|slot| *slot = None);
    }

    /// Current size of `index`: the measurement if any, else the estimate.
    pub fn size_of(&self, index: usize) -> f64 {
        self.measured
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(self.estimate)
    }

    /// Leading-edge offset of `index`.
    pub fn offset_of(&self, index: usize) -> f64 {
        (0..index.min(self.count()))
            .map(|i| self.size_of(i) + self.gap)
            .sum()
    }

    /// Sum of all sizes plus the gaps between adjacent items.
    pub fn total_extent(&self) -> f64 {
        let n = self.count();
        if n == 0 {
            return 0.0;
        }
        let sizes: f64 = (0..n).map(|i| self.size_of(i)).sum();
        sizes + self.gap * (n - 1) as f64
    }

    /// Computes the window for a container scrolled to `scroll_top` showing
    /// `client_height` units.
    pub fn compute(&self, scroll_top: f64, client_height: f64) -> VirtualWindow {
        let n = self.count();
        if n == 0 {
            return VirtualWindow::default();
        }

        let mut offsets = Vec::with_capacity(n);
        let mut cursor = 0.0;
        for i in 0..n {
            offsets.push(cursor);
            cursor += self.size_of(i);
            if i + 1 < n {
                cursor += self.gap;
            }
        }
        let total_extent = cursor;

        let avg = (0..n).map(|i| self.size_of(i)).sum::<f64>() / n as f64;
        let pad = self.overscan as f64 * avg;
        let scroll_top = if scroll_top.is_finite() { scroll_top } else { 0.0 };
        let client_height = if client_height.is_finite() {
            client_height.max(0.0)
        } else {
            0.0
        };
        let lo = scroll_top - pad;
        let hi = scroll_top + client_height + pad;

        // First item whose trailing edge is past `lo`, last whose leading
        // edge is before `hi`.
        let start = offsets
            .iter()
            .enumerate()
            .position(|(i, offset)| offset + self.size_of(i) > lo)
            .unwrap_or(n - 1);
        let end = offsets
            .partition_point(|offset| *offset < hi)
            .saturating_sub(1)
            .clamp(start, n - 1);

        let items = (start..=end)
            .map(|index| VirtualItem {
                index,
                offset: offsets[index],
                size: self.size_of(index),
            })
            .collect();

        VirtualWindow {
            items,
            total_extent,
        }
    }
}
