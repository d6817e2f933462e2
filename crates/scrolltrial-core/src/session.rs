#![forbid(unsafe_code)]

//! Scroll position of a pane.
//!
//! [`ScrollSession`] holds one offset per axis, each bounded to
//! `[0, content - viewport]`. The only way to change an offset is through the
//! clamped moves below, and every move reports whether anything changed so
//! the caller knows when to repaint.
//!
//! The session is plain data mutated through `&mut self`. Background tick
//! loops never touch it; their deltas arrive as messages and are applied by
//! whoever owns the session.

/// Scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Snapshot of both offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollOffsets {
    pub vertical: i64,
    pub horizontal: i64,
}

impl ScrollOffsets {
    /// Offset along `axis`.
    #[must_use]
    pub const fn get(&self, axis: Axis) -> i64 {
        match axis {
            Axis::Vertical => self.vertical,
            Axis::Horizontal => self.horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct AxisState {
    offset: i64,
    content: i64,
    viewport: i64,
}

impl AxisState {
    fn new(content: i64, viewport: i64) -> Self {
        Self {
            offset: 0,
            content,
            viewport,
        }
    }

    #[inline]
    fn max_offset(&self) -> i64 {
        (self.content - self.viewport).max(0)
    }

    fn set(&mut self, target: i64) -> bool {
        let clamped = target.clamp(0, self.max_offset());
        let moved = clamped != self.offset;
        self.offset = clamped;
        moved
    }
}

/// Per-axis scroll offsets with clamped moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollSession {
    vertical: AxisState,
    horizontal: AxisState,
}

impl ScrollSession {
    /// Session for a pane that only scrolls vertically.
    #[must_use]
    pub fn vertical(content_height: i64, viewport_height: i64) -> Self {
        Self {
            vertical: AxisState::new(content_height, viewport_height),
            horizontal: AxisState::default(),
        }
    }

    /// Session for a pane that scrolls on both axes. Sizes are
    /// `(width, height)`.
    #[must_use]
    pub fn grid(content: (i64, i64), viewport: (i64, i64)) -> Self {
        Self {
            vertical: AxisState::new(content.1, viewport.1),
            horizontal: AxisState::new(content.0, viewport.0),
        }
    }

    fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::Vertical => &mut self.vertical,
            Axis::Horizontal => &mut self.horizontal,
        }
    }

    /// Move by `delta`, clamping to the scrollable range.
    ///
    /// Returns `false` when the offset did not change (zero delta, or already
    /// pinned at the boundary the delta points to).
    pub fn move_by(&mut self, axis: Axis, delta: i64) -> bool {
        let state = self.axis_mut(axis);
        let target = state.offset.saturating_add(delta);
        let moved = state.set(target);
        tracing::trace!(
            target: "scrolltrial.session",
            ?axis,
            delta,
            offset = state.offset,
            moved,
            "move_by"
        );
        moved
    }

    /// Jump to an absolute offset (clamped). Returns whether it changed.
    pub fn scroll_to(&mut self, axis: Axis, offset: i64) -> bool {
        self.axis_mut(axis).set(offset)
    }

    /// Current offset along `axis`.
    #[must_use]
    pub fn offset(&self, axis: Axis) -> i64 {
        self.axis(axis).offset
    }

    /// Both offsets.
    #[must_use]
    pub fn offsets(&self) -> ScrollOffsets {
        ScrollOffsets {
            vertical: self.vertical.offset,
            horizontal: self.horizontal.offset,
        }
    }

    /// Largest legal offset along `axis`.
    #[must_use]
    pub fn max_offset(&self, axis: Axis) -> i64 {
        self.axis(axis).max_offset()
    }

    /// Whether `axis` can scroll at all.
    #[must_use]
    pub fn is_scrollable(&self, axis: Axis) -> bool {
        self.max_offset(axis) > 0
    }

    /// Return both axes to offset zero.
    pub fn reset(&mut self) {
        self.vertical.offset = 0;
        self.horizontal.offset = 0;
    }
}
