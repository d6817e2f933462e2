#![forbid(unsafe_code)]

//! Scroll-target geometry.
//!
//! Pure functions that translate a logical target (a line of a text buffer
//! or a cell of a grid) into
//!
//! - an [`AcceptanceWindow`]: the range of scroll offsets for which the
//!   centered frame fully contains the target, and
//! - pixel [`Rect`]s used to draw the frame indicators and the scroll-bar
//!   target band.
//!
//! # Centered-frame rule
//!
//! With `visible` units in the viewport and a frame of `frame` units, the
//! frame starts `offset = (visible - frame) / 2` units below the top of the
//! viewport. A target at index `t` sits inside the frame when the first
//! visible unit `s` satisfies `t - (frame - 1) - offset <= s <= t - offset`.
//! Multiplying by the scroll value of one unit yields the window.
//!
//! Every function validates its inputs first and never clamps silently.

use crate::error::{GeometryError, Result};
use crate::metrics::{AxisExtent, LineMetrics, to_i64};

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Inclusive range of scroll offsets for one axis. Always `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcceptanceWindow {
    min: i64,
    max: i64,
}

impl AcceptanceWindow {
    /// Create a window, ordering the bounds if they are given reversed.
    #[must_use]
    pub const fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Smallest accepted offset.
    #[inline]
    #[must_use]
    pub const fn min(&self) -> i64 {
        self.min
    }

    /// Largest accepted offset.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> i64 {
        self.max
    }

    /// Inclusive containment.
    #[inline]
    #[must_use]
    pub const fn contains(&self, offset: i64) -> bool {
        offset >= self.min && offset <= self.max
    }

    /// Width of the window in scroll units.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> i64 {
        self.max - self.min
    }

    /// Signed distance from `offset` to the nearest bound; zero when inside.
    ///
    /// Negative means the offset is above the window (scroll forward),
    /// positive means it is past the window (scroll back).
    #[must_use]
    pub const fn distance(&self, offset: i64) -> i64 {
        if offset < self.min {
            offset - self.min
        } else if offset > self.max {
            offset - self.max
        } else {
            0
        }
    }
}

/// Acceptance windows of a grid target, one per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridWindows {
    /// Window on the vertical scroll offset.
    pub rows: AcceptanceWindow,
    /// Window on the horizontal scroll offset.
    pub cols: AcceptanceWindow,
}

/// Pixel rectangle. Coordinates may be negative (indicators are drawn just
/// outside the pane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i64 {
        self.y + self.height
    }
}

// ---------------------------------------------------------------------------
// Character spans
// ---------------------------------------------------------------------------

/// Character span `(start, end)` of line `line_index` (0-based).
///
/// `start` counts every preceding line plus one separator per line; `end`
/// is exclusive, so `end - start` equals the stored count for the line.
pub fn line_char_span(line_index: usize, metrics: &LineMetrics) -> Result<(usize, usize)> {
    let counts = metrics.counts();
    let len = *counts
        .get(line_index)
        .ok_or_else(|| GeometryError::out_of_range(line_index, counts.len()))?;
    let start: usize = counts[..line_index].iter().map(|c| c + 1).sum();
    Ok((start, start + len))
}

/// Same as [`line_char_span`] for a 1-based line number.
pub fn line_char_span_1based(line_number: usize, metrics: &LineMetrics) -> Result<(usize, usize)> {
    match line_number.checked_sub(1) {
        Some(index) => line_char_span(index, metrics),
        None => Err(GeometryError::OutOfRange {
            index: 0,
            count: metrics.line_count(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Acceptance windows
// ---------------------------------------------------------------------------

/// Units between the top of the viewport and the top of a centered frame.
pub fn centered_offset(visible: usize, frame: usize) -> Result<usize> {
    if frame == 0 || frame > visible {
        return Err(GeometryError::InvalidFrame { frame, visible });
    }
    Ok((visible - frame) / 2)
}

/// Acceptance window for a line target in a 1D buffer.
///
/// `unit_height` is the scroll value of one line (the line height in
/// pixels for a pixel-scrolled pane).
pub fn acceptance_window_1d(
    frame_size: usize,
    target_line: usize,
    visible_lines: usize,
    unit_height: i64,
) -> Result<AcceptanceWindow> {
    const WHAT: &str = "acceptance window";
    let offset = to_i64(centered_offset(visible_lines, frame_size)?);
    let target = checked_i64(target_line, WHAT)?;
    let frame = to_i64(frame_size);

    let first = target
        .checked_sub(frame - 1)
        .and_then(|v| v.checked_sub(offset))
        .ok_or(GeometryError::Overflow { what: WHAT })?;
    let last = target
        .checked_sub(offset)
        .ok_or(GeometryError::Overflow { what: WHAT })?;
    let min = checked_scale(first, unit_height, WHAT)?;
    let max = checked_scale(last, unit_height, WHAT)?;
    tracing::trace!(
        target: "scrolltrial.geometry",
        frame_size,
        target_line,
        visible_lines,
        unit_height,
        min,
        max,
        "1d acceptance window"
    );
    Ok(AcceptanceWindow::new(min, max))
}

/// Scroll value of one row (or column): `scroll_max / (total - visible)`.
///
/// Integer division, matching the toolkit's integer scroll model. The
/// zero-divisor case is rejected before dividing.
pub fn scroll_unit(axis: &AxisExtent) -> Result<i64> {
    if axis.visible > axis.total {
        return Err(GeometryError::InvalidGrid {
            total: axis.total,
            visible: axis.visible,
        });
    }
    if axis.total == axis.visible {
        return Err(GeometryError::DegenerateExtent {
            total: axis.total,
            visible: axis.visible,
        });
    }
    let scrollable = axis.total - axis.visible;
    let unit = axis.scroll_max / to_i64(scrollable);
    if unit == 0 {
        return Err(GeometryError::ZeroScrollUnit {
            total: axis.total,
            visible: axis.visible,
            scrollable,
            scroll_max: axis.scroll_max,
        });
    }
    Ok(unit)
}

/// Acceptance windows for a grid cell target. Rows and columns are computed
/// independently with the 1D rule, each scaled by its own scroll unit.
pub fn acceptance_window_2d(
    frame_size: usize,
    target_row: usize,
    target_col: usize,
    rows: AxisExtent,
    cols: AxisExtent,
) -> Result<GridWindows> {
    let row_unit = scroll_unit(&rows)?;
    let col_unit = scroll_unit(&cols)?;
    Ok(GridWindows {
        rows: acceptance_window_1d(frame_size, target_row, rows.visible, row_unit)?,
        cols: acceptance_window_1d(frame_size, target_col, cols.visible, col_unit)?,
    })
}

/// Inclusive containment of `offset` in `window`.
#[inline]
#[must_use]
pub fn is_inside_window(offset: i64, window: &AcceptanceWindow) -> bool {
    window.contains(offset)
}

/// Both axes inside their windows at once.
#[inline]
#[must_use]
pub fn is_inside_2d(row_offset: i64, col_offset: i64, windows: &GridWindows) -> bool {
    windows.rows.contains(row_offset) && windows.cols.contains(col_offset)
}

/// Scroll offset that puts `line` (0-based) in the middle of the viewport,
/// or `None` when the line sits too close to either end to be centered.
#[must_use]
pub fn center_offset(line: usize, visible: usize, line_count: usize, unit: i64) -> Option<i64> {
    let half = visible / 2;
    let last_centerable = line_count.checked_sub(visible)?.checked_add(half)?;
    if line <= half || line >= last_centerable {
        return None;
    }
    i64::try_from(line - half).ok()?.checked_mul(unit)
}

// ---------------------------------------------------------------------------
// Indicator rectangles
// ---------------------------------------------------------------------------

/// Vertical frame indicator drawn immediately left of a 1D pane.
pub fn frame_indicator_1d(
    pane: Rect,
    visible_lines: usize,
    frame_size: usize,
    unit_height: i64,
    bar_width: i64,
) -> Result<Rect> {
    const WHAT: &str = "frame indicator";
    let offset = to_i64(centered_offset(visible_lines, frame_size)?);
    let y = checked_scale(offset, unit_height, WHAT)?
        .checked_add(pane.y)
        .ok_or(GeometryError::Overflow { what: WHAT })?;
    Ok(Rect::new(
        pane.x.saturating_sub(bar_width),
        y,
        bar_width,
        checked_scale(to_i64(frame_size), unit_height, WHAT)?,
    ))
}

/// Frame indicators of a grid pane: `(vertical, horizontal)`.
///
/// The vertical bar sits left of the pane, the horizontal bar above it;
/// each is centered on the frame along its own axis.
pub fn frame_indicators_2d(
    pane: Rect,
    visible_rows: usize,
    visible_cols: usize,
    frame_size: usize,
    cell_size: i64,
    bar_width: i64,
) -> Result<(Rect, Rect)> {
    const WHAT: &str = "frame indicator";
    let row_offset = to_i64(centered_offset(visible_rows, frame_size)?);
    let col_offset = to_i64(centered_offset(visible_cols, frame_size)?);
    let extent = checked_scale(to_i64(frame_size), cell_size, WHAT)?;
    let y = checked_scale(row_offset, cell_size, WHAT)?
        .checked_add(pane.y)
        .ok_or(GeometryError::Overflow { what: WHAT })?;
    let x = checked_scale(col_offset, cell_size, WHAT)?
        .checked_add(pane.x)
        .ok_or(GeometryError::Overflow { what: WHAT })?;

    let vertical = Rect::new(pane.x.saturating_sub(bar_width), y, bar_width, extent);
    let horizontal = Rect::new(x, pane.y.saturating_sub(bar_width), extent, bar_width);
    Ok((vertical, horizontal))
}

/// Band on a vertical scroll-bar track marking where the thumb must be for
/// the target to be inside the frame.
///
/// Returns `None` for an empty scroll range. The band is extended by the
/// thumb height so that it covers the whole thumb at either bound.
#[must_use]
pub fn scrollbar_target_band(
    window: &AcceptanceWindow,
    track: Rect,
    scroll_maximum: i64,
    thumb_height: i64,
) -> Option<Rect> {
    if scroll_maximum <= 0 {
        return None;
    }
    let ratio = track.height as f64 / scroll_maximum as f64;
    let y = (window.min() as f64 * ratio) as i64;
    let h = ((window.span() as f64 * ratio) as i64).saturating_add(thumb_height);
    Some(Rect::new(track.x, track.y.saturating_add(y), track.width, h))
}

fn checked_i64(value: usize, what: &'static str) -> Result<i64> {
    i64::try_from(value).map_err(|_| GeometryError::Overflow { what })
}

fn checked_scale(units: i64, unit: i64, what: &'static str) -> Result<i64> {
    units
        .checked_mul(unit)
        .ok_or(GeometryError::Overflow { what })
}
