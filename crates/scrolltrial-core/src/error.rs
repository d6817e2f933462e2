#![forbid(unsafe_code)]

//! Error model for the geometry layer.
//!
//! Every variant here is a caller contract violation. Trial setup should
//! abort on these rather than clamp.

use thiserror::Error;

/// Standard result type for scrolltrial-core APIs.
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Geometry, metrics, and target-selection errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// An index fell outside `[0, count)` (or an empty/inverted range was given).
    #[error("index {index} out of range (count = {count})")]
    OutOfRange { index: i64, count: usize },

    /// The frame is empty or larger than the visible extent.
    #[error("frame of {frame} units does not fit in {visible} visible units")]
    InvalidFrame { frame: usize, visible: usize },

    /// Total extent equals visible extent, so there is nothing to scroll and
    /// the per-unit scroll value would divide by zero.
    #[error("degenerate extent: total {total} equals visible {visible}")]
    DegenerateExtent { total: usize, visible: usize },

    /// The scroll maximum is smaller than the number of scrollable units,
    /// so one unit would scroll by zero and every window would collapse.
    #[error(
        "scroll maximum {scroll_max} is below the {scrollable} scrollable units \
         (total {total}, visible {visible})"
    )]
    ZeroScrollUnit {
        total: usize,
        visible: usize,
        scrollable: usize,
        scroll_max: i64,
    },

    /// Scroll arithmetic left the `i64` range.
    #[error("{what} overflows the scroll range")]
    Overflow { what: &'static str },

    /// Grid dimensions violate `visible <= total`.
    #[error("visible extent {visible} exceeds total extent {total}")]
    InvalidGrid { total: usize, visible: usize },

    /// Target selection rejected every candidate within the retry budget.
    #[error("no valid target in [{min}, {max}] after {attempts} attempts")]
    NoValidTarget {
        min: usize,
        max: usize,
        attempts: u32,
    },
}

impl GeometryError {
    /// Build an [`GeometryError::OutOfRange`] from unsigned parts.
    #[must_use]
    pub fn out_of_range(index: usize, count: usize) -> Self {
        Self::OutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            count,
        }
    }
}
