#![forbid(unsafe_code)]

//! Core of the scrolltrial Scroll-Target Engine.
//!
//! Everything in this crate is pure or single-owner state; nothing spawns
//! threads.
//!
//! # Key Components
//!
//! - [`metrics`] - read-only document metrics ([`LineMetrics`], [`GridMetrics`])
//! - [`geometry`] - acceptance windows, character spans, indicator rectangles
//! - [`session`] - [`ScrollSession`] with clamped per-axis moves
//! - [`target`] - seedable [`TargetPicker`] with bounded rejection
//! - [`units`] - millimetre to scroll-unit conversion
//!
//! # Example
//!
//! ```
//! use scrolltrial_core::geometry::{acceptance_window_1d, is_inside_window};
//!
//! let window = acceptance_window_1d(3, 50, 67, 20).unwrap();
//! assert_eq!((window.min(), window.max()), (320, 360));
//! assert!(is_inside_window(340, &window));
//! ```

pub mod error;
pub mod geometry;
pub mod metrics;
pub mod session;
pub mod target;
pub mod units;

pub use error::{GeometryError, Result};
pub use geometry::{
    AcceptanceWindow, GridWindows, Rect, acceptance_window_1d, acceptance_window_2d,
    is_inside_2d, is_inside_window, line_char_span, scroll_unit,
};
pub use metrics::{AxisExtent, GridMetrics, LineMetrics, WrappedText};
pub use session::{Axis, ScrollOffsets, ScrollSession};
pub use target::{TargetPicker, reachable_line_range};
pub use units::{PixelDensity, UnitScale};
