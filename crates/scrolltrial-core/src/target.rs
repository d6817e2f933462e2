#![forbid(unsafe_code)]

//! Random target selection.
//!
//! [`TargetPicker`] draws uniformly from an inclusive index range. Rejection
//! (excluded indices, blank lines, any caller predicate) is retried a bounded
//! number of times; a range with no acceptable index fails with
//! [`GeometryError::NoValidTarget`] instead of spinning forever.
//!
//! Pickers are seedable so a whole session of trials can be replayed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{GeometryError, Result};
use crate::geometry::centered_offset;
use crate::metrics::{LineMetrics, to_i64};

/// Default rejection budget per draw.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Seedable uniform index picker with bounded rejection sampling.
#[derive(Debug, Clone)]
pub struct TargetPicker {
    rng: SmallRng,
    max_attempts: u32,
}

impl TargetPicker {
    /// Deterministic picker.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Picker seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Seeded when `seed` is given, otherwise from entropy.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Override the rejection budget (at least one attempt is always made).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Uniform draw over `[min, max]`, retrying while `accept` says no.
    pub fn pick_where(
        &mut self,
        min: usize,
        max: usize,
        mut accept: impl FnMut(usize) -> bool,
    ) -> Result<usize> {
        if min > max {
            return Err(GeometryError::out_of_range(min, max.saturating_add(1)));
        }
        for _ in 0..self.max_attempts {
            let candidate = self.rng.random_range(min..=max);
            if accept(candidate) {
                return Ok(candidate);
            }
        }
        tracing::warn!(
            target: "scrolltrial.target",
            min,
            max,
            attempts = self.max_attempts,
            "target selection exhausted its retry budget"
        );
        Err(GeometryError::NoValidTarget {
            min,
            max,
            attempts: self.max_attempts,
        })
    }

    /// Uniform draw over `[min, max]` skipping every index in `exclude`.
    pub fn pick(&mut self, min: usize, max: usize, exclude: &[usize]) -> Result<usize> {
        self.pick_where(min, max, |i| !exclude.contains(&i))
    }

    /// Uniform draw of a non-blank line in `[min, max]` (0-based).
    pub fn pick_line(&mut self, min: usize, max: usize, metrics: &LineMetrics) -> Result<usize> {
        if max >= metrics.line_count() {
            return Err(GeometryError::out_of_range(max, metrics.line_count()));
        }
        self.pick_where(min, max, |i| !metrics.is_blank(i))
    }

    /// Uniform draw over `[min, max]` for signed coordinates.
    ///
    /// Returns `min` when the range is empty or inverted.
    pub fn coordinate(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    /// Uniform choice from `items`.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..items.len());
        items.get(index)
    }
}

/// 0-based line indices whose acceptance window intersects the scrollable
/// range `[0, (line_count - visible) * unit]`, i.e. targets a participant
/// can actually bring into the frame.
pub fn reachable_line_range(
    visible: usize,
    frame: usize,
    line_count: usize,
) -> Result<(usize, usize)> {
    let offset = centered_offset(visible, frame)?;
    let scroll_lines = (to_i64(line_count) - to_i64(visible)).max(0);
    let last = scroll_lines + to_i64(offset) + to_i64(frame) - 1;
    let last = last.min(to_i64(line_count) - 1);
    if last < to_i64(offset) {
        return Err(GeometryError::out_of_range(offset, line_count));
    }
    let last = usize::try_from(last).map_err(|_| GeometryError::out_of_range(offset, line_count))?;
    Ok((offset, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::acceptance_window_1d;

    #[test]
    fn seeded_pickers_repeat() {
        let mut a = TargetPicker::seeded(7);
        let mut b = TargetPicker::seeded(7);
        let xs: Vec<_> = (0..32).map(|_| a.pick(1, 100, &[]).unwrap()).collect();
        let ys: Vec<_> = (0..32).map(|_| b.pick(1, 100, &[]).unwrap()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn single_value_range() {
        let mut p = TargetPicker::seeded(1);
        assert_eq!(p.pick(5, 5, &[]), Ok(5));
    }

    #[test]
    fn exclusions_are_honored() {
        let mut p = TargetPicker::seeded(3);
        for _ in 0..200 {
            let v = p.pick(1, 4, &[2, 3]).unwrap();
            assert!(v == 1 || v == 4);
        }
    }

    #[test]
    fn inverted_range_is_out_of_range() {
        let mut p = TargetPicker::seeded(3);
        assert!(matches!(
            p.pick(10, 2, &[]),
            Err(GeometryError::OutOfRange { .. })
        ));
    }

    #[test]
    fn all_rejected_fails_instead_of_looping() {
        let mut p = TargetPicker::seeded(3).with_max_attempts(50);
        assert_eq!(
            p.pick(1, 3, &[1, 2, 3]),
            Err(GeometryError::NoValidTarget {
                min: 1,
                max: 3,
                attempts: 50
            })
        );
    }

    #[test]
    fn blank_lines_are_never_targets() {
        let metrics = LineMetrics::from_counts(vec![0, 12, 0, 0, 7, 0]);
        let mut p = TargetPicker::seeded(11);
        for _ in 0..200 {
            let line = p.pick_line(0, 5, &metrics).unwrap();
            assert!(line == 1 || line == 4);
        }
    }

    #[test]
    fn pick_line_checks_range_against_metrics() {
        let metrics = LineMetrics::from_counts(vec![3, 3]);
        let mut p = TargetPicker::seeded(11);
        assert_eq!(
            p.pick_line(0, 2, &metrics),
            Err(GeometryError::OutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn choose_covers_items() {
        let mut p = TargetPicker::seeded(5);
        let items = ["a", "b"];
        let mut seen = [false; 2];
        for _ in 0..100 {
            match *p.choose(&items).unwrap() {
                "a" => seen[0] = true,
                _ => seen[1] = true,
            }
        }
        assert_eq!(seen, [true, true]);
        assert_eq!(p.choose::<u8>(&[]), None);
    }

    #[test]
    fn coordinate_handles_empty_range() {
        let mut p = TargetPicker::seeded(5);
        assert_eq!(p.coordinate(40, 40), 40);
        assert_eq!(p.coordinate(40, 10), 40);
        let c = p.coordinate(-5, 5);
        assert!((-5..=5).contains(&c));
    }

    #[test]
    fn reachable_range_bounds_have_reachable_windows() {
        let (visible, frame, lines, unit) = (67, 3, 500, 20);
        let (lo, hi) = reachable_line_range(visible, frame, lines).unwrap();
        assert_eq!(lo, 32);
        let max_scroll = (lines as i64 - visible as i64) * unit;
        let first = acceptance_window_1d(frame, lo, visible, unit).unwrap();
        let last = acceptance_window_1d(frame, hi, visible, unit).unwrap();
        assert!(first.contains(0));
        assert!(last.contains(max_scroll));
        let beyond = acceptance_window_1d(frame, hi + 1, visible, unit).unwrap();
        assert!(beyond.min() > max_scroll);
        let before = acceptance_window_1d(frame, lo - 1, visible, unit).unwrap();
        assert!(before.max() < 0);
    }

    #[test]
    fn reachable_range_for_short_document() {
        // Everything fits: only the lines inside the frame at offset 0.
        assert_eq!(reachable_line_range(10, 3, 4), Ok((3, 3)));
    }
}
