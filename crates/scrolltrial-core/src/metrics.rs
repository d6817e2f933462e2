#![forbid(unsafe_code)]

//! Read-only document metrics supplied by the presentation layer.
//!
//! - [`LineMetrics`] describes a one-dimensional text buffer as a sequence of
//!   per-line character counts.
//! - [`GridMetrics`] describes a two-dimensional grid of equally sized cells.
//! - [`AxisExtent`] is the per-axis view of a grid that the geometry layer
//!   needs to derive scroll units.
//!
//! None of these types own text or widgets. They are built once at trial
//! setup and never mutated afterwards.

use crate::error::{GeometryError, Result};

// ---------------------------------------------------------------------------
// Line metrics (1D)
// ---------------------------------------------------------------------------

/// Per-line character counts of a one-dimensional text buffer.
///
/// The length of the sequence is the line count. Lines are separated by a
/// single newline that is *not* included in the count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineMetrics {
    counts: Vec<usize>,
}

impl LineMetrics {
    /// Build metrics from explicit per-line counts.
    #[must_use]
    pub fn from_counts(counts: Vec<usize>) -> Self {
        Self { counts }
    }

    /// Count the characters of every `\n`-separated line in `text`.
    ///
    /// Trailing empty lines are dropped and a trailing `\r` is not counted,
    /// so a file ending in a newline has as many lines as it has visible
    /// rows.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut counts: Vec<usize> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).chars().count())
            .collect();
        while counts.last() == Some(&0) {
            counts.pop();
        }
        Self { counts }
    }

    /// Number of lines.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.counts.len()
    }

    /// Whether the buffer has no lines at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Character count of line `index` (0-based).
    pub fn line_len(&self, index: usize) -> Result<usize> {
        self.counts
            .get(index)
            .copied()
            .ok_or_else(|| GeometryError::out_of_range(index, self.counts.len()))
    }

    /// Whether line `index` has no characters. Out-of-range lines count as
    /// blank so that target selection never lands on them.
    #[must_use]
    pub fn is_blank(&self, index: usize) -> bool {
        self.counts.get(index).is_none_or(|&len| len == 0)
    }

    /// Total characters including one separator between consecutive lines.
    #[must_use]
    pub fn total_chars(&self) -> usize {
        let chars: usize = self.counts.iter().sum();
        chars + self.counts.len().saturating_sub(1)
    }

    /// Per-line counts as a slice.
    #[inline]
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

// ---------------------------------------------------------------------------
// Word wrapping
// ---------------------------------------------------------------------------

/// Text re-flowed to a fixed maximum line width, with its metrics.
///
/// The highlight spans computed by the geometry layer refer to offsets in
/// [`WrappedText::text`], so callers must display exactly this text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedText {
    text: String,
    metrics: LineMetrics,
}

impl WrappedText {
    /// Greedy word wrap of `source` to at most `width` characters per line.
    ///
    /// Paragraph breaks (`\n`) are kept, empty paragraphs become blank lines
    /// and words longer than `width` are hard-split. A `width` of zero is
    /// treated as one.
    #[must_use]
    pub fn wrap(source: &str, width: usize) -> Self {
        let width = width.max(1);
        let mut lines: Vec<String> = Vec::new();

        for paragraph in source.lines() {
            let mut current = String::new();
            let mut current_len = 0usize;

            for word in paragraph.split_whitespace() {
                let mut word: Vec<char> = word.chars().collect();

                // Hard-split words that can never fit on one line.
                while word.len() > width {
                    if current_len > 0 {
                        lines.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    let rest = word.split_off(width);
                    lines.push(word.into_iter().collect());
                    word = rest;
                }

                let needed = if current_len == 0 {
                    word.len()
                } else {
                    current_len + 1 + word.len()
                };
                if needed > width && current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(word.iter());
                current_len += word.len();
            }

            // An empty paragraph still occupies one (blank) line.
            if current_len > 0 || paragraph.trim().is_empty() {
                lines.push(current);
            }
        }

        let metrics = LineMetrics::from_counts(lines.iter().map(|l| l.chars().count()).collect());
        Self {
            text: lines.join("\n"),
            metrics,
        }
    }

    /// The wrapped text, lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Metrics of the wrapped text.
    #[must_use]
    pub fn metrics(&self) -> &LineMetrics {
        &self.metrics
    }

    /// Split into owned parts.
    #[must_use]
    pub fn into_parts(self) -> (String, LineMetrics) {
        (self.text, self.metrics)
    }
}

// ---------------------------------------------------------------------------
// Grid metrics (2D)
// ---------------------------------------------------------------------------

/// One scrollable axis of a grid: how many units exist, how many are
/// visible, and the scroll maximum the toolkit reports for that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisExtent {
    /// Total rows (or columns) in the document.
    pub total: usize,
    /// Rows (or columns) visible in the viewport at once.
    pub visible: usize,
    /// Scroll-bar maximum for this axis, in scroll units.
    pub scroll_max: i64,
}

impl AxisExtent {
    /// Create an axis extent.
    #[must_use]
    pub const fn new(total: usize, visible: usize, scroll_max: i64) -> Self {
        Self {
            total,
            visible,
            scroll_max,
        }
    }
}

/// Dimensions of a two-dimensional cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridMetrics {
    total_rows: usize,
    total_cols: usize,
    visible_rows: usize,
    visible_cols: usize,
    cell_size: i64,
}

impl GridMetrics {
    /// Create grid metrics, enforcing `visible <= total` on both axes.
    pub fn new(
        total_rows: usize,
        total_cols: usize,
        visible_rows: usize,
        visible_cols: usize,
        cell_size: i64,
    ) -> Result<Self> {
        if visible_rows > total_rows {
            return Err(GeometryError::InvalidGrid {
                total: total_rows,
                visible: visible_rows,
            });
        }
        if visible_cols > total_cols {
            return Err(GeometryError::InvalidGrid {
                total: total_cols,
                visible: visible_cols,
            });
        }
        Ok(Self {
            total_rows,
            total_cols,
            visible_rows,
            visible_cols,
            cell_size,
        })
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    #[must_use]
    pub fn total_cols(&self) -> usize {
        self.total_cols
    }

    #[must_use]
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    #[must_use]
    pub fn visible_cols(&self) -> usize {
        self.visible_cols
    }

    /// Cell edge length in pixels.
    #[must_use]
    pub fn cell_size(&self) -> i64 {
        self.cell_size
    }

    /// Content size in pixels as `(width, height)`.
    #[must_use]
    pub fn content_size(&self) -> (i64, i64) {
        (
            to_i64(self.total_cols) * self.cell_size,
            to_i64(self.total_rows) * self.cell_size,
        )
    }

    /// Viewport size in pixels as `(width, height)`.
    #[must_use]
    pub fn viewport_size(&self) -> (i64, i64) {
        (
            to_i64(self.visible_cols) * self.cell_size,
            to_i64(self.visible_rows) * self.cell_size,
        )
    }

    /// Row axis with an explicit scroll maximum.
    #[must_use]
    pub fn rows(&self, scroll_max: i64) -> AxisExtent {
        AxisExtent::new(self.total_rows, self.visible_rows, scroll_max)
    }

    /// Column axis with an explicit scroll maximum.
    #[must_use]
    pub fn cols(&self, scroll_max: i64) -> AxisExtent {
        AxisExtent::new(self.total_cols, self.visible_cols, scroll_max)
    }

    /// Row axis whose scroll maximum is the full content height, which is
    /// what scroll bars report as their maximum.
    #[must_use]
    pub fn rows_from_content(&self) -> AxisExtent {
        self.rows(self.content_size().1)
    }

    /// Column axis whose scroll maximum is the full content width.
    #[must_use]
    pub fn cols_from_content(&self) -> AxisExtent {
        self.cols(self.content_size().0)
    }
}

#[inline]
pub(crate) fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_counts_chars_per_line() {
        let m = LineMetrics::from_text("abc\n\nhello\n");
        assert_eq!(m.counts(), &[3, 0, 5]);
        assert_eq!(m.line_count(), 3);
        assert_eq!(m.total_chars(), 3 + 0 + 5 + 2);
    }

    #[test]
    fn from_text_ignores_carriage_returns() {
        let m = LineMetrics::from_text("ab\r\ncd\r\n");
        assert_eq!(m.counts(), &[2, 2]);
    }

    #[test]
    fn from_text_counts_chars_not_bytes() {
        let m = LineMetrics::from_text("héllo");
        assert_eq!(m.counts(), &[5]);
    }

    #[test]
    fn line_len_out_of_range() {
        let m = LineMetrics::from_counts(vec![1, 2]);
        assert_eq!(m.line_len(1), Ok(2));
        assert_eq!(
            m.line_len(2),
            Err(GeometryError::OutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn blank_detection() {
        let m = LineMetrics::from_counts(vec![0, 4]);
        assert!(m.is_blank(0));
        assert!(!m.is_blank(1));
        assert!(m.is_blank(7));
    }

    #[test]
    fn wrap_respects_width() {
        let w = WrappedText::wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(w.metrics().counts().iter().all(|&c| c <= 10));
        assert_eq!(w.text().lines().next(), Some("the quick"));
        assert_eq!(w.metrics().line_count(), w.text().lines().count());
    }

    #[test]
    fn wrap_keeps_blank_paragraphs() {
        let w = WrappedText::wrap("one\n\ntwo", 20);
        assert_eq!(w.text(), "one\n\ntwo");
        assert_eq!(w.metrics().counts(), &[3, 0, 3]);
    }

    #[test]
    fn wrap_hard_splits_long_words() {
        let w = WrappedText::wrap("abcdefghij xy", 4);
        assert_eq!(w.text(), "abcd\nefgh\nij\nxy");
    }

    #[test]
    fn wrapped_metrics_match_text() {
        let w = WrappedText::wrap("Lorem ipsum dolor sit amet, consectetur adipiscing elit.", 12);
        let recount = LineMetrics::from_text(w.text());
        assert_eq!(&recount, w.metrics());
    }

    #[test]
    fn grid_rejects_visible_over_total() {
        assert_eq!(
            GridMetrics::new(10, 10, 11, 5, 20),
            Err(GeometryError::InvalidGrid {
                total: 10,
                visible: 11
            })
        );
    }

    #[test]
    fn grid_sizes() {
        let g = GridMetrics::new(1800, 200, 67, 50, 10).unwrap();
        assert_eq!(g.content_size(), (2000, 18000));
        assert_eq!(g.viewport_size(), (500, 670));
        assert_eq!(g.rows(4000), AxisExtent::new(1800, 67, 4000));
        assert_eq!(g.cols_from_content().scroll_max, 2000);
    }
}
