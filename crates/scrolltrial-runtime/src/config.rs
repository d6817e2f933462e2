#![forbid(unsafe_code)]

//! Experiment configuration.
//!
//! Every tunable of a session (document viewport, grid, controller timing,
//! selection policy, display and unit scaling) lives in one
//! [`ExperimentConfig`] loaded from TOML (or JSON) at startup.
//!
//! # Loading
//!
//! ```toml
//! # scrolltrial.toml
//! [vertical]
//! visible_lines = 67
//! frame_sizes = [3, 5]
//!
//! [grid]
//! total_rows = 1800
//! row_scroll_max = 4000
//!
//! [controller]
//! tick_period_ms = 1
//!
//! [selection]
//! policy = "alternate"
//! seed = 42
//!
//! [log]
//! level = "scrolltrial.trial=debug,info"
//! format = "json"
//! ```
//!
//! ```rust,ignore
//! let config = ExperimentConfig::load("scrolltrial.toml")?;
//! ```
//!
//! # Defaults
//!
//! Every field has a default, so an empty file is a valid configuration.
//! The defaults describe the reference setup: a 67-line text pane with
//! 20 px lines and a 1800 x 1800 grid of 10 px cells.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scrolltrial_core::target::DEFAULT_MAX_ATTEMPTS;
use scrolltrial_core::{AxisExtent, GeometryError, GridMetrics, PixelDensity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogConfig;
use crate::orchestrator::{ScrollMode, SelectionPolicy, Technique};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Complete configuration of an experiment session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Text pane (1D trials).
    pub vertical: VerticalConfig,
    /// Cell grid (2D trials).
    pub grid: GridConfig,
    /// Continuous-scroll controller.
    pub controller: ControllerConfig,
    /// Mode, technique, and target selection.
    pub selection: SelectionConfig,
    /// Screen area the pane is placed in.
    pub display: DisplayConfig,
    /// Millimetre conversion.
    pub units: UnitsConfig,
    /// Log filter and format.
    pub log: LogConfig,
}

impl ExperimentConfig {
    /// Parse from a TOML string (not validated).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse a TOML file (not validated).
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse from a JSON string (not validated).
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_toml_file(path)?.validated()?;
        tracing::info!(target: "scrolltrial.config", path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `self` if [`validate`](Self::validate) finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Check every parameter. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let v = &self.vertical;
        if v.visible_lines == 0 {
            errors.push("vertical.visible_lines must be > 0".into());
        }
        if v.line_height_px <= 0 {
            errors.push(format!(
                "vertical.line_height_px must be > 0, got {}",
                v.line_height_px
            ));
        }
        if v.wrap_width == 0 {
            errors.push("vertical.wrap_width must be > 0".into());
        }
        if v.pane_width_px <= 0 {
            errors.push(format!(
                "vertical.pane_width_px must be > 0, got {}",
                v.pane_width_px
            ));
        }
        check_frames("vertical.frame_sizes", &v.frame_sizes, v.visible_lines, &mut errors);

        let g = &self.grid;
        for (name, total, visible) in [
            ("rows", g.total_rows, g.visible_rows),
            ("cols", g.total_cols, g.visible_cols),
        ] {
            if visible == 0 {
                errors.push(format!("grid.visible_{name} must be > 0"));
            }
            if visible >= total {
                errors.push(format!(
                    "grid.visible_{name} ({visible}) must be < grid.total_{name} ({total})"
                ));
            }
        }
        if g.cell_size_px <= 0 {
            errors.push(format!(
                "grid.cell_size_px must be > 0, got {}",
                g.cell_size_px
            ));
        }
        for (name, max, total, visible) in [
            ("row_scroll_max", g.row_scroll_max, g.total_rows, g.visible_rows),
            ("col_scroll_max", g.col_scroll_max, g.total_cols, g.visible_cols),
        ] {
            let Some(max) = max else { continue };
            let scrollable = total.saturating_sub(visible);
            if max <= 0 {
                errors.push(format!("grid.{name} must be > 0, got {max}"));
            } else if usize::try_from(max).is_ok_and(|m| m < scrollable) {
                // Below one scroll unit per row/column every window collapses.
                errors.push(format!(
                    "grid.{name} ({max}) must be >= total - visible ({scrollable})"
                ));
            }
        }
        check_frames(
            "grid.frame_sizes",
            &g.frame_sizes,
            g.visible_rows.min(g.visible_cols),
            &mut errors,
        );

        let c = &self.controller;
        if c.tick_period_ms == 0 {
            errors.push("controller.tick_period_ms must be > 0".into());
        }
        if c.rate_delta == 0 {
            errors.push("controller.rate_delta must be != 0".into());
        }
        if c.wheel_step_px <= 0 {
            errors.push(format!(
                "controller.wheel_step_px must be > 0, got {}",
                c.wheel_step_px
            ));
        }

        let s = &self.selection;
        if s.modes.is_empty() {
            errors.push("selection.modes must not be empty".into());
        }
        if s.techniques.is_empty() {
            errors.push("selection.techniques must not be empty".into());
        }
        if s.max_attempts == 0 {
            errors.push("selection.max_attempts must be > 0".into());
        }

        let d = &self.display;
        if d.width_px <= 0 || d.height_px <= 0 {
            errors.push(format!(
                "display size must be positive, got {}x{}",
                d.width_px, d.height_px
            ));
        }
        if !(d.margin_mm >= 0.0 && d.margin_mm.is_finite()) {
            errors.push(format!("display.margin_mm must be >= 0, got {}", d.margin_mm));
        }
        if !(d.indicator_mm > 0.0 && d.indicator_mm.is_finite()) {
            errors.push(format!(
                "display.indicator_mm must be > 0, got {}",
                d.indicator_mm
            ));
        }

        if !(self.units.px_per_mm > 0.0 && self.units.px_per_mm.is_finite()) {
            errors.push(format!(
                "units.px_per_mm must be > 0, got {}",
                self.units.px_per_mm
            ));
        }

        errors
    }
}

fn check_frames(field: &str, frames: &[usize], visible: usize, errors: &mut Vec<String>) {
    if frames.is_empty() {
        errors.push(format!("{field} must not be empty"));
    }
    for &frame in frames {
        if frame == 0 || frame > visible {
            errors.push(format!(
                "{field}: frame {frame} must be in 1..={visible}"
            ));
        } else if frame % 2 == 0 {
            errors.push(format!("{field}: frame {frame} must be odd"));
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Text pane parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalConfig {
    /// Lines visible in the viewport.
    pub visible_lines: usize,
    /// Height of one line in pixels (the scroll value of one line).
    pub line_height_px: i64,
    /// Wrap width in characters when loading raw text.
    pub wrap_width: usize,
    /// Pane width in pixels.
    pub pane_width_px: i64,
    /// Frame sizes to draw from.
    pub frame_sizes: Vec<usize>,
    /// Text document to load; a generated document is used when absent.
    pub text_file: Option<PathBuf>,
}

impl Default for VerticalConfig {
    fn default() -> Self {
        Self {
            visible_lines: 67,
            line_height_px: 20,
            wrap_width: 70,
            pane_width_px: 600,
            frame_sizes: vec![3],
            text_file: None,
        }
    }
}

/// Grid parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub total_rows: usize,
    pub total_cols: usize,
    pub visible_rows: usize,
    pub visible_cols: usize,
    /// Cell edge in pixels.
    pub cell_size_px: i64,
    /// Frame sizes to draw from.
    pub frame_sizes: Vec<usize>,
    /// Vertical scroll maximum; defaults to the scrollable content height.
    pub row_scroll_max: Option<i64>,
    /// Horizontal scroll maximum; defaults to the scrollable content width.
    pub col_scroll_max: Option<i64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            total_rows: 1800,
            total_cols: 1800,
            visible_rows: 67,
            visible_cols: 67,
            cell_size_px: 10,
            frame_sizes: vec![5],
            row_scroll_max: None,
            col_scroll_max: None,
        }
    }
}

impl GridConfig {
    /// Validated grid metrics.
    pub fn metrics(&self) -> Result<GridMetrics, GeometryError> {
        GridMetrics::new(
            self.total_rows,
            self.total_cols,
            self.visible_rows,
            self.visible_cols,
            self.cell_size_px,
        )
    }

    /// Row and column extents, filling unset scroll maxima from the
    /// scrollable content size.
    pub fn extents(&self) -> Result<(AxisExtent, AxisExtent), GeometryError> {
        let grid = self.metrics()?;
        let (content_w, content_h) = grid.content_size();
        let (view_w, view_h) = grid.viewport_size();
        let rows = grid.rows(self.row_scroll_max.unwrap_or(content_h - view_h));
        let cols = grid.cols(self.col_scroll_max.unwrap_or(content_w - view_w));
        Ok((rows, cols))
    }
}

/// Continuous-scroll controller parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Tick period in milliseconds.
    pub tick_period_ms: u64,
    /// Wheel notches injected per tick in rate-based mode.
    pub rate_delta: i64,
    /// Pixels scrolled per wheel notch.
    pub wheel_step_px: i64,
    /// Ignore scrolling while the cursor is outside the pane.
    pub require_cursor_inside: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1,
            rate_delta: 1,
            wheel_step_px: 10,
            require_cursor_inside: false,
        }
    }
}

impl ControllerConfig {
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

/// Trial selection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub policy: SelectionPolicy,
    pub modes: Vec<ScrollMode>,
    pub techniques: Vec<Technique>,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
    /// Rejection budget per target draw.
    pub max_attempts: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Uniform,
            modes: vec![ScrollMode::OneDimensional, ScrollMode::TwoDimensional],
            techniques: vec![Technique::Drag, Technique::RateBased],
            seed: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Display area the pane is placed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width_px: i64,
    pub height_px: i64,
    /// Left/right margin kept free when placing the pane.
    pub margin_mm: f64,
    /// Thickness of the frame indicator bars.
    pub indicator_mm: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width_px: 1920,
            height_px: 1080,
            margin_mm: 20.0,
            indicator_mm: 3.0,
        }
    }
}

/// Unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    pub px_per_mm: f64,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            px_per_mm: PixelDensity::default().px_per_mm(),
        }
    }
}

impl UnitsConfig {
    #[must_use]
    pub fn density(&self) -> PixelDensity {
        PixelDensity::from_px_per_mm(self.px_per_mm)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
