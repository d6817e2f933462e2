#![forbid(unsafe_code)]

//! Trial orchestration.
//!
//! [`TrialOrchestrator`] is the single owner of the scroll session. It picks
//! each trial's mode, technique, frame, and target, computes the acceptance
//! window(s) and indicator rectangles, and re-evaluates the "inside target"
//! predicate every time the offset changes.
//!
//! Continuous scrolling runs on the controller's tick thread, which only
//! sends [`ScrollMsg`]s. The orchestrator applies them on its own thread in
//! [`TrialOrchestrator::pump`], so the session is never shared.
//!
//! ```text
//!   command(RateBased) ─▶ controller ─▶ tick thread ─▶ ScrollMsg ─┐
//!                                                                 │ mpsc
//!   pump() ◀──────────────────────────────────────────────────────┘
//!     └─▶ session.move_by ─▶ evaluate ─▶ ScrollOutcome
//! ```

use scrolltrial_core::geometry::{
    frame_indicator_1d, frame_indicators_2d, line_char_span, scrollbar_target_band,
};
use scrolltrial_core::{
    AcceptanceWindow, Axis, GeometryError, GridWindows, LineMetrics, PixelDensity, Rect,
    ScrollOffsets, ScrollSession, TargetPicker, UnitScale, acceptance_window_1d,
    acceptance_window_2d, is_inside_2d, is_inside_window, reachable_line_range,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Instant;

use crate::config::{ConfigError, ExperimentConfig};
use crate::controller::{ContinuousScrollController, ControllerError, JobExit, ScrollCommand};
use crate::inject::{ChannelInjector, ScrollInbox, ScrollMsg, scroll_channel};

// ---------------------------------------------------------------------------
// Selection vocabulary
// ---------------------------------------------------------------------------

/// Document shape of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// Text pane, vertical only.
    OneDimensional,
    /// Cell grid, both axes.
    TwoDimensional,
}

/// Scrolling interaction under study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Direct drag / wheel moves.
    Drag,
    /// Constant-rate continuous scrolling.
    RateBased,
}

/// How modes and techniques are drawn across trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Independent uniform draw per trial.
    #[default]
    Uniform,
    /// Cycle through the configured list in order.
    Alternate,
}

// ---------------------------------------------------------------------------
// Trial data
// ---------------------------------------------------------------------------

/// Errors that abort trial setup or a trial operation.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("no trial is active")]
    NoActiveTrial,
    #[error("nothing to choose from in {0}")]
    EmptyChoice(&'static str),
}

/// What the participant must bring into the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 0-based line and its character span `(start, end)`.
    Line { index: usize, chars: (usize, usize) },
    /// 0-based grid cell.
    Cell { row: usize, col: usize },
}

/// Acceptance window(s) of the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetWindows {
    Line(AcceptanceWindow),
    Cell(GridWindows),
}

/// Outcome of the inside-target predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub inside_target: bool,
}

/// Result of applying scroll input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Whether any offset changed.
    pub moved: bool,
    pub offsets: ScrollOffsets,
    pub evaluation: Evaluation,
}

/// Timestamps collected during a trial. Opaque to the core; consumed by
/// whatever records results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialInstants {
    pub started: Instant,
    pub first_entry: Option<Instant>,
    pub last_entry: Option<Instant>,
    pub first_scroll: Option<Instant>,
    pub last_scroll: Option<Instant>,
    /// First time the offsets were inside the acceptance window(s).
    pub first_inside: Option<Instant>,
}

impl TrialInstants {
    fn new(started: Instant) -> Self {
        Self {
            started,
            first_entry: None,
            last_entry: None,
            first_scroll: None,
            last_scroll: None,
            first_inside: None,
        }
    }

    /// `last_entry` stays unset until a second entry.
    fn record_entry(&mut self, now: Instant) {
        if self.first_entry.is_some() {
            self.last_entry = Some(now);
        } else {
            self.first_entry = Some(now);
        }
    }

    /// `last_scroll` stays unset until a second scroll event.
    fn record_scroll(&mut self, now: Instant) {
        if self.first_scroll.is_some() {
            self.last_scroll = Some(now);
        } else {
            self.first_scroll = Some(now);
        }
    }
}

/// A fully prepared trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    /// 1-based trial number within the session.
    pub number: u32,
    pub mode: ScrollMode,
    pub technique: Technique,
    /// Frame size in lines or cells.
    pub frame: usize,
    pub target: Target,
    pub windows: TargetWindows,
    /// Pane placement on the display.
    pub pane: Rect,
    /// Frame indicator bars (one for 1D, vertical + horizontal for 2D).
    pub indicators: Vec<Rect>,
    /// Band on the vertical scroll-bar track marking the target.
    pub scrollbar_band: Option<Rect>,
}

/// Final state of a finished trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSummary {
    pub trial: Trial,
    pub instants: TrialInstants,
    pub offsets: ScrollOffsets,
    pub evaluation: Evaluation,
}

/// The inside-target predicate.
///
/// 1D trials look at the vertical offset only; 2D trials need both axes
/// inside at once.
#[must_use]
pub fn evaluate(offsets: ScrollOffsets, windows: &TargetWindows) -> Evaluation {
    let inside_target = match windows {
        TargetWindows::Line(window) => is_inside_window(offsets.vertical, window),
        TargetWindows::Cell(grid) => is_inside_2d(offsets.vertical, offsets.horizontal, grid),
    };
    Evaluation { inside_target }
}

fn to_px(count: usize, unit: i64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX).saturating_mul(unit)
}

struct Active {
    trial: Trial,
    instants: TrialInstants,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the session, the controller, and the trial sequence.
pub struct TrialOrchestrator {
    config: ExperimentConfig,
    document: LineMetrics,
    density: PixelDensity,
    picker: TargetPicker,
    session: ScrollSession,
    controller: ContinuousScrollController<ChannelInjector>,
    inbox: ScrollInbox,
    active: Option<Active>,
    trials_started: u32,
    cursor_inside: bool,
    wheel_axis: Axis,
}

impl TrialOrchestrator {
    /// Orchestrator for `document` (used by 1D trials).
    ///
    /// The configuration is validated first.
    pub fn new(config: ExperimentConfig, document: LineMetrics) -> Result<Self, TrialError> {
        let config = config.validated()?;
        let picker = TargetPicker::new(config.selection.seed)
            .with_max_attempts(config.selection.max_attempts);
        let (injector, inbox) = scroll_channel();
        let controller =
            ContinuousScrollController::new(injector).with_tick_period(config.controller.tick_period());
        Ok(Self {
            density: config.units.density(),
            config,
            document,
            picker,
            session: ScrollSession::vertical(0, 0),
            controller,
            inbox,
            active: None,
            trials_started: 0,
            cursor_inside: false,
            wheel_axis: Axis::Vertical,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    #[must_use]
    pub fn document(&self) -> &LineMetrics {
        &self.document
    }

    #[must_use]
    pub fn session(&self) -> &ScrollSession {
        &self.session
    }

    #[must_use]
    pub fn offsets(&self) -> ScrollOffsets {
        self.session.offsets()
    }

    /// The active trial, if any.
    #[must_use]
    pub fn trial(&self) -> Option<&Trial> {
        self.active.as_ref().map(|a| &a.trial)
    }

    /// Timestamps of the active trial.
    #[must_use]
    pub fn instants(&self) -> Option<&TrialInstants> {
        self.active.as_ref().map(|a| &a.instants)
    }

    /// The continuous-scroll controller (for state and stats).
    pub fn controller_mut(&mut self) -> &mut ContinuousScrollController<ChannelInjector> {
        &mut self.controller
    }

    #[must_use]
    pub fn trials_started(&self) -> u32 {
        self.trials_started
    }

    /// Axis that wheel messages scroll.
    #[must_use]
    pub fn wheel_axis(&self) -> Axis {
        self.wheel_axis
    }

    pub fn set_wheel_axis(&mut self, axis: Axis) {
        self.wheel_axis = axis;
    }

    /// Mode for the next trial.
    pub fn pick_mode(&mut self) -> Result<ScrollMode, TrialError> {
        let index = self.trials_started as usize;
        let modes = &self.config.selection.modes;
        pick_by_policy(self.config.selection.policy, &mut self.picker, modes, index)
            .ok_or(TrialError::EmptyChoice("selection.modes"))
    }

    /// Technique for the next trial.
    pub fn pick_technique(&mut self) -> Result<Technique, TrialError> {
        let index = self.trials_started as usize;
        let techniques = &self.config.selection.techniques;
        pick_by_policy(self.config.selection.policy, &mut self.picker, techniques, index)
            .ok_or(TrialError::EmptyChoice("selection.techniques"))
    }

    /// Prepare the next trial: stop any continuous scroll, draw mode,
    /// technique, frame, and target, and reset the session to the origin.
    ///
    /// Any geometry error aborts setup and leaves no trial active.
    pub fn begin_trial(&mut self) -> Result<Trial, TrialError> {
        self.controller.stop();
        self.inbox.drain();
        self.active = None;

        let mode = self.pick_mode()?;
        let technique = self.pick_technique()?;
        let number = self.trials_started + 1;
        let _span = tracing::info_span!("trial", number, ?mode, ?technique).entered();

        let trial = match mode {
            ScrollMode::OneDimensional => self.prepare_line_trial(number, technique)?,
            ScrollMode::TwoDimensional => self.prepare_cell_trial(number, technique)?,
        };

        self.trials_started = number;
        self.cursor_inside = false;
        self.wheel_axis = Axis::Vertical;
        tracing::info!(
            target: "scrolltrial.trial",
            frame = trial.frame,
            goal = ?trial.target,
            windows = ?trial.windows,
            pane = ?trial.pane,
            "trial started"
        );
        self.active = Some(Active {
            trial: trial.clone(),
            instants: TrialInstants::new(Instant::now()),
        });
        Ok(trial)
    }

    fn prepare_line_trial(&mut self, number: u32, technique: Technique) -> Result<Trial, TrialError> {
        let v = &self.config.vertical;
        let frame = *self
            .picker
            .choose(&v.frame_sizes)
            .ok_or(TrialError::EmptyChoice("vertical.frame_sizes"))?;

        let line_count = self.document.line_count();
        let (lo, hi) = reachable_line_range(v.visible_lines, frame, line_count)?;
        let index = self.picker.pick_line(lo, hi, &self.document)?;
        let chars = line_char_span(index, &self.document)?;
        let window = acceptance_window_1d(frame, index, v.visible_lines, v.line_height_px)?;

        let content = to_px(line_count, v.line_height_px);
        let viewport = to_px(v.visible_lines, v.line_height_px);
        let session = ScrollSession::vertical(content, viewport);

        let (pane_width, visible, line_height) = (v.pane_width_px, v.visible_lines, v.line_height_px);
        let pane = self.place_pane(pane_width, viewport);
        let bar = self.indicator_width();
        let indicator = frame_indicator_1d(pane, visible, frame, line_height, bar)?;
        let band = self.scrollbar_band(&window, pane, bar, &session, content);

        self.session = session;
        Ok(Trial {
            number,
            mode: ScrollMode::OneDimensional,
            technique,
            frame,
            target: Target::Line { index, chars },
            windows: TargetWindows::Line(window),
            pane,
            indicators: vec![indicator],
            scrollbar_band: band,
        })
    }

    fn prepare_cell_trial(&mut self, number: u32, technique: Technique) -> Result<Trial, TrialError> {
        let g = &self.config.grid;
        let frame = *self
            .picker
            .choose(&g.frame_sizes)
            .ok_or(TrialError::EmptyChoice("grid.frame_sizes"))?;
        let grid = g.metrics()?;
        let (rows, cols) = g.extents()?;

        let (row_lo, row_hi) = reachable_line_range(rows.visible, frame, rows.total)?;
        let (col_lo, col_hi) = reachable_line_range(cols.visible, frame, cols.total)?;
        let row = self.picker.pick(row_lo, row_hi, &[])?;
        let col = self.picker.pick(col_lo, col_hi, &[])?;
        let windows = acceptance_window_2d(frame, row, col, rows, cols)?;

        // Offsets live in scroll-bar units so they compare directly with the
        // windows, whatever the configured scroll maxima are.
        let (view_w, view_h) = grid.viewport_size();
        let session = ScrollSession::grid(
            (cols.scroll_max + view_w, rows.scroll_max + view_h),
            (view_w, view_h),
        );

        let pane = self.place_pane(view_w, view_h);
        let bar = self.indicator_width();
        let (vertical, horizontal) = frame_indicators_2d(
            pane,
            grid.visible_rows(),
            grid.visible_cols(),
            frame,
            grid.cell_size(),
            bar,
        )?;
        let band = self.scrollbar_band(&windows.rows, pane, bar, &session, rows.scroll_max + view_h);

        self.session = session;
        Ok(Trial {
            number,
            mode: ScrollMode::TwoDimensional,
            technique,
            frame,
            target: Target::Cell { row, col },
            windows: TargetWindows::Cell(windows),
            pane,
            indicators: vec![vertical, horizontal],
            scrollbar_band: band,
        })
    }

    /// Random horizontal placement inside the margins, vertically centered.
    /// Falls back to the origin when the pane does not fit.
    fn place_pane(&mut self, width: i64, height: i64) -> Rect {
        let screen = &self.config.display;
        let margin = self.density.to_units(screen.margin_mm);
        let min_x = margin;
        let max_x = screen.width_px - (margin + width);
        if min_x >= max_x {
            tracing::warn!(
                target: "scrolltrial.trial",
                width,
                display_width = screen.width_px,
                "pane does not fit between the margins; placing at origin"
            );
            return Rect::new(0, 0, width, height);
        }
        let y = (screen.height_px - height) / 2;
        let x = self.picker.coordinate(min_x, max_x);
        Rect::new(x, y, width, height)
    }

    fn indicator_width(&self) -> i64 {
        self.density.to_units(self.config.display.indicator_mm).max(1)
    }

    /// Target band on a track drawn right of the pane. The thumb is sized
    /// in proportion to the visible share of the content.
    fn scrollbar_band(
        &self,
        window: &AcceptanceWindow,
        pane: Rect,
        bar: i64,
        session: &ScrollSession,
        content: i64,
    ) -> Option<Rect> {
        let track = Rect::new(pane.right(), pane.y, bar, pane.height);
        let thumb = if content > 0 {
            (pane.height.saturating_mul(pane.height) / content).max(1)
        } else {
            pane.height
        };
        scrollbar_target_band(window, track, session.max_offset(Axis::Vertical), thumb)
    }

    /// Record the cursor entering the pane.
    pub fn cursor_entered(&mut self) {
        self.cursor_inside = true;
        if let Some(active) = self.active.as_mut() {
            active.instants.record_entry(Instant::now());
        }
        tracing::debug!(target: "scrolltrial.trial", "cursor entered pane");
    }

    /// Record the cursor leaving the pane. With the cursor gate enabled this
    /// also stops continuous scrolling.
    pub fn cursor_exited(&mut self) {
        self.cursor_inside = false;
        if self.config.controller.require_cursor_inside {
            self.controller.stop();
        }
        tracing::debug!(target: "scrolltrial.trial", "cursor exited pane");
    }

    #[must_use]
    pub fn is_cursor_inside(&self) -> bool {
        self.cursor_inside
    }

    fn scrolling_allowed(&self) -> bool {
        !self.config.controller.require_cursor_inside || self.cursor_inside
    }

    /// Apply a direct move of `delta` scroll units.
    pub fn scroll(&mut self, axis: Axis, delta: i64) -> Result<ScrollOutcome, TrialError> {
        if self.active.is_none() {
            return Err(TrialError::NoActiveTrial);
        }
        let moved = self.scrolling_allowed() && self.apply(axis, delta);
        self.outcome(moved)
    }

    /// Apply a move given in millimetres on both axes.
    pub fn scroll_mm(&mut self, vertical_mm: f64, horizontal_mm: f64) -> Result<ScrollOutcome, TrialError> {
        if self.active.is_none() {
            return Err(TrialError::NoActiveTrial);
        }
        let mut moved = false;
        if self.scrolling_allowed() {
            let horizontal = self.density.to_units(horizontal_mm);
            let vertical = self.density.to_units(vertical_mm);
            moved |= horizontal != 0 && self.apply(Axis::Horizontal, horizontal);
            moved |= vertical != 0 && self.apply(Axis::Vertical, vertical);
        }
        self.outcome(moved)
    }

    /// Dispatch a controller command, then apply whatever it has produced.
    pub fn command(&mut self, command: ScrollCommand) -> Result<ScrollOutcome, TrialError> {
        if self.active.is_none() {
            return Err(TrialError::NoActiveTrial);
        }
        if self.scrolling_allowed() || command == ScrollCommand::Stop {
            self.controller.perform(command)?;
        }
        self.pump()
    }

    /// Drain pending wheel messages into the session.
    pub fn pump(&mut self) -> Result<ScrollOutcome, TrialError> {
        if self.active.is_none() {
            return Err(TrialError::NoActiveTrial);
        }
        if let Some(JobExit::Failed { error, .. }) = self.controller.poll() {
            tracing::warn!(target: "scrolltrial.trial", %error, "continuous scroll ended with an error");
        }
        let step = self.config.controller.wheel_step_px;
        let allowed = self.scrolling_allowed();
        let mut moved = false;
        for msg in self.inbox.drain() {
            let ScrollMsg::Wheel { delta } = msg;
            if allowed {
                moved |= self.apply(self.wheel_axis, delta.saturating_mul(step));
            }
        }
        self.outcome(moved)
    }

    /// Current evaluation of the active trial.
    pub fn evaluate_current(&self) -> Result<Evaluation, TrialError> {
        let active = self.active.as_ref().ok_or(TrialError::NoActiveTrial)?;
        Ok(evaluate(self.session.offsets(), &active.trial.windows))
    }

    /// Stop scrolling and close the active trial.
    pub fn finish_trial(&mut self) -> Result<TrialSummary, TrialError> {
        self.controller.stop();
        self.pump()?;
        let active = self.active.take().ok_or(TrialError::NoActiveTrial)?;
        let offsets = self.session.offsets();
        let evaluation = evaluate(offsets, &active.trial.windows);
        tracing::info!(
            target: "scrolltrial.trial",
            number = active.trial.number,
            inside_target = evaluation.inside_target,
            vertical = offsets.vertical,
            horizontal = offsets.horizontal,
            "trial finished"
        );
        Ok(TrialSummary {
            trial: active.trial,
            instants: active.instants,
            offsets,
            evaluation,
        })
    }

    /// Move one axis, timestamp the event, and note the first time the
    /// target is inside the frame.
    fn apply(&mut self, axis: Axis, delta: i64) -> bool {
        let moved = self.session.move_by(axis, delta);
        let offsets = self.session.offsets();
        if let Some(active) = self.active.as_mut() {
            let now = Instant::now();
            active.instants.record_scroll(now);
            if active.instants.first_inside.is_none()
                && evaluate(offsets, &active.trial.windows).inside_target
            {
                active.instants.first_inside = Some(now);
                tracing::info!(
                    target: "scrolltrial.trial",
                    number = active.trial.number,
                    elapsed_ms = now.duration_since(active.instants.started).as_millis() as u64,
                    "target reached"
                );
            }
        }
        moved
    }

    fn outcome(&self, moved: bool) -> Result<ScrollOutcome, TrialError> {
        Ok(ScrollOutcome {
            moved,
            offsets: self.session.offsets(),
            evaluation: self.evaluate_current()?,
        })
    }
}

impl std::fmt::Debug for TrialOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialOrchestrator")
            .field("trials_started", &self.trials_started)
            .field("trial", &self.trial())
            .field("offsets", &self.session.offsets())
            .field("controller", &self.controller)
            .finish()
    }
}

fn pick_by_policy<T: Copy>(
    policy: SelectionPolicy,
    picker: &mut TargetPicker,
    items: &[T],
    index: usize,
) -> Option<T> {
    match policy {
        SelectionPolicy::Uniform => picker.choose(items).copied(),
        SelectionPolicy::Alternate => {
            if items.is_empty() {
                None
            } else {
                Some(items[index % items.len()])
            }
        }
    }
}
