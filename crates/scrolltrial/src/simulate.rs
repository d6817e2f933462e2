#![forbid(unsafe_code)]

//! Scripted participant.
//!
//! Runs trials end to end against a [`TrialOrchestrator`]: the simulated
//! participant enters the pane, scrolls toward the target with the trial's
//! technique, corrects any remaining distance with a direct move, and
//! finishes the trial. Useful for exercising the whole engine without a
//! display.

use std::time::Duration;

use scrolltrial_core::{AcceptanceWindow, Axis};
use scrolltrial_runtime::{
    ScrollCommand, ScrollMode, TargetWindows, Technique, Trial, TrialOrchestrator, TrialSummary,
};
use serde::Serialize;
use web_time::Instant;

use crate::error::Result;

/// How many trials to run and how long each approach may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    pub trials: u32,
    /// Per-axis budget for a rate-based approach.
    pub approach_timeout: Duration,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            trials: 10,
            approach_timeout: Duration::from_secs(5),
        }
    }
}

/// One simulated trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialReport {
    pub number: u32,
    pub mode: ScrollMode,
    pub technique: Technique,
    pub frame: usize,
    pub inside_target: bool,
    /// A direct move was needed after the technique's approach.
    pub corrected: bool,
    pub time_to_target_ms: Option<u64>,
    pub elapsed_ms: u64,
    pub vertical: i64,
    pub horizontal: i64,
}

impl TrialReport {
    fn from_summary(summary: &TrialSummary, corrected: bool, finished: Instant) -> Self {
        let started = summary.instants.started;
        Self {
            number: summary.trial.number,
            mode: summary.trial.mode,
            technique: summary.trial.technique,
            frame: summary.trial.frame,
            inside_target: summary.evaluation.inside_target,
            corrected,
            time_to_target_ms: summary
                .instants
                .first_inside
                .map(|t| t.duration_since(started).as_millis() as u64),
            elapsed_ms: finished.duration_since(started).as_millis() as u64,
            vertical: summary.offsets.vertical,
            horizontal: summary.offsets.horizontal,
        }
    }
}

/// All trials of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub trials: Vec<TrialReport>,
}

impl SimulationReport {
    /// Trials that ended with the target inside the frame.
    #[must_use]
    pub fn reached(&self) -> usize {
        self.trials.iter().filter(|t| t.inside_target).count()
    }

    /// Trials that needed a correction move.
    #[must_use]
    pub fn corrected(&self) -> usize {
        self.trials.iter().filter(|t| t.corrected).count()
    }
}

/// Run `options.trials` trials back to back.
pub fn simulate(
    orchestrator: &mut TrialOrchestrator,
    options: SimulationOptions,
) -> Result<SimulationReport> {
    let mut report = SimulationReport::default();
    for _ in 0..options.trials {
        report.trials.push(run_trial(orchestrator, options)?);
    }
    tracing::info!(
        target: "scrolltrial.simulate",
        trials = report.trials.len(),
        reached = report.reached(),
        corrected = report.corrected(),
        "simulation finished"
    );
    Ok(report)
}

/// Begin, perform, and finish a single trial.
pub fn run_trial(
    orchestrator: &mut TrialOrchestrator,
    options: SimulationOptions,
) -> Result<TrialReport> {
    let trial = orchestrator.begin_trial()?;
    orchestrator.cursor_entered();

    let mut corrected = false;
    for (axis, window) in axis_windows(&trial) {
        orchestrator.set_wheel_axis(axis);
        match trial.technique {
            Technique::RateBased => rate_approach(orchestrator, axis, &window, options)?,
            Technique::Drag => drag_approach(orchestrator, axis, &window)?,
        }
        let remaining = window.distance(orchestrator.offsets().get(axis));
        if remaining != 0 {
            tracing::debug!(
                target: "scrolltrial.simulate",
                ?axis,
                remaining,
                "correcting after approach"
            );
            orchestrator.scroll(axis, -remaining)?;
            corrected = true;
        }
    }

    orchestrator.cursor_exited();
    let summary = orchestrator.finish_trial()?;
    Ok(TrialReport::from_summary(&summary, corrected, Instant::now()))
}

fn axis_windows(trial: &Trial) -> Vec<(Axis, AcceptanceWindow)> {
    match trial.windows {
        TargetWindows::Line(window) => vec![(Axis::Vertical, window)],
        TargetWindows::Cell(grid) => vec![(Axis::Vertical, grid.rows), (Axis::Horizontal, grid.cols)],
    }
}

/// Hold a constant rate toward the window until inside, past it, or out of
/// time.
fn rate_approach(
    orchestrator: &mut TrialOrchestrator,
    axis: Axis,
    window: &AcceptanceWindow,
    options: SimulationOptions,
) -> Result<()> {
    let start = window.distance(orchestrator.offsets().get(axis));
    if start == 0 {
        return Ok(());
    }
    let rate = orchestrator.config().controller.rate_delta.abs();
    let tick = orchestrator.config().controller.tick_period();
    let deadline = Instant::now() + options.approach_timeout;

    orchestrator.command(ScrollCommand::RateBased(-start.signum() * rate))?;
    loop {
        std::thread::sleep(tick);
        let outcome = orchestrator.pump()?;
        let distance = window.distance(outcome.offsets.get(axis));
        if distance == 0 || distance.signum() != start.signum() {
            break;
        }
        if Instant::now() >= deadline {
            tracing::warn!(
                target: "scrolltrial.simulate",
                ?axis,
                distance,
                "rate-based approach timed out"
            );
            break;
        }
    }
    orchestrator.command(ScrollCommand::Stop)?;
    Ok(())
}

/// One drag of whole wheel notches toward the window.
fn drag_approach(
    orchestrator: &mut TrialOrchestrator,
    axis: Axis,
    window: &AcceptanceWindow,
) -> Result<()> {
    let distance = window.distance(orchestrator.offsets().get(axis));
    let step = orchestrator.config().controller.wheel_step_px.max(1);
    let notches = -distance / step;
    if notches != 0 {
        orchestrator.command(ScrollCommand::Drag(notches))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrolltrial_core::LineMetrics;
    use scrolltrial_runtime::ExperimentConfig;

    fn small_config(technique: Technique, mode: ScrollMode) -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.selection.seed = Some(5);
        config.selection.modes = vec![mode];
        config.selection.techniques = vec![technique];
        config.vertical.visible_lines = 10;
        config.grid.total_rows = 60;
        config.grid.total_cols = 60;
        config.grid.visible_rows = 10;
        config.grid.visible_cols = 10;
        config.grid.frame_sizes = vec![3];
        config
    }

    fn run(config: ExperimentConfig, trials: u32) -> SimulationReport {
        let mut o = TrialOrchestrator::new(config, LineMetrics::from_counts(vec![20; 80])).unwrap();
        simulate(
            &mut o,
            SimulationOptions {
                trials,
                ..SimulationOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn drag_trials_always_reach_the_target() {
        let report = run(small_config(Technique::Drag, ScrollMode::OneDimensional), 6);
        assert_eq!(report.trials.len(), 6);
        assert_eq!(report.reached(), 6);
        for t in &report.trials {
            if let Some(reached) = t.time_to_target_ms {
                assert!(reached <= t.elapsed_ms);
            }
        }
    }

    #[test]
    fn rate_based_grid_trials_reach_the_target() {
        let report = run(small_config(Technique::RateBased, ScrollMode::TwoDimensional), 2);
        assert_eq!(report.reached(), 2);
        assert!(report.trials.iter().all(|t| t.mode == ScrollMode::TwoDimensional));
    }

    #[test]
    fn trial_numbers_are_sequential() {
        let report = run(small_config(Technique::Drag, ScrollMode::TwoDimensional), 3);
        let numbers: Vec<u32> = report.trials.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn report_serializes_with_snake_case_enums() {
        let report = run(small_config(Technique::RateBased, ScrollMode::OneDimensional), 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trials"][0]["technique"], "rate_based");
        assert_eq!(json["trials"][0]["mode"], "one_dimensional");
    }
}
