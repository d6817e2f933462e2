#![forbid(unsafe_code)]

//! scrolltrial public facade crate.
//!
//! Re-exports the geometry core and the threaded runtime, adds document
//! loading and a scripted participant, and hosts the `scrolltrial` CLI.
//!
//! ```
//! use scrolltrial::prelude::*;
//!
//! let mut config = ExperimentConfig::default();
//! config.selection.seed = Some(1);
//! config.selection.techniques = vec![Technique::Drag];
//! let document = LineMetrics::from_counts(vec![40; 200]);
//! let mut orchestrator = TrialOrchestrator::new(config, document).unwrap();
//! let report = simulate(&mut orchestrator, SimulationOptions { trials: 2, ..Default::default() }).unwrap();
//! assert_eq!(report.reached(), 2);
//! ```

pub mod cli;
pub mod document;
pub mod error;
pub mod simulate;

// --- Core re-exports -------------------------------------------------------

pub use scrolltrial_core::{
    AcceptanceWindow, Axis, AxisExtent, GeometryError, GridMetrics, GridWindows,
    LineMetrics, PixelDensity, Rect, ScrollOffsets, ScrollSession, TargetPicker, UnitScale,
    WrappedText, acceptance_window_1d, acceptance_window_2d, is_inside_2d, is_inside_window,
    line_char_span, reachable_line_range, scroll_unit,
};

// --- Runtime re-exports ----------------------------------------------------

pub use scrolltrial_runtime::{
    ContinuousScrollController, ControllerState, ControllerStats, Evaluation, ExperimentConfig,
    JobExit, LogConfig, LogFormat, ScrollCommand, ScrollMode, ScrollOutcome, SelectionPolicy,
    Target, TargetWindows, Technique, Trial, TrialError, TrialInstants, TrialOrchestrator,
    TrialSummary, WheelInjector, init_logging,
};

// --- Facade ----------------------------------------------------------------

pub use cli::{run, run_from_env};
pub use document::{load_document, load_metrics};
pub use error::{Error, Result};
pub use simulate::{SimulationOptions, SimulationReport, TrialReport, simulate};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AcceptanceWindow, Axis, Error, ExperimentConfig, GridWindows, LineMetrics, Result,
        ScrollCommand, ScrollMode, SimulationOptions, SimulationReport, Target, TargetWindows,
        Technique, TrialOrchestrator, simulate,
    };

    pub use crate::{core, runtime};
}

pub use scrolltrial_core as core;
pub use scrolltrial_runtime as runtime;
