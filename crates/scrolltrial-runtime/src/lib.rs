#![forbid(unsafe_code)]

//! Runtime half of scrolltrial: the threaded and stateful parts.
//!
//! # Key Components
//!
//! - [`controller`] - [`ContinuousScrollController`], one background tick
//!   loop at a time
//! - [`inject`] - the [`WheelInjector`] seam and its mpsc implementation
//! - [`orchestrator`] - [`TrialOrchestrator`], owner of the scroll session
//! - [`config`] - [`ExperimentConfig`] (TOML/JSON)
//! - [`logging`] - subscriber installation
//! - [`cancellation`] - cooperative cancellation for tick loops
//!
//! # Threading
//!
//! The orchestrator and its session live on one thread. The controller's
//! tick loop is the only other thread and talks to the session exclusively
//! through [`ScrollMsg`] messages that the orchestrator drains in
//! [`TrialOrchestrator::pump`].

pub mod cancellation;
pub mod config;
pub mod controller;
pub mod inject;
pub mod logging;
pub mod orchestrator;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{ConfigError, ExperimentConfig};
pub use controller::{
    ContinuousScrollController, ControllerError, ControllerState, ControllerStats,
    DEFAULT_TICK_PERIOD, JobExit, JobId, ScrollCommand,
};
pub use inject::{ChannelInjector, InjectError, ScrollInbox, ScrollMsg, WheelInjector, scroll_channel};
pub use logging::{LogConfig, LogError, LogFormat, init_logging};
pub use orchestrator::{
    Evaluation, ScrollMode, ScrollOutcome, SelectionPolicy, Target, TargetWindows, Technique,
    Trial, TrialError, TrialInstants, TrialOrchestrator, TrialSummary, evaluate,
};
