#![forbid(unsafe_code)]

//! Continuous-scroll controller.
//!
//! Owns at most one background tick loop that injects a fixed wheel delta
//! every tick period until stopped.
//!
//! # State machine
//!
//! ```text
//!            start(d)                     start(d')
//!   Idle ──────────────▶ Running(job) ─────────────▶ Running(job')
//!    ▲                      │    │      (cancel + join job first)
//!    │        stop()        │    │ injector error
//!    └──────────────────────┘    └──────▶ Idle (reported by poll/state)
//! ```
//!
//! - `start` supersedes: the previous job is cancelled *and joined* before
//!   the next one is spawned, inside the same `&mut self` call, so two jobs
//!   never tick at the same time.
//! - `stop` is idempotent.
//! - Cancellation is cooperative: the loop checks its token once per tick
//!   and sleeps on the token between ticks, so a stop wakes it immediately.
//! - Injection failures end the job only. The controller logs the error,
//!   reports it through [`ContinuousScrollController::poll`], and is Idle
//!   again.
//!
//! Controllers are ordinary owned values; create one per pane (or per
//! orchestrator) and pass it where it is needed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::inject::{InjectError, WheelInjector};

/// Tick period used when none is configured.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Monotonic job identifier, unique per controller.
pub type JobId = u64;

/// Controller errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The tick thread could not be spawned.
    #[error("failed to spawn scroll tick thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// A one-shot injection (drag) failed.
    #[error(transparent)]
    Inject(#[from] InjectError),
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running { job: JobId, delta: i64 },
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobExit {
    /// Stopped or superseded.
    Cancelled { job: JobId, ticks: u64 },
    /// The injector failed; the job exited on its own.
    Failed {
        job: JobId,
        ticks: u64,
        error: InjectError,
    },
    /// The tick thread panicked.
    Panicked { job: JobId },
}

impl JobExit {
    #[must_use]
    pub fn job(&self) -> JobId {
        match self {
            Self::Cancelled { job, .. } | Self::Failed { job, .. } | Self::Panicked { job } => *job,
        }
    }
}

/// Scroll command as issued by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    /// One immediate wheel event of the given notches (direct drag).
    Drag(i64),
    /// Start (or retarget) constant-rate scrolling at the given notches/tick.
    RateBased(i64),
    /// Stop constant-rate scrolling.
    Stop,
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Live counters shared with the tick threads.
#[derive(Debug, Default)]
pub struct ControllerStats {
    active_jobs: AtomicUsize,
    peak_active_jobs: AtomicUsize,
    jobs_started: AtomicU64,
    ticks: AtomicU64,
}

impl ControllerStats {
    /// Jobs whose loop is currently executing.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.active_jobs.load(Ordering::SeqCst)
    }

    /// Highest value `active_jobs` ever reached.
    #[must_use]
    pub fn peak_active_jobs(&self) -> usize {
        self.peak_active_jobs.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn jobs_started(&self) -> u64 {
        self.jobs_started.load(Ordering::Relaxed)
    }

    /// Successful injections across all jobs.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Marks a loop as active for as long as it lives.
struct ActiveGuard<'a>(&'a ControllerStats);

impl<'a> ActiveGuard<'a> {
    fn enter(stats: &'a ControllerStats) -> Self {
        let now = stats.active_jobs.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak_active_jobs.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active_jobs.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct RunningJob {
    id: JobId,
    delta: i64,
    source: CancellationSource,
    handle: JoinHandle<JobExit>,
}

impl RunningJob {
    /// Cancel and wait for the loop to observe it.
    fn finish(self) -> JobExit {
        self.source.cancel();
        join_job(self.id, self.handle)
    }
}

fn join_job(id: JobId, handle: JoinHandle<JobExit>) -> JobExit {
    handle.join().unwrap_or_else(|_| {
        tracing::error!(target: "scrolltrial.controller", job = id, "tick thread panicked");
        JobExit::Panicked { job: id }
    })
}

/// Single-job continuous-scroll controller.
pub struct ContinuousScrollController<I: WheelInjector + Clone> {
    injector: I,
    tick_period: Duration,
    running: Option<RunningJob>,
    next_id: JobId,
    last_exit: Option<JobExit>,
    stats: Arc<ControllerStats>,
}

impl<I: WheelInjector + Clone> ContinuousScrollController<I> {
    /// Idle controller with the default tick period.
    pub fn new(injector: I) -> Self {
        Self {
            injector,
            tick_period: DEFAULT_TICK_PERIOD,
            running: None,
            next_id: 1,
            last_exit: None,
            stats: Arc::new(ControllerStats::default()),
        }
    }

    /// Override the tick period for jobs started from now on.
    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Shared counters (safe to sample from any thread).
    #[must_use]
    pub fn stats(&self) -> Arc<ControllerStats> {
        Arc::clone(&self.stats)
    }

    /// Start constant-rate scrolling at `delta` notches per tick,
    /// superseding any running job.
    pub fn start(&mut self, delta: i64) -> Result<JobId, ControllerError> {
        if let Some(previous) = self.running.take() {
            let exit = previous.finish();
            tracing::debug!(
                target: "scrolltrial.controller",
                job = exit.job(),
                ?exit,
                "superseded running job"
            );
        }
        let id = self.next_id;
        self.next_id += 1;

        let source = CancellationSource::new();
        let token = source.token();
        let injector = self.injector.clone();
        let stats = Arc::clone(&self.stats);
        let period = self.tick_period;

        let handle = thread::Builder::new()
            .name(format!("scrolltrial-tick-{id}"))
            .spawn(move || run_job(id, delta, period, injector, &token, &stats))?;

        self.stats.jobs_started.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            target: "scrolltrial.controller",
            job = id,
            delta,
            tick_period_us = period.as_micros() as u64,
            "continuous scroll started"
        );
        self.running = Some(RunningJob {
            id,
            delta,
            source,
            handle,
        });
        Ok(id)
    }

    /// Stop the running job, if any, and wait for it to exit.
    ///
    /// Returns `None` when already Idle.
    pub fn stop(&mut self) -> Option<JobExit> {
        let job = self.running.take()?;
        let exit = job.finish();
        tracing::info!(target: "scrolltrial.controller", job = exit.job(), ?exit, "continuous scroll stopped");
        Some(exit)
    }

    /// Reap a job that ended on its own and return how it ended.
    ///
    /// Returns each exit once.
    pub fn poll(&mut self) -> Option<JobExit> {
        self.reap();
        self.last_exit.take()
    }

    /// Current state, after reaping a job that already exited.
    pub fn state(&mut self) -> ControllerState {
        self.reap();
        match &self.running {
            Some(job) => ControllerState::Running {
                job: job.id,
                delta: job.delta,
            },
            None => ControllerState::Idle,
        }
    }

    /// Whether a job is running (after reaping).
    pub fn is_running(&mut self) -> bool {
        matches!(self.state(), ControllerState::Running { .. })
    }

    /// Dispatch a [`ScrollCommand`].
    pub fn perform(&mut self, command: ScrollCommand) -> Result<(), ControllerError> {
        tracing::debug!(target: "scrolltrial.controller", ?command, "perform");
        match command {
            ScrollCommand::Drag(amount) => {
                self.injector.inject(amount)?;
            }
            ScrollCommand::RateBased(delta) => {
                self.start(delta)?;
            }
            ScrollCommand::Stop => {
                self.stop();
            }
        }
        Ok(())
    }

    fn reap(&mut self) {
        let finished = self
            .running
            .as_ref()
            .is_some_and(|job| job.handle.is_finished());
        if !finished {
            return;
        }
        if let Some(job) = self.running.take() {
            let exit = join_job(job.id, job.handle);
            if let JobExit::Failed { error, .. } = &exit {
                tracing::warn!(
                    target: "scrolltrial.controller",
                    job = job.id,
                    %error,
                    "continuous scroll failed; controller idle"
                );
            }
            self.last_exit = Some(exit);
        }
    }
}

impl<I: WheelInjector + Clone> Drop for ContinuousScrollController<I> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<I: WheelInjector + Clone> std::fmt::Debug for ContinuousScrollController<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuousScrollController")
            .field("tick_period", &self.tick_period)
            .field("running", &self.running.as_ref().map(|j| (j.id, j.delta)))
            .field("stats", &self.stats)
            .finish()
    }
}

fn run_job<I: WheelInjector>(
    id: JobId,
    delta: i64,
    period: Duration,
    mut injector: I,
    token: &CancellationToken,
    stats: &ControllerStats,
) -> JobExit {
    let _active = ActiveGuard::enter(stats);
    let span = tracing::debug_span!(
        "scroll.job",
        job = id,
        delta,
        ticks = tracing::field::Empty,
    )
    .entered();

    let mut ticks = 0u64;
    let exit = loop {
        if token.is_cancelled() {
            break JobExit::Cancelled { job: id, ticks };
        }
        if let Err(error) = injector.inject(delta) {
            tracing::error!(target: "scrolltrial.controller", job = id, %error, "wheel injection failed");
            break JobExit::Failed {
                job: id,
                ticks,
                error,
            };
        }
        ticks += 1;
        stats.ticks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(target: "scrolltrial.controller", job = id, delta, ticks, "tick");
        if token.wait_timeout(period) {
            break JobExit::Cancelled { job: id, ticks };
        }
    };

    span.record("ticks", ticks);
    exit
}
