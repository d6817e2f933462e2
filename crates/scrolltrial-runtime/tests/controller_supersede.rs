#![forbid(unsafe_code)]

//! Single-job guarantee of the continuous-scroll controller.
//!
//! A sampler thread watches the live job counter while the main thread
//! restarts the controller as fast as it can. The injector separately counts
//! how many ticks are in flight at once.
//!
//! Run:
//!   cargo test -p scrolltrial-runtime --test controller_supersede

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use scrolltrial_runtime::{
    ContinuousScrollController, ControllerState, InjectError, JobExit, ScrollCommand,
};

/// Injector that records the highest number of overlapping ticks.
fn overlap_probe() -> (
    impl FnMut(i64) -> Result<(), InjectError> + Clone + Send + 'static,
    Arc<AtomicUsize>,
    Arc<AtomicUsize>,
) {
    let in_tick = Arc::new(AtomicUsize::new(0));
    let max_in_tick = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let probe = {
        let in_tick = Arc::clone(&in_tick);
        let max_in_tick = Arc::clone(&max_in_tick);
        let calls = Arc::clone(&calls);
        move |_delta: i64| {
            let now = in_tick.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_tick.fetch_max(now, Ordering::SeqCst);
            calls.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_micros(100));
            in_tick.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    };
    (probe, max_in_tick, calls)
}

#[test]
fn rapid_restarts_never_overlap() {
    let (probe, max_in_tick, calls) = overlap_probe();
    let mut controller = ContinuousScrollController::new(probe);
    let stats = controller.stats();

    let done = Arc::new(AtomicBool::new(false));
    let sampler = {
        let stats = Arc::clone(&stats);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut max_seen = 0;
            let mut samples = 0u64;
            while !done.load(Ordering::Acquire) {
                max_seen = max_seen.max(stats.active_jobs());
                samples += 1;
                std::hint::spin_loop();
            }
            (max_seen, samples)
        })
    };

    for i in 0..200i64 {
        let delta = if i % 2 == 0 { 1 } else { -1 };
        controller.start(delta).unwrap();
        if i % 20 == 0 {
            thread::sleep(Duration::from_millis(2));
        }
    }
    let exit = controller.stop().unwrap();
    assert!(matches!(exit, JobExit::Cancelled { job: 200, .. }));

    done.store(true, Ordering::Release);
    let (max_seen, samples) = sampler.join().unwrap();

    assert!(samples > 0);
    assert!(max_seen <= 1, "sampler saw {max_seen} active jobs");
    assert!(stats.peak_active_jobs() <= 1);
    assert!(max_in_tick.load(Ordering::SeqCst) <= 1, "ticks overlapped");
    assert_eq!(stats.active_jobs(), 0);
    assert_eq!(stats.jobs_started(), 200);
    assert!(calls.load(Ordering::Relaxed) > 0);
}

#[test]
fn perform_rate_based_twice_supersedes() {
    let (probe, max_in_tick, _calls) = overlap_probe();
    let mut controller = ContinuousScrollController::new(probe);

    controller.perform(ScrollCommand::RateBased(2)).unwrap();
    thread::sleep(Duration::from_millis(5));
    controller.perform(ScrollCommand::RateBased(-2)).unwrap();
    assert!(matches!(
        controller.state(),
        ControllerState::Running { delta: -2, .. }
    ));
    thread::sleep(Duration::from_millis(5));
    controller.perform(ScrollCommand::Stop).unwrap();

    assert_eq!(controller.state(), ControllerState::Idle);
    assert!(max_in_tick.load(Ordering::SeqCst) <= 1);
    assert!(controller.stats().peak_active_jobs() <= 1);
}

#[test]
fn stop_when_idle_changes_nothing() {
    let (probe, _max, calls) = overlap_probe();
    let mut controller = ContinuousScrollController::new(probe);
    for _ in 0..3 {
        assert_eq!(controller.stop(), None);
        assert_eq!(controller.state(), ControllerState::Idle);
    }
    controller.perform(ScrollCommand::Stop).unwrap();
    assert_eq!(controller.stats().jobs_started(), 0);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn failing_injector_is_fatal_to_the_job_only() {
    let failing = |_delta: i64| -> Result<(), InjectError> {
        Err(InjectError::Unavailable("no pointer device".into()))
    };
    let mut controller = ContinuousScrollController::new(failing);
    let job = controller.start(1).unwrap();

    let mut exit = None;
    for _ in 0..5_000 {
        exit = controller.poll();
        if exit.is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(
        exit,
        Some(JobExit::Failed {
            job,
            ticks: 0,
            error: InjectError::Unavailable("no pointer device".into()),
        })
    );
    assert_eq!(controller.state(), ControllerState::Idle);

    // The controller is still usable afterwards.
    let next = controller.start(1).unwrap();
    assert!(next > job);
}
