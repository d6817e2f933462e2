#![forbid(unsafe_code)]

//! Structured tracing emitted while running a trial.
//!
//! Events from the orchestrator and the controller's control path (which
//! run on the calling thread) are captured with a thread-local subscriber.
//!
//! Run:
//!   cargo test -p scrolltrial-runtime --test trial_tracing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use scrolltrial_core::{Axis, LineMetrics};
use scrolltrial_runtime::{
    ExperimentConfig, ScrollCommand, ScrollMode, TargetWindows, TrialOrchestrator,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ── Capture infrastructure ────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    message: String,
    fields: HashMap<String, String>,
    parent_span: Option<String>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct EventCapture(Arc<Mutex<Vec<CapturedEvent>>>);

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let parent_span = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span| span.name().to_string());
        self.0.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            message: fields.get("message").cloned().unwrap_or_default(),
            fields,
            parent_span,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with(EventCapture(Arc::clone(&events)));
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn orchestrator() -> TrialOrchestrator {
    let mut config = ExperimentConfig::default();
    config.selection.seed = Some(77);
    config.selection.modes = vec![ScrollMode::OneDimensional];
    TrialOrchestrator::new(config, LineMetrics::from_counts(vec![25; 300])).unwrap()
}

fn find<'a>(events: &'a [CapturedEvent], target: &str, message: &str) -> Option<&'a CapturedEvent> {
    events
        .iter()
        .find(|e| e.target == target && e.message == message)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[test]
fn trial_lifecycle_is_traced() {
    let events = capture(|| {
        let mut o = orchestrator();
        let trial = o.begin_trial().unwrap();
        let TargetWindows::Line(window) = trial.windows else {
            panic!("expected a line trial");
        };
        o.scroll(Axis::Vertical, window.min().max(0)).unwrap();
        o.finish_trial().unwrap();
    });

    let started = find(&events, "scrolltrial.trial", "trial started").expect("trial started");
    assert_eq!(started.parent_span.as_deref(), Some("trial"));
    assert!(started.fields.contains_key("frame"));
    assert!(started.fields.contains_key("windows"));

    let reached = find(&events, "scrolltrial.trial", "target reached").expect("target reached");
    assert_eq!(reached.fields.get("number").map(String::as_str), Some("1"));

    let finished = find(&events, "scrolltrial.trial", "trial finished").expect("trial finished");
    assert_eq!(
        finished.fields.get("inside_target").map(String::as_str),
        Some("true")
    );
}

#[test]
fn controller_start_and_stop_are_traced() {
    let events = capture(|| {
        let mut o = orchestrator();
        o.begin_trial().unwrap();
        o.command(ScrollCommand::RateBased(2)).unwrap();
        o.command(ScrollCommand::Stop).unwrap();
    });

    let started = find(&events, "scrolltrial.controller", "continuous scroll started")
        .expect("start event");
    assert_eq!(started.fields.get("delta").map(String::as_str), Some("2"));
    assert_eq!(started.fields.get("job").map(String::as_str), Some("1"));
    assert!(find(&events, "scrolltrial.controller", "continuous scroll stopped").is_some());
}

#[test]
fn setup_failure_is_not_reported_as_a_trial() {
    let events = capture(|| {
        let mut config = ExperimentConfig::default();
        config.selection.modes = vec![ScrollMode::OneDimensional];
        config.selection.max_attempts = 5;
        let mut o = TrialOrchestrator::new(config, LineMetrics::from_counts(vec![0; 300])).unwrap();
        assert!(o.begin_trial().is_err());
    });

    assert!(find(&events, "scrolltrial.trial", "trial started").is_none());
    assert!(
        find(
            &events,
            "scrolltrial.target",
            "target selection exhausted its retry budget"
        )
        .is_some()
    );
}
