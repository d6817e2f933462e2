#![forbid(unsafe_code)]

//! Loading experiment configuration from disk.
//!
//! Run:
//!   cargo test -p scrolltrial-runtime --test config_loading

use std::io::Write;

use scrolltrial_core::LineMetrics;
use scrolltrial_runtime::config::ExperimentConfig;
use scrolltrial_runtime::{
    ConfigError, LogFormat, ScrollMode, SelectionPolicy, Target, Technique, TrialOrchestrator,
};

const SESSION_TOML: &str = r#"
[vertical]
visible_lines = 41
line_height_px = 18
frame_sizes = [3, 5]

[grid]
total_rows = 1800
visible_rows = 67
row_scroll_max = 4000

[controller]
tick_period_ms = 2
wheel_step_px = 6

[selection]
policy = "alternate"
modes = ["one_dimensional", "two_dimensional"]
techniques = ["rate_based"]
seed = 1234

[units]
px_per_mm = 4.0

[log]
level = "debug"
format = "json"
"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn load_reads_every_section() {
    let file = write_temp(SESSION_TOML);
    let config = ExperimentConfig::load(file.path()).unwrap();

    assert_eq!(config.vertical.visible_lines, 41);
    assert_eq!(config.vertical.frame_sizes, vec![3, 5]);
    assert_eq!(config.vertical.wrap_width, 70);
    assert_eq!(config.grid.row_scroll_max, Some(4000));
    assert_eq!(config.grid.col_scroll_max, None);
    assert_eq!(config.controller.tick_period_ms, 2);
    assert_eq!(config.selection.policy, SelectionPolicy::Alternate);
    assert_eq!(config.selection.techniques, vec![Technique::RateBased]);
    assert_eq!(config.selection.seed, Some(1234));
    assert!((config.units.px_per_mm - 4.0).abs() < f64::EPSILON);
    assert_eq!(config.log.format, LogFormat::Json);
}

#[test]
fn load_rejects_invalid_values() {
    let file = write_temp(
        r#"
        [vertical]
        visible_lines = 5
        frame_sizes = [7]

        [controller]
        tick_period_ms = 0
        "#,
    );
    match ExperimentConfig::load(file.path()) {
        Err(ConfigError::Invalid(errors)) => {
            assert_eq!(errors.len(), 2, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("vertical.frame_sizes")));
            assert!(errors.iter().any(|e| e.contains("controller.tick_period_ms")));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        ExperimentConfig::load(&missing),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn unknown_enum_value_is_parse_error() {
    let file = write_temp("[selection]\npolicy = \"weighted\"\n");
    assert!(matches!(
        ExperimentConfig::load(file.path()),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn saved_config_loads_back() {
    let original = ExperimentConfig::from_toml_str(SESSION_TOML).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.toml");
    std::fs::write(&path, original.to_toml_string().unwrap()).unwrap();
    assert_eq!(ExperimentConfig::load(&path).unwrap(), original);
}

#[test]
fn loaded_config_drives_an_orchestrator() {
    let file = write_temp(SESSION_TOML);
    let config = ExperimentConfig::load(file.path()).unwrap();
    let document = LineMetrics::from_counts(vec![30; 300]);
    let mut orchestrator = TrialOrchestrator::new(config, document).unwrap();

    let first = orchestrator.begin_trial().unwrap();
    assert_eq!(first.mode, ScrollMode::OneDimensional);
    assert_eq!(first.technique, Technique::RateBased);
    assert!(matches!(first.target, Target::Line { .. }));
    // 41 visible lines of 18 px.
    assert_eq!(first.pane.height, 41 * 18);

    let second = orchestrator.begin_trial().unwrap();
    assert_eq!(second.mode, ScrollMode::TwoDimensional);
    assert_eq!(
        orchestrator.session().max_offset(scrolltrial_core::Axis::Vertical),
        4000
    );
}
