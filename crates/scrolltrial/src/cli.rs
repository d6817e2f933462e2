#![forbid(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use scrolltrial_core::{acceptance_window_1d, acceptance_window_2d};
use scrolltrial_runtime::config::GridConfig;
use scrolltrial_runtime::{ExperimentConfig, LogConfig, LogFormat, TrialOrchestrator, init_logging};

use crate::document::load_metrics;
use crate::error::{Error, Result};
use crate::simulate::{SimulationOptions, SimulationReport, simulate};

#[derive(Debug, Parser)]
#[command(
    name = "scrolltrial",
    about = "Scroll-target experiment engine: acceptance windows and simulated trials",
    version
)]
pub struct Cli {
    /// Log filter directive; overrides the config file's [log] level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Acceptance window of a line in a text pane.
    Window(WindowArgs),

    /// Acceptance windows of a grid cell.
    #[command(name = "grid-window")]
    GridWindow(GridWindowArgs),

    /// Run scripted trials against the engine.
    Simulate(SimulateArgs),

    /// Print the effective configuration as TOML.
    #[command(name = "print-config")]
    PrintConfig(PrintConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    /// Lines visible in the pane.
    #[arg(long, default_value_t = 67)]
    pub visible: usize,
    /// Frame size in lines.
    #[arg(long, default_value_t = 3)]
    pub frame: usize,
    /// 0-based target line.
    #[arg(long)]
    pub target: usize,
    /// Scroll units per line.
    #[arg(long, default_value_t = 20)]
    pub unit: i64,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct GridWindowArgs {
    #[arg(long, default_value_t = 1800)]
    pub total_rows: usize,
    #[arg(long, default_value_t = 1800)]
    pub total_cols: usize,
    #[arg(long, default_value_t = 67)]
    pub visible_rows: usize,
    #[arg(long, default_value_t = 67)]
    pub visible_cols: usize,
    #[arg(long, default_value_t = 10)]
    pub cell_size: i64,
    /// Vertical scroll-bar maximum; defaults to content minus viewport.
    #[arg(long)]
    pub row_scroll_max: Option<i64>,
    /// Horizontal scroll-bar maximum; defaults to content minus viewport.
    #[arg(long)]
    pub col_scroll_max: Option<i64>,
    #[arg(long, default_value_t = 5)]
    pub frame: usize,
    /// 0-based target row.
    #[arg(long)]
    pub row: usize,
    /// 0-based target column.
    #[arg(long)]
    pub col: usize,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// TOML experiment configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, default_value_t = 10)]
    pub trials: u32,
    /// Overrides selection.seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Per-axis time budget for rate-based approaches, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PrintConfigArgs {
    /// TOML experiment configuration; defaults are printed without one.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Configuration named by the subcommand, or the defaults.
    pub fn experiment_config(&self) -> Result<ExperimentConfig> {
        let path = match &self.command {
            Commands::Simulate(args) => args.config.as_ref(),
            Commands::PrintConfig(args) => args.config.as_ref(),
            Commands::Window(_) | Commands::GridWindow(_) => None,
        };
        match path {
            Some(path) => Ok(ExperimentConfig::load(path)?),
            None => Ok(ExperimentConfig::default()),
        }
    }

    /// `[log]` from `config` with command-line overrides applied.
    #[must_use]
    pub fn log_config(&self, config: &ExperimentConfig) -> LogConfig {
        let mut log = config.log.clone();
        if let Some(level) = &self.log_level {
            log.level.clone_from(level);
        }
        if self.log_json {
            log.format = LogFormat::Json;
        }
        log
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.experiment_config()?;
    init_logging(&cli.log_config(&config))?;
    dispatch(cli.command, config, &mut std::io::stdout().lock())
}

pub fn run(cli: Cli) -> Result<()> {
    run_with_output(cli, &mut std::io::stdout().lock())
}

/// Like [`run`], writing command output to `out`.
pub fn run_with_output(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = cli.experiment_config()?;
    dispatch(cli.command, config, out)
}

fn dispatch(command: Commands, config: ExperimentConfig, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Window(args) => run_window(&args, out),
        Commands::GridWindow(args) => run_grid_window(&args, out),
        Commands::Simulate(args) => run_simulate(&args, config, out),
        Commands::PrintConfig(_) => {
            out.write_all(config.to_toml_string()?.as_bytes())?;
            Ok(())
        }
    }
}

fn run_window(args: &WindowArgs, out: &mut dyn Write) -> Result<()> {
    let window = acceptance_window_1d(args.frame, args.target, args.visible, args.unit)?;
    if args.json {
        let value = serde_json::json!({ "min": window.min(), "max": window.max() });
        writeln!(out, "{}", serde_json::to_string(&value)?)?;
    } else {
        writeln!(out, "min={} max={}", window.min(), window.max())?;
    }
    Ok(())
}

fn run_grid_window(args: &GridWindowArgs, out: &mut dyn Write) -> Result<()> {
    if args.visible_rows >= args.total_rows || args.visible_cols >= args.total_cols {
        return Err(Error::invalid_argument(
            "visible rows and columns must be fewer than the totals",
        ));
    }
    let grid = GridConfig {
        total_rows: args.total_rows,
        total_cols: args.total_cols,
        visible_rows: args.visible_rows,
        visible_cols: args.visible_cols,
        cell_size_px: args.cell_size,
        frame_sizes: vec![args.frame],
        row_scroll_max: args.row_scroll_max,
        col_scroll_max: args.col_scroll_max,
    };
    let (rows, cols) = grid.extents()?;
    let windows = acceptance_window_2d(args.frame, args.row, args.col, rows, cols)?;
    if args.json {
        let value = serde_json::json!({
            "rows": { "min": windows.rows.min(), "max": windows.rows.max() },
            "cols": { "min": windows.cols.min(), "max": windows.cols.max() },
        });
        writeln!(out, "{}", serde_json::to_string(&value)?)?;
    } else {
        writeln!(
            out,
            "rows min={} max={}\ncols min={} max={}",
            windows.rows.min(),
            windows.rows.max(),
            windows.cols.min(),
            windows.cols.max()
        )?;
    }
    Ok(())
}

fn run_simulate(args: &SimulateArgs, mut config: ExperimentConfig, out: &mut dyn Write) -> Result<()> {
    if args.trials == 0 {
        return Err(Error::invalid_argument("--trials must be > 0"));
    }
    if args.seed.is_some() {
        config.selection.seed = args.seed;
    }
    let document = load_metrics(&config.vertical)?;
    let mut orchestrator = TrialOrchestrator::new(config, document)?;
    let report = simulate(
        &mut orchestrator,
        SimulationOptions {
            trials: args.trials,
            approach_timeout: Duration::from_millis(args.timeout_ms),
        },
    )?;
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_table(&report, out)?;
    }
    Ok(())
}

fn write_table(report: &SimulationReport, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{:>5}  {:<16} {:<10} {:>5}  {:<6} {:<9} {:>9} {:>9}",
        "trial", "mode", "technique", "frame", "inside", "corrected", "reach_ms", "total_ms"
    )?;
    for t in &report.trials {
        let reach = t
            .time_to_target_ms
            .map_or_else(|| "-".to_string(), |ms| ms.to_string());
        writeln!(
            out,
            "{:>5}  {:<16} {:<10} {:>5}  {:<6} {:<9} {:>9} {:>9}",
            t.number,
            format!("{:?}", t.mode),
            format!("{:?}", t.technique),
            t.frame,
            t.inside_target,
            t.corrected,
            reach,
            t.elapsed_ms
        )?;
    }
    writeln!(
        out,
        "{} of {} trials reached the target",
        report.reached(),
        report.trials.len()
    )?;
    Ok(())
}
