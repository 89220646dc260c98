//! Echo Ranger command line entry point.
//!
//! ```bash
//! # Round-trip delays of every capture in a folder
//! echo-ranger delays data/
//!
//! # Speed of sound by the difference method
//! echo-ranger speed data/ --hard-replacement
//!
//! # Linear calibration t(d) = m*d + b
//! echo-ranger calibrate data/
//!
//! # Single measurement against a calibration folder
//! echo-ranger measure shot.csv --calibration-dir data/
//!
//! # Switch to FFT correlation and keep it in the config file
//! echo-ranger delays data/ --method fft --save-config
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use echo_core::analysis::{available_methods, CorrelationMethodKind};
use echo_core::config::{ConfigManager, ConfigSection, DEFAULT_CONFIG_PATH};
use echo_core::logging;

/// Ultrasonic echo ranging: delays, speed of sound, calibration and distance.
#[derive(Parser, Debug)]
#[command(name = "echo-ranger")]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (created with defaults if missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print a machine-readable JSON report instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Correlation method for this run (direct, fft)
    #[arg(long, global = true, value_parser = parse_method)]
    pub method: Option<CorrelationMethodKind>,

    /// Display rounding step in meters for this run
    #[arg(long, global = true)]
    pub step: Option<f64>,

    /// Write --method and --step back to the config file
    #[arg(long, global = true)]
    pub save_config: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the round-trip delay of every capture in a folder
    Delays {
        /// Capture folder (defaults to paths.data_folder)
        dir: Option<PathBuf>,
    },

    /// Speed of sound from labelled captures by the difference method
    Speed {
        /// Capture folder (defaults to paths.data_folder)
        dir: Option<PathBuf>,

        /// Use the hard-replacement outlier multiplier
        #[arg(long)]
        hard_replacement: bool,
    },

    /// Fit t(d) = m*d + b over labelled captures
    Calibrate {
        /// Capture folder (defaults to paths.data_folder)
        dir: Option<PathBuf>,
    },

    /// Distance of a single capture
    Measure(MeasureArgs),
}

/// Arguments of the `measure` command.
#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Capture file
    pub file: PathBuf,

    /// Calibrate from this folder first
    #[arg(long, conflicts_with = "slope")]
    pub calibration_dir: Option<PathBuf>,

    /// Calibration slope m in s/m
    #[arg(long, requires = "intercept", allow_hyphen_values = true)]
    pub slope: Option<f64>,

    /// Calibration intercept b in s
    #[arg(long, requires = "slope", allow_hyphen_values = true)]
    pub intercept: Option<f64>,

    /// Standard error of the slope
    #[arg(long, default_value_t = 0.0, requires = "slope")]
    pub slope_err: f64,

    /// Standard error of the intercept
    #[arg(long, default_value_t = 0.0, requires = "slope")]
    pub intercept_err: f64,
}

fn parse_method(name: &str) -> Result<CorrelationMethodKind, String> {
    CorrelationMethodKind::from_name(name).ok_or_else(|| {
        format!(
            "unknown method '{}', expected one of: {}",
            name,
            available_methods().join(", ")
        )
    })
}

/// Apply per-run overrides; with `--save-config` the touched sections are
/// written back to the config file.
fn apply_overrides(cli: &Cli, config: &mut ConfigManager) -> anyhow::Result<()> {
    let mut touched = Vec::new();
    if let Some(method) = cli.method {
        config.settings_mut().detection.correlation_method = method;
        touched.push(ConfigSection::Detection);
    }
    if let Some(step) = cli.step {
        config.settings_mut().display.quantization_step_m = step;
        touched.push(ConfigSection::Display);
    }

    config
        .settings()
        .validate()
        .context("Invalid command line override")?;

    if cli.save_config {
        for section in touched {
            config.update_section(section).with_context(|| {
                format!(
                    "Failed to save [{}] to {}",
                    section.table_name(),
                    cli.config.display()
                )
            })?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    apply_overrides(&cli, &mut config)?;
    let settings = config.into_settings();

    let level = settings.logging.level.more_verbose(cli.verbose);
    let _guard = if settings.logging.log_to_file {
        Some(logging::init_tracing_with_file(
            level,
            &settings.paths.logs_folder,
        ))
    } else {
        logging::init_tracing(level);
        None
    };

    tracing::debug!("echo-ranger {} (core {})", env!("CARGO_PKG_VERSION"), echo_core::version());

    let report = commands::execute(&cli.command, &settings)?;

    if cli.json {
        println!("{}", output::render_json(&report)?);
    } else {
        print!("{}", output::render_text(&report));
    }

    Ok(())
}
