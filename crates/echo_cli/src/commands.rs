//! Command implementations.
//!
//! Each command produces a [`Report`]; rendering lives in `output`.
//! Per-file failures are carried in the report. Failures of the aggregate
//! step (fit, speed, distance) are returned as errors.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Serialize;

use echo_core::analysis::{DelayEstimator, EchoDelay};
use echo_core::batch::{
    build_dataset, discover_captures, measure_delays, BatchReport, CaptureFile, ItemFailure,
};
use echo_core::calibration::{
    aggregate_dataset, fit_dataset, CalibrationDataset, CalibrationFit, CalibrationPoint,
    DerivedSpeed, SpeedEstimate,
};
use echo_core::capture::load_capture;
use echo_core::config::Settings;
use echo_core::distance::{resolve_distance, DistanceEstimate, DistanceReference};

use crate::{Commands, MeasureArgs};

/// Result of one command.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    Delays(DelaysReport),
    Speed(SpeedReport),
    Calibrate(CalibrationReport),
    Measure(MeasureReport),
}

/// A capture that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub file: String,
    pub kind: &'static str,
    pub message: String,
}

impl From<&ItemFailure> for FailureEntry {
    fn from(failure: &ItemFailure) -> Self {
        Self {
            file: failure.id.clone(),
            kind: failure.error.kind(),
            message: failure.error.to_string(),
        }
    }
}

/// Delay of one capture.
#[derive(Debug, Clone, Serialize)]
pub struct DelayEntry {
    pub file: String,
    pub distance_m: Option<f64>,
    #[serde(flatten)]
    pub delay: EchoDelay,
}

#[derive(Debug, Serialize)]
pub struct DelaysReport {
    pub directory: PathBuf,
    pub threshold_fraction: f64,
    pub method: String,
    pub delays: Vec<DelayEntry>,
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Serialize)]
pub struct SpeedReport {
    pub directory: PathBuf,
    pub literature_speed: f64,
    pub outlier_multiplier: f64,
    pub points: Vec<CalibrationPoint>,
    pub estimate: SpeedEstimate,
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Serialize)]
pub struct CalibrationReport {
    pub directory: PathBuf,
    pub threshold_fraction: f64,
    pub points: Vec<CalibrationPoint>,
    pub fit: CalibrationFit,
    pub speed: DerivedSpeed,
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Serialize)]
pub struct MeasureReport {
    pub file: PathBuf,
    pub delay: EchoDelay,
    pub reference: DistanceReference,
    pub distance: DistanceEstimate,
    /// Present when the calibration was computed from a folder.
    pub calibration: Option<CalibrationReport>,
}

/// Run a command against loaded settings.
pub fn execute(command: &Commands, settings: &Settings) -> anyhow::Result<Report> {
    match command {
        Commands::Delays { dir } => run_delays(&data_dir(dir.as_deref(), settings), settings)
            .map(Report::Delays),
        Commands::Speed {
            dir,
            hard_replacement,
        } => run_speed(
            &data_dir(dir.as_deref(), settings),
            *hard_replacement,
            settings,
        )
        .map(Report::Speed),
        Commands::Calibrate { dir } => {
            run_calibrate(&data_dir(dir.as_deref(), settings), settings).map(Report::Calibrate)
        }
        Commands::Measure(args) => run_measure(args, settings).map(Report::Measure),
    }
}

fn data_dir(dir: Option<&Path>, settings: &Settings) -> PathBuf {
    dir.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&settings.paths.data_folder))
}

fn failures<T>(report: &BatchReport<T>) -> Vec<FailureEntry> {
    report.failures.iter().map(FailureEntry::from).collect()
}

/// Fail the command when an item failed for a reason shared by every item.
fn ensure_no_systemic_failure<T>(report: &BatchReport<T>) -> anyhow::Result<()> {
    match report.systemic_failures().next() {
        Some(failure) => bail!("{}: {}", failure.id, failure.error),
        None => Ok(()),
    }
}

/// Delays of every `.csv` capture in `dir`.
pub fn run_delays(dir: &Path, settings: &Settings) -> anyhow::Result<DelaysReport> {
    let files = discover_captures(dir)?;
    let estimator = settings.batch_estimator();
    let report = measure_delays(&files, &estimator, settings.calibration.csv_header_lines);
    ensure_no_systemic_failure(&report)?;

    let delays = report
        .successes
        .iter()
        .map(|(file, delay)| DelayEntry {
            file: file.clone(),
            distance_m: files
                .iter()
                .find(|f| &f.name == file)
                .and_then(|f| f.distance_m),
            delay: *delay,
        })
        .collect();

    Ok(DelaysReport {
        directory: dir.to_path_buf(),
        threshold_fraction: estimator.threshold_fraction(),
        method: estimator.method_name().to_string(),
        delays,
        failures: failures(&report),
    })
}

/// Measure labelled captures and collect them into a dataset.
fn labelled_dataset(
    dir: &Path,
    estimator: &DelayEstimator,
    settings: &Settings,
) -> anyhow::Result<(CalibrationDataset, Vec<FailureEntry>)> {
    let files: Vec<CaptureFile> = discover_captures(dir)?
        .into_iter()
        .filter(CaptureFile::is_labelled)
        .collect();
    if files.is_empty() {
        bail!("No Distance_<n>cm.csv captures found in {}", dir.display());
    }

    let report = measure_delays(&files, estimator, settings.calibration.csv_header_lines);
    ensure_no_systemic_failure(&report)?;
    let dataset = build_dataset(&files, &report);

    for point in dataset.points() {
        tracing::info!(
            "distance = {:.3} m, t = {:.6e} s",
            point.distance_m,
            point.delay_s
        );
    }

    Ok((dataset, failures(&report)))
}

/// Difference-method speed of sound over the labelled captures in `dir`.
pub fn run_speed(
    dir: &Path,
    hard_replacement: bool,
    settings: &Settings,
) -> anyhow::Result<SpeedReport> {
    let policy = settings.outlier_policy(hard_replacement)?;
    let (dataset, failures) = labelled_dataset(dir, &settings.batch_estimator(), settings)?;

    let estimate = aggregate_dataset(&dataset, &policy)
        .with_context(|| format!("Speed aggregation failed for {}", dir.display()))?;

    Ok(SpeedReport {
        directory: dir.to_path_buf(),
        literature_speed: policy.reference_speed,
        outlier_multiplier: policy.multiplier,
        points: dataset.points().to_vec(),
        estimate,
        failures,
    })
}

/// Linear calibration over the labelled captures in `dir`.
pub fn run_calibrate(dir: &Path, settings: &Settings) -> anyhow::Result<CalibrationReport> {
    calibrate_with(dir, &settings.batch_estimator(), settings)
}

fn calibrate_with(
    dir: &Path,
    estimator: &DelayEstimator,
    settings: &Settings,
) -> anyhow::Result<CalibrationReport> {
    let (dataset, failures) = labelled_dataset(dir, estimator, settings)?;

    let fit = fit_dataset(&dataset)
        .with_context(|| format!("Calibration failed for {}", dir.display()))?;
    let speed = fit.speed()?;

    tracing::info!(
        "Calibrated v = {:.1} ± {:.1} m/s from {} points",
        speed.speed_m_per_s,
        speed.uncertainty_m_per_s,
        fit.n_points
    );

    Ok(CalibrationReport {
        directory: dir.to_path_buf(),
        threshold_fraction: estimator.threshold_fraction(),
        points: dataset.points().to_vec(),
        fit,
        speed,
        failures,
    })
}

/// Distance of a single capture.
pub fn run_measure(args: &MeasureArgs, settings: &Settings) -> anyhow::Result<MeasureReport> {
    let estimator = settings.display_estimator();
    let (reference, calibration) = match (&args.calibration_dir, args.slope, args.intercept) {
        (Some(dir), _, _) => {
            // Calibrated with the same threshold as the measurement itself
            let calibration = calibrate_with(dir, &estimator, settings)?;
            (DistanceReference::from(calibration.fit), Some(calibration))
        }
        (None, Some(slope), Some(intercept)) => {
            let fit = CalibrationFit::from_coefficients(
                slope,
                intercept,
                args.slope_err,
                args.intercept_err,
            )?;
            (DistanceReference::from(fit), None)
        }
        _ => (settings.literature_reference(), None),
    };

    let capture = load_capture(&args.file, settings.calibration.csv_header_lines)?;
    let delay = estimator
        .estimate(&capture)
        .with_context(|| format!("No echo delay for {}", args.file.display()))?;

    let distance = resolve_distance(
        delay.time_delay_secs,
        &reference,
        settings.display.quantization_step_m,
    )?;

    tracing::info!(
        "{}: t = {:.6e} s, d = {:.3} m ({})",
        args.file.display(),
        delay.time_delay_secs,
        distance.raw_m,
        distance.method
    );

    Ok(MeasureReport {
        file: args.file.clone(),
        delay,
        reference,
        distance,
        calibration,
    })
}
