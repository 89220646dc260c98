//! Directory discovery and batch processing of captures.
//!
//! Each capture is processed independently. A failure in one capture is
//! recorded in the report and does not stop the others; only the
//! aggregation that follows (fit, speed) can fail as a whole.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::analysis::{DelayEstimator, EchoDelay};
use crate::calibration::CalibrationDataset;
use crate::capture::{distance_label, load_capture};
use crate::errors::{EchoError, EchoResult};

/// A capture file found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name, used as the item id in reports.
    pub name: String,
    /// Distance label in meters, if the name carries one.
    pub distance_m: Option<f64>,
}

impl CaptureFile {
    /// Create an entry from a path, reading the distance label from its name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let distance_m = distance_label(&name);

        Self {
            path,
            name,
            distance_m,
        }
    }

    /// Whether the file name carries a distance label.
    pub fn is_labelled(&self) -> bool {
        self.distance_m.is_some()
    }
}

/// Something a batch can process and report on.
pub trait BatchItem {
    /// Identifier used in the report.
    fn id(&self) -> String;
}

impl BatchItem for CaptureFile {
    fn id(&self) -> String {
        self.name.clone()
    }
}

/// A single failed item.
#[derive(Debug)]
pub struct ItemFailure {
    /// Item identifier.
    pub id: String,
    /// Why the item failed.
    pub error: EchoError,
}

/// Outcome of a batch: successes and failures, each in input order.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Successful items as `(id, value)`.
    pub successes: Vec<(String, T)>,
    /// Failed items.
    pub failures: Vec<ItemFailure>,
}

impl<T> BatchReport<T> {
    /// Number of processed items.
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Whether every item succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Look up the value for an item id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.successes
            .iter()
            .find(|(item_id, _)| item_id == id)
            .map(|(_, value)| value)
    }

    /// Failures that are not specific to their item.
    ///
    /// An error outside the per-measurement taxonomy (for example an
    /// invalid parameter) would repeat for every item of the batch.
    pub fn systemic_failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.failures
            .iter()
            .filter(|failure| !failure.error.is_per_measurement())
    }
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// List `.csv` files in a directory, sorted by name.
///
/// The extension check ignores case. Subdirectories are not scanned.
pub fn discover_captures(dir: &Path) -> EchoResult<Vec<CaptureFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| EchoError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EchoError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            files.push(CaptureFile::from_path(path));
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(
        "Discovered {} capture file(s) in {} ({} labelled)",
        files.len(),
        dir.display(),
        files.iter().filter(|f| f.is_labelled()).count()
    );

    Ok(files)
}

/// Process items in parallel, isolating per-item errors.
pub fn run_batch<I, T, F>(items: &[I], f: F) -> BatchReport<T>
where
    I: BatchItem + Sync,
    T: Send,
    F: Fn(&I) -> EchoResult<T> + Sync + Send,
{
    let results: Vec<(String, EchoResult<T>)> =
        items.par_iter().map(|item| (item.id(), f(item))).collect();

    let mut report = BatchReport::default();
    for (id, result) in results {
        match result {
            Ok(value) => report.successes.push((id, value)),
            Err(error) => {
                if error.is_per_measurement() {
                    tracing::warn!("{}: {}", id, error);
                } else {
                    tracing::error!("{}: {}", id, error);
                }
                report.failures.push(ItemFailure { id, error });
            }
        }
    }

    tracing::debug!(
        "Batch finished: {} succeeded, {} failed",
        report.successes.len(),
        report.failures.len()
    );

    report
}

/// Load every capture and estimate its echo delay.
pub fn measure_delays(
    files: &[CaptureFile],
    estimator: &DelayEstimator,
    header_lines: usize,
) -> BatchReport<EchoDelay> {
    run_batch(files, |file| {
        let capture = load_capture(&file.path, header_lines)?;
        let delay = estimator.estimate(&capture)?;
        tracing::info!(
            "{}: delay = {:.3} ms ({} samples)",
            file.name,
            delay.time_delay_ms(),
            delay.sample_delay
        );
        Ok(delay)
    })
}

/// Build a calibration dataset from labelled successes.
///
/// Items are visited in report order; a later file with the same distance
/// replaces the earlier one.
pub fn build_dataset(files: &[CaptureFile], report: &BatchReport<EchoDelay>) -> CalibrationDataset {
    let labels: HashMap<&str, Option<f64>> = files
        .iter()
        .map(|f| (f.name.as_str(), f.distance_m))
        .collect();

    let mut dataset = CalibrationDataset::new();
    for (id, delay) in &report.successes {
        let Some(distance_m) = labels.get(id.as_str()).copied().flatten() else {
            tracing::debug!("{}: no distance label, not used for calibration", id);
            continue;
        };

        match dataset.insert(distance_m, delay.time_delay_secs) {
            Ok(Some(previous)) => tracing::warn!(
                "{}: distance {:.3} m already measured ({:.6e} s), overwriting with {:.6e} s",
                id,
                distance_m,
                previous,
                delay.time_delay_secs
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!("{}: {}", id, e),
        }
    }

    dataset
}
