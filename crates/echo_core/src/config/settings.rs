//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::analysis::{
    CorrelationMethodKind, DelayEstimator, BATCH_THRESHOLD_FRACTION, DISPLAY_THRESHOLD_FRACTION,
};
use crate::calibration::{
    OutlierPolicy, HARD_REPLACEMENT_MULTIPLIER, SPEED_OF_SOUND_AIR, SPEED_OUTLIER_MULTIPLIER,
};
use crate::capture::DEFAULT_HEADER_LINES;
use crate::distance::{DistanceReference, DEFAULT_QUANTIZATION_STEP_M};
use crate::errors::{check_fraction, check_positive, EchoResult};
use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Pulse and echo detection.
    #[serde(default)]
    pub detection: DetectionSettings,

    /// Calibration and speed aggregation.
    #[serde(default)]
    pub calibration: CalibrationSettings,

    /// Distance display.
    #[serde(default)]
    pub display: DisplaySettings,
}

impl Settings {
    /// Check every numeric setting for range.
    pub fn validate(&self) -> EchoResult<()> {
        check_fraction(
            "detection.batch_threshold_fraction",
            self.detection.batch_threshold_fraction,
        )?;
        check_fraction(
            "detection.display_threshold_fraction",
            self.detection.display_threshold_fraction,
        )?;
        check_positive(
            "calibration.literature_speed",
            self.calibration.literature_speed,
        )?;
        check_positive(
            "calibration.outlier_multiplier",
            self.calibration.outlier_multiplier,
        )?;
        check_positive(
            "calibration.hard_replacement_multiplier",
            self.calibration.hard_replacement_multiplier,
        )?;
        check_positive(
            "display.quantization_step_m",
            self.display.quantization_step_m,
        )?;
        Ok(())
    }

    /// Estimator for batch runs (delays, speed, calibration).
    pub fn batch_estimator(&self) -> DelayEstimator {
        DelayEstimator::new(
            self.detection.batch_threshold_fraction,
            self.detection.correlation_method,
        )
    }

    /// Estimator for single-shot distance measurement.
    pub fn display_estimator(&self) -> DelayEstimator {
        DelayEstimator::new(
            self.detection.display_threshold_fraction,
            self.detection.correlation_method,
        )
    }

    /// Outlier policy for speed aggregation.
    pub fn outlier_policy(&self, hard_replacement: bool) -> EchoResult<OutlierPolicy> {
        let multiplier = if hard_replacement {
            self.calibration.hard_replacement_multiplier
        } else {
            self.calibration.outlier_multiplier
        };
        OutlierPolicy::new(self.calibration.literature_speed, multiplier)
    }

    /// Literature-speed reference for distances without a calibration.
    pub fn literature_reference(&self) -> DistanceReference {
        DistanceReference::Literature {
            speed_m_per_s: self.calibration.literature_speed,
        }
    }
}

/// Path configuration for data and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Default folder with calibration captures.
    #[serde(default = "default_data_folder")]
    pub data_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_data_folder() -> String {
    "data".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_folder: default_data_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write a daily log file to `paths.logs_folder`.
    #[serde(default)]
    pub log_to_file: bool,
}

/// Pulse and echo detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Pulse threshold fraction for batch runs.
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold_fraction: f64,

    /// Pulse threshold fraction for single-shot display.
    #[serde(default = "default_display_threshold")]
    pub display_threshold_fraction: f64,

    /// Correlation implementation ("direct" or "fft").
    #[serde(default)]
    pub correlation_method: CorrelationMethodKind,
}

fn default_batch_threshold() -> f64 {
    BATCH_THRESHOLD_FRACTION
}

fn default_display_threshold() -> f64 {
    DISPLAY_THRESHOLD_FRACTION
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            batch_threshold_fraction: default_batch_threshold(),
            display_threshold_fraction: default_display_threshold(),
            correlation_method: CorrelationMethodKind::default(),
        }
    }
}

/// Calibration and speed aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSettings {
    /// Reference propagation speed in m/s.
    #[serde(default = "default_literature_speed")]
    pub literature_speed: f64,

    /// Outlier multiplier for the difference method.
    #[serde(default = "default_outlier_multiplier")]
    pub outlier_multiplier: f64,

    /// Outlier multiplier for the hard-replacement variant.
    #[serde(default = "default_hard_replacement_multiplier")]
    pub hard_replacement_multiplier: f64,

    /// Header lines to skip in capture CSV files.
    #[serde(default = "default_header_lines")]
    pub csv_header_lines: usize,
}

fn default_literature_speed() -> f64 {
    SPEED_OF_SOUND_AIR
}

fn default_outlier_multiplier() -> f64 {
    SPEED_OUTLIER_MULTIPLIER
}

fn default_hard_replacement_multiplier() -> f64 {
    HARD_REPLACEMENT_MULTIPLIER
}

fn default_header_lines() -> usize {
    DEFAULT_HEADER_LINES
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            literature_speed: default_literature_speed(),
            outlier_multiplier: default_outlier_multiplier(),
            hard_replacement_multiplier: default_hard_replacement_multiplier(),
            csv_header_lines: default_header_lines(),
        }
    }
}

/// Distance display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Display resolution in meters.
    #[serde(default = "default_quantization_step")]
    pub quantization_step_m: f64,
}

fn default_quantization_step() -> f64 {
    DEFAULT_QUANTIZATION_STEP_M
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            quantization_step_m: default_quantization_step(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Detection,
    Calibration,
    Display,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Detection,
        ConfigSection::Calibration,
        ConfigSection::Display,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Detection => "detection",
            ConfigSection::Calibration => "calibration",
            ConfigSection::Display => "display",
        }
    }

    /// Comment written above the section in generated files.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Data and log directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Detection => "Pulse and echo detection",
            ConfigSection::Calibration => "Calibration and speed of sound",
            ConfigSection::Display => "Distance display",
        }
    }
}
