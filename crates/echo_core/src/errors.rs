//! Error types for echo ranging operations.
//!
//! Per-measurement errors (pulse, delay, parse) are isolated by the batch
//! runner; aggregate errors (calibration, speed) are returned to the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the echo ranging engine.
#[derive(Error, Debug)]
pub enum EchoError {
    /// No send sample exceeded the pulse detection threshold.
    #[error("No valid pulse found in send signal (threshold fraction {threshold_fraction})")]
    NoPulseDetected { threshold_fraction: f64 },

    /// The correlation search window past the direct-coupling zone is empty.
    #[error(
        "Insufficient data for echo detection: search starts at {search_start} \
         but correlation has only {correlation_len} values"
    )]
    InsufficientData {
        search_start: usize,
        correlation_len: usize,
    },

    /// Too few samples to derive a sampling period.
    #[error("Insufficient samples: got {got}, need at least {required}")]
    InsufficientSamples { got: usize, required: usize },

    /// Input could not be interpreted as a capture.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Not enough calibration points for a fit or aggregation.
    #[error("Insufficient calibration points: got {got}, need at least {required}")]
    InsufficientCalibrationPoints { got: usize, required: usize },

    /// Calibration points do not determine a line.
    #[error("Degenerate calibration fit: {0}")]
    DegenerateFit(String),

    /// Every adjacent distance pair was skipped.
    #[error("No valid speed samples could be computed")]
    NoValidSpeedSamples,

    /// Calibration slope cannot be inverted.
    #[error("Invalid calibration: slope {slope} cannot be inverted")]
    InvalidCalibration { slope: f64 },

    /// A configuration value is out of range.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// File access failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EchoError {
    /// Create a malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EchoError::NoPulseDetected { .. } => "no_pulse_detected",
            EchoError::InsufficientData { .. } => "insufficient_data",
            EchoError::InsufficientSamples { .. } => "insufficient_samples",
            EchoError::MalformedInput(_) => "malformed_input",
            EchoError::InsufficientCalibrationPoints { .. } => "insufficient_calibration_points",
            EchoError::DegenerateFit(_) => "degenerate_fit",
            EchoError::NoValidSpeedSamples => "no_valid_speed_samples",
            EchoError::InvalidCalibration { .. } => "invalid_calibration",
            EchoError::InvalidParameter { .. } => "invalid_parameter",
            EchoError::Io { .. } => "io",
        }
    }

    /// Whether this error only affects a single measurement.
    ///
    /// Batch runs record these per item as warnings and continue; any
    /// other error shows up in `BatchReport::systemic_failures`.
    pub fn is_per_measurement(&self) -> bool {
        matches!(
            self,
            EchoError::NoPulseDetected { .. }
                | EchoError::InsufficientData { .. }
                | EchoError::InsufficientSamples { .. }
                | EchoError::MalformedInput(_)
                | EchoError::Io { .. }
        )
    }
}

/// Type alias for echo ranging results.
pub type EchoResult<T> = Result<T, EchoError>;

/// Check that a threshold fraction lies strictly between 0 and 1.
pub(crate) fn check_fraction(name: &str, value: f64) -> EchoResult<()> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(EchoError::invalid_parameter(
            name,
            format!("must be in (0, 1), got {}", value),
        ))
    }
}

/// Check that a value is finite and strictly positive.
pub(crate) fn check_positive(name: &str, value: f64) -> EchoResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EchoError::invalid_parameter(
            name,
            format!("must be positive and finite, got {}", value),
        ))
    }
}
