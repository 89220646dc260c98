//! Distance resolution from a single round-trip delay.
//!
//! Pure functions - no I/O, no side effects.

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationFit, SPEED_OF_SOUND_AIR};
use crate::errors::{check_positive, EchoError, EchoResult};

/// Default display resolution in meters (5 cm).
pub const DEFAULT_QUANTIZATION_STEP_M: f64 = 0.05;

/// How a delay is converted into a distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DistanceReference {
    /// Invert a measured linear calibration.
    Calibrated(CalibrationFit),
    /// Assume a propagation speed.
    Literature { speed_m_per_s: f64 },
}

impl DistanceReference {
    /// Literature reference for air at 20 °C.
    pub fn air() -> Self {
        DistanceReference::Literature {
            speed_m_per_s: SPEED_OF_SOUND_AIR,
        }
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            DistanceReference::Calibrated(_) => "calibrated",
            DistanceReference::Literature { .. } => "literature",
        }
    }
}

impl From<CalibrationFit> for DistanceReference {
    fn from(fit: CalibrationFit) -> Self {
        DistanceReference::Calibrated(fit)
    }
}

/// Distance estimated from one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceEstimate {
    /// Unrounded distance in meters.
    pub raw_m: f64,
    /// Distance rounded to the display step, in meters.
    pub displayed_m: f64,
    /// Propagated uncertainty in meters.
    pub uncertainty_m: f64,
    /// Reference used ("calibrated" or "literature").
    pub method: &'static str,
}

impl DistanceEstimate {
    /// Displayed distance in centimeters.
    pub fn displayed_cm(&self) -> f64 {
        self.displayed_m * 100.0
    }

    /// Uncertainty in centimeters.
    pub fn uncertainty_cm(&self) -> f64 {
        self.uncertainty_m * 100.0
    }
}

impl std::fmt::Display for DistanceEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.0} cm ± {:.1} cm",
            self.displayed_cm(),
            self.uncertainty_cm()
        )
    }
}

/// Convert a round-trip delay into a distance.
///
/// # Arguments
/// * `delay_s` - Round-trip delay in seconds (treated as exact)
/// * `reference` - Calibration fit or literature speed
/// * `quantization_step_m` - Display resolution in meters
///
/// With a calibration, `d = (t - b) / m` and the uncertainty propagates
/// the slope and intercept errors. With a literature speed,
/// `d = t * v / 2` and the uncertainty is 0.
pub fn resolve_distance(
    delay_s: f64,
    reference: &DistanceReference,
    quantization_step_m: f64,
) -> EchoResult<DistanceEstimate> {
    check_positive("quantization_step", quantization_step_m)?;
    if !delay_s.is_finite() {
        return Err(EchoError::invalid_parameter("delay", "must be finite"));
    }

    let (raw_m, uncertainty_m) = match reference {
        DistanceReference::Calibrated(fit) => {
            let m = fit.slope;
            if !m.is_finite() || m == 0.0 {
                return Err(EchoError::InvalidCalibration { slope: m });
            }

            let distance = (delay_s - fit.intercept) / m;
            // ∂d/∂m = -(t - b)/m² = -d/m, ∂d/∂b = -1/m
            let from_slope = distance / m * fit.slope_std_err;
            let from_intercept = fit.intercept_std_err / m;
            let uncertainty = (from_slope.powi(2) + from_intercept.powi(2)).sqrt();
            (distance, uncertainty)
        }
        DistanceReference::Literature { speed_m_per_s } => {
            check_positive("literature_speed", *speed_m_per_s)?;
            (delay_s * speed_m_per_s / 2.0, 0.0)
        }
    };

    let displayed_m = quantize(raw_m, quantization_step_m);

    tracing::debug!(
        "Resolved {:.6e} s to {:.4} m (displayed {:.2} m, ±{:.4} m, {})",
        delay_s,
        raw_m,
        displayed_m,
        uncertainty_m,
        reference.label()
    );

    Ok(DistanceEstimate {
        raw_m,
        displayed_m,
        uncertainty_m,
        method: reference.label(),
    })
}

/// Round to the nearest multiple of `step`, ties to even.
fn quantize(value: f64, step: f64) -> f64 {
    (value / step).round_ties_even() * step
}
