//! Calibration data types.

use serde::{Deserialize, Serialize};

use crate::errors::{check_positive, EchoError, EchoResult};

/// Speed of sound in air at 20 °C, in m/s.
pub const SPEED_OF_SOUND_AIR: f64 = 343.0;

/// A known distance paired with its measured round-trip delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Ground-truth distance in meters.
    pub distance_m: f64,
    /// Measured round-trip delay in seconds.
    pub delay_s: f64,
}

impl CalibrationPoint {
    /// Create a new calibration point.
    pub fn new(distance_m: f64, delay_s: f64) -> Self {
        Self {
            distance_m,
            delay_s,
        }
    }
}

/// Calibration points keyed by distance, kept in ascending distance order.
///
/// Inserting a distance that is already present replaces its delay.
/// Serialized as a plain list of points; deserialization goes through
/// `insert`, so the ordering and uniqueness hold for loaded data too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CalibrationPoint>", into = "Vec<CalibrationPoint>")]
pub struct CalibrationDataset {
    points: Vec<CalibrationPoint>,
}

impl CalibrationDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point, returning the delay it replaced (if any).
    pub fn insert(&mut self, distance_m: f64, delay_s: f64) -> EchoResult<Option<f64>> {
        if !distance_m.is_finite() || !delay_s.is_finite() {
            return Err(EchoError::invalid_parameter(
                "calibration_point",
                format!("non-finite point ({}, {})", distance_m, delay_s),
            ));
        }

        match self
            .points
            .binary_search_by(|p| p.distance_m.total_cmp(&distance_m))
        {
            Ok(idx) => {
                let previous = self.points[idx].delay_s;
                self.points[idx].delay_s = delay_s;
                Ok(Some(previous))
            }
            Err(idx) => {
                self.points
                    .insert(idx, CalibrationPoint::new(distance_m, delay_s));
                Ok(None)
            }
        }
    }

    /// Points in ascending distance order.
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<CalibrationPoint> for CalibrationDataset {
    /// Collect points; later duplicates overwrite earlier ones, non-finite points are dropped.
    fn from_iter<I: IntoIterator<Item = CalibrationPoint>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for point in iter {
            match dataset.insert(point.distance_m, point.delay_s) {
                Ok(Some(previous)) => tracing::debug!(
                    "Distance {:.3} m given twice, {:.6e} s replaces {:.6e} s",
                    point.distance_m,
                    point.delay_s,
                    previous
                ),
                Ok(None) => {}
                Err(e) => tracing::warn!("Dropping calibration point: {}", e),
            }
        }
        dataset
    }
}

impl From<Vec<CalibrationPoint>> for CalibrationDataset {
    fn from(points: Vec<CalibrationPoint>) -> Self {
        points.into_iter().collect()
    }
}

impl From<CalibrationDataset> for Vec<CalibrationPoint> {
    fn from(dataset: CalibrationDataset) -> Self {
        dataset.points
    }
}

/// Linear calibration `delay = slope * distance + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFit {
    /// Slope m in s/m.
    pub slope: f64,
    /// Intercept b in s.
    pub intercept: f64,
    /// Standard error of the slope.
    pub slope_std_err: f64,
    /// Standard error of the intercept.
    pub intercept_std_err: f64,
    /// Covariance of slope and intercept.
    pub covariance: f64,
    /// Number of points used in the fit.
    pub n_points: usize,
    /// Residual degrees of freedom (n - 2).
    pub degrees_of_freedom: usize,
    /// Coefficient of determination.
    pub r_squared: f64,
}

impl CalibrationFit {
    /// Build a calibration from known coefficients (e.g. entered by hand).
    pub fn from_coefficients(
        slope: f64,
        intercept: f64,
        slope_std_err: f64,
        intercept_std_err: f64,
    ) -> EchoResult<Self> {
        if !slope.is_finite() || slope == 0.0 {
            return Err(EchoError::InvalidCalibration { slope });
        }
        for (name, value) in [
            ("intercept", intercept),
            ("slope_std_err", slope_std_err),
            ("intercept_std_err", intercept_std_err),
        ] {
            if !value.is_finite() {
                return Err(EchoError::invalid_parameter(name, "must be finite"));
            }
        }

        Ok(Self {
            slope,
            intercept,
            slope_std_err: slope_std_err.abs(),
            intercept_std_err: intercept_std_err.abs(),
            covariance: 0.0,
            n_points: 0,
            degrees_of_freedom: 0,
            r_squared: f64::NAN,
        })
    }

    /// Predicted round-trip delay for a distance.
    pub fn predict_delay(&self, distance_m: f64) -> f64 {
        self.slope * distance_m + self.intercept
    }

    /// Propagation speed implied by the slope: `v = 2 / m`.
    pub fn speed(&self) -> EchoResult<DerivedSpeed> {
        if !self.slope.is_finite() || self.slope == 0.0 {
            return Err(EchoError::InvalidCalibration { slope: self.slope });
        }

        let speed_m_per_s = 2.0 / self.slope;
        // dv/dm = -2/m²; the intercept does not enter
        let uncertainty_m_per_s = 2.0 / (self.slope * self.slope) * self.slope_std_err;

        Ok(DerivedSpeed {
            speed_m_per_s,
            uncertainty_m_per_s,
        })
    }
}

impl std::fmt::Display for CalibrationFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t(d) = {:.2e} * d + {:.2e}", self.slope, self.intercept)
    }
}

/// Propagation speed derived from a calibration slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedSpeed {
    /// Speed in m/s.
    pub speed_m_per_s: f64,
    /// First-order uncertainty in m/s.
    pub uncertainty_m_per_s: f64,
}

/// One pairwise speed computed by the difference method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    /// Shorter distance of the pair (m).
    pub from_m: f64,
    /// Longer distance of the pair (m).
    pub to_m: f64,
    /// Speed before outlier handling (m/s).
    pub raw_speed: f64,
    /// Speed that entered the statistics (m/s).
    pub speed: f64,
    /// Whether the raw speed was replaced by the reference speed.
    pub clamped: bool,
}

/// An adjacent pair skipped because both delays were equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    /// Shorter distance of the pair (m).
    pub from_m: f64,
    /// Longer distance of the pair (m).
    pub to_m: f64,
}

/// Aggregated propagation speed from pairwise samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedEstimate {
    /// Mean speed (m/s).
    pub mean: f64,
    /// Standard deviation of the individual samples, n-1 divisor (m/s).
    pub std_dev: f64,
    /// Standard error of the mean (m/s).
    pub std_error: f64,
    /// Samples that entered the statistics.
    pub samples: Vec<SpeedSample>,
    /// Pairs skipped because of zero delay difference.
    pub skipped: Vec<SkippedPair>,
}

impl SpeedEstimate {
    /// Number of samples that were clamped to the reference speed.
    pub fn clamped_count(&self) -> usize {
        self.samples.iter().filter(|s| s.clamped).count()
    }
}

/// Outlier handling for pairwise speeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierPolicy {
    /// Reference propagation speed (m/s).
    pub reference_speed: f64,
    /// Samples above `multiplier * reference_speed` are replaced by the reference.
    pub multiplier: f64,
}

impl OutlierPolicy {
    /// Create a policy, validating both values.
    pub fn new(reference_speed: f64, multiplier: f64) -> EchoResult<Self> {
        check_positive("literature_speed", reference_speed)?;
        check_positive("outlier_multiplier", multiplier)?;
        Ok(Self {
            reference_speed,
            multiplier,
        })
    }

    /// Speed above which a sample is clamped.
    pub fn limit(&self) -> f64 {
        self.multiplier * self.reference_speed
    }

    /// Apply the policy to a raw sample. Returns `(speed, clamped)`.
    pub fn apply(&self, raw_speed: f64) -> (f64, bool) {
        if raw_speed > self.limit() {
            (self.reference_speed, true)
        } else {
            (raw_speed, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_keeps_points_sorted() {
        let mut dataset = CalibrationDataset::new();
        dataset.insert(0.3, 3e-3).unwrap();
        dataset.insert(0.1, 1e-3).unwrap();
        dataset.insert(0.2, 2e-3).unwrap();

        let distances: Vec<f64> = dataset.points().iter().map(|p| p.distance_m).collect();
        assert_eq!(distances, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn duplicate_distance_overwrites() {
        let mut dataset = CalibrationDataset::new();
        assert_eq!(dataset.insert(0.1, 1e-3).unwrap(), None);
        assert_eq!(dataset.insert(0.1, 2e-3).unwrap(), Some(1e-3));
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.points()[0].delay_s, 2e-3);
    }

    #[derive(Debug, Deserialize)]
    struct Stored {
        dataset: CalibrationDataset,
    }

    #[test]
    fn deserialized_dataset_is_sorted_and_unique() {
        let input = r#"
            dataset = [
                { distance_m = 0.3, delay_s = 3.0e-3 },
                { distance_m = 0.1, delay_s = 1.0e-3 },
                { distance_m = 0.3, delay_s = 3.5e-3 },
            ]
        "#;
        let stored: Stored = toml::from_str(input).unwrap();

        assert_eq!(
            stored.dataset.points(),
            &[
                CalibrationPoint::new(0.1, 1.0e-3),
                CalibrationPoint::new(0.3, 3.5e-3)
            ]
        );
    }

    #[test]
    fn non_finite_point_rejected() {
        let mut dataset = CalibrationDataset::new();
        assert!(dataset.insert(f64::NAN, 1e-3).is_err());
        assert!(dataset.is_empty());
    }

    #[test]
    fn from_coefficients_rejects_zero_slope() {
        assert!(matches!(
            CalibrationFit::from_coefficients(0.0, 1e-4, 0.0, 0.0),
            Err(EchoError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn derived_speed_from_slope() {
        // m = 2/343 -> v = 343
        let fit = CalibrationFit::from_coefficients(2.0 / 343.0, 0.0, 1e-5, 0.0).unwrap();
        let speed = fit.speed().unwrap();
        assert!((speed.speed_m_per_s - 343.0).abs() < 1e-9);
        let expected = 2.0 / (fit.slope * fit.slope) * 1e-5;
        assert!((speed.uncertainty_m_per_s - expected).abs() < 1e-12);
    }

    #[test]
    fn outlier_policy_clamps_to_reference() {
        let policy = OutlierPolicy::new(343.0, 1.5).unwrap();
        assert_eq!(policy.apply(600.0), (343.0, true));
        assert_eq!(policy.apply(514.5), (514.5, false));
        assert_eq!(policy.apply(-50.0), (-50.0, false));
    }

    #[test]
    fn calibration_display_matches_report_format() {
        let fit = CalibrationFit::from_coefficients(5.83e-3, 6.4e-4, 0.0, 0.0).unwrap();
        assert_eq!(fit.to_string(), "t(d) = 5.83e-3 * d + 6.40e-4");
    }
}
