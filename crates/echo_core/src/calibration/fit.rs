//! Linear calibration fit of delay against distance.
//!
//! Ordinary least squares with the coefficient covariance scaled by the
//! residual variance `SSR / (n - 2)`, the same scaling NumPy's
//! `polyfit(..., cov=True)` applies.

use crate::errors::{EchoError, EchoResult};

use super::types::{CalibrationDataset, CalibrationFit, CalibrationPoint};

/// Minimum number of points for a line fit.
pub const MIN_CALIBRATION_POINTS: usize = 2;

/// Fit `delay = slope * distance + intercept` with standard errors.
///
/// Points are keyed by distance first; a later point at the same distance
/// replaces the earlier one.
///
/// # Errors
/// * `InsufficientCalibrationPoints` - fewer than 2 distinct distances
/// * `DegenerateFit` - the distances cannot be told apart numerically
/// * `InvalidCalibration` - the fitted slope is zero
///
/// With exactly 2 points there are no residual degrees of freedom; the line
/// passes through both points and both standard errors are 0.
pub fn fit_calibration(points: &[CalibrationPoint]) -> EchoResult<CalibrationFit> {
    let dataset: CalibrationDataset = points.iter().copied().collect();
    fit_dataset(&dataset)
}

/// Fit a dataset whose distances are already unique.
pub fn fit_dataset(dataset: &CalibrationDataset) -> EchoResult<CalibrationFit> {
    let points = dataset.points();
    let n_points = points.len();
    if n_points < MIN_CALIBRATION_POINTS {
        return Err(EchoError::InsufficientCalibrationPoints {
            got: n_points,
            required: MIN_CALIBRATION_POINTS,
        });
    }

    let n = n_points as f64;
    let x_mean = points.iter().map(|p| p.distance_m).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.delay_s).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut sum_x2 = 0.0;
    for p in points {
        let dx = p.distance_m - x_mean;
        sxx += dx * dx;
        sxy += dx * (p.delay_s - y_mean);
        sum_x2 += p.distance_m * p.distance_m;
    }

    if !sxx.is_finite() || sxx <= f64::EPSILON * sum_x2 {
        return Err(EchoError::DegenerateFit(format!(
            "{} points do not span more than one distance",
            n_points
        )));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    if !slope.is_finite() || slope == 0.0 {
        return Err(EchoError::InvalidCalibration { slope });
    }

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for p in points {
        let predicted = slope * p.distance_m + intercept;
        ss_res += (p.delay_s - predicted).powi(2);
        ss_tot += (p.delay_s - y_mean).powi(2);
    }

    let degrees_of_freedom = n_points - MIN_CALIBRATION_POINTS;
    let residual_variance = if degrees_of_freedom > 0 {
        ss_res / degrees_of_freedom as f64
    } else {
        0.0
    };

    let slope_var = residual_variance / sxx;
    let intercept_var = residual_variance * sum_x2 / (n * sxx);
    let covariance = -x_mean * residual_variance / sxx;

    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).max(0.0)
    } else {
        1.0
    };

    let fit = CalibrationFit {
        slope,
        intercept,
        slope_std_err: slope_var.sqrt(),
        intercept_std_err: intercept_var.sqrt(),
        covariance,
        n_points,
        degrees_of_freedom,
        r_squared,
    };

    tracing::debug!(
        "Calibration fit over {} points: {} (dm={:.2e}, db={:.2e}, R²={:.4})",
        n_points,
        fit,
        fit.slope_std_err,
        fit.intercept_std_err,
        fit.r_squared
    );

    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(pairs: &[(f64, f64)]) -> Vec<CalibrationPoint> {
        pairs
            .iter()
            .map(|&(d, t)| CalibrationPoint::new(d, t))
            .collect()
    }

    /// Measured series from the lab sessions (distance m, delay s).
    fn lab_series() -> Vec<CalibrationPoint> {
        points(&[
            (0.05, 9.38e-04),
            (0.10, 1.248e-03),
            (0.15, 1.880e-03),
            (0.20, 2.110e-03),
            (0.25, 2.400e-03),
            (0.30, 2.645e-03),
            (0.35, 2.985e-03),
            (0.40, 3.2425e-03),
            (0.45, 3.4875e-03),
            (0.50, 3.875e-03),
            (0.55, 4.66e-03),
            (0.60, 4.95e-03),
            (0.65, 5.135e-03),
            (0.70, 5.5e-03),
            (0.75, 5.8e-03),
            (0.80, 6.025e-03),
            (0.85, 6.3e-03),
        ])
    }

    #[test]
    fn two_points_give_exact_line() {
        let pts = points(&[(0.1, 1.0e-3), (0.3, 2.0e-3)]);
        let fit = fit_calibration(&pts).unwrap();

        assert!((fit.slope - 5.0e-3).abs() < 1e-15);
        assert!((fit.intercept - 5.0e-4).abs() < 1e-15);
        for p in &pts {
            assert!((fit.predict_delay(p.distance_m) - p.delay_s).abs() < 1e-15);
        }
        assert_eq!(fit.slope_std_err, 0.0);
        assert_eq!(fit.intercept_std_err, 0.0);
        assert_eq!(fit.degrees_of_freedom, 0);
    }

    #[test]
    fn perfect_line_has_zero_errors() {
        let pts: Vec<CalibrationPoint> = (1..=5)
            .map(|i| {
                let d = i as f64 * 0.25;
                CalibrationPoint::new(d, 0.004 * d + 0.001)
            })
            .collect();
        let fit = fit_calibration(&pts).unwrap();
        assert!((fit.slope - 0.004).abs() < 1e-12);
        assert!((fit.intercept - 0.001).abs() < 1e-12);
        assert!(fit.slope_std_err < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn standard_errors_match_closed_form() {
        // x = 0, 1, 2, 3; y = 0, 1, 1, 3
        // slope = 0.9, intercept = -0.1, SSR = 0.7, s² = 0.35, Sxx = 5
        let pts = points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 3.0)]);
        let fit = fit_calibration(&pts).unwrap();

        assert!((fit.slope - 0.9).abs() < 1e-12);
        assert!((fit.intercept + 0.1).abs() < 1e-12);
        assert!((fit.slope_std_err - (0.35_f64 / 5.0).sqrt()).abs() < 1e-12);
        // var(b) = s² * Σx² / (n * Sxx) = 0.35 * 14 / 20
        assert!((fit.intercept_std_err - (0.35_f64 * 14.0 / 20.0).sqrt()).abs() < 1e-12);
        assert!((fit.covariance - (-1.5 * 0.35 / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn lab_series_gives_plausible_speed() {
        let fit = fit_calibration(&lab_series()).unwrap();
        let speed = fit.speed().unwrap();

        assert!(fit.slope > 0.0);
        assert!(fit.intercept > 0.0);
        assert!(speed.speed_m_per_s > 250.0 && speed.speed_m_per_s < 400.0);
        assert!(speed.uncertainty_m_per_s > 0.0);
        assert!(fit.r_squared > 0.95);
    }

    #[test]
    fn single_point_is_insufficient() {
        let pts = points(&[(0.1, 1e-3)]);
        assert!(matches!(
            fit_calibration(&pts),
            Err(EchoError::InsufficientCalibrationPoints { got: 1, required: 2 })
        ));
    }

    #[test]
    fn identical_distances_collapse_to_one_point() {
        let pts = points(&[(0.2, 1e-3), (0.2, 2e-3), (0.2, 3e-3)]);
        assert!(matches!(
            fit_calibration(&pts),
            Err(EchoError::InsufficientCalibrationPoints { got: 1, required: 2 })
        ));
    }

    #[test]
    fn duplicate_distance_keeps_later_delay() {
        // (0.1, 1.2e-3) replaces (0.1, 1.0e-3)
        let pts = points(&[(0.1, 1.0e-3), (0.1, 1.2e-3), (0.2, 2.0e-3)]);
        let fit = fit_calibration(&pts).unwrap();

        assert_eq!(fit.n_points, 2);
        assert_eq!(fit.degrees_of_freedom, 0);
        assert!((fit.slope - 8.0e-3).abs() < 1e-12);
        assert!((fit.predict_delay(0.1) - 1.2e-3).abs() < 1e-15);
    }

    #[test]
    fn indistinguishable_distances_are_degenerate() {
        // Distinct f64 values whose spread is below the precision of Σx²
        let pts = points(&[(1.0e10, 1e-3), (1.0e10 + 1.0e-5, 2e-3)]);
        assert!(matches!(
            fit_calibration(&pts),
            Err(EchoError::DegenerateFit(_))
        ));
    }

    #[test]
    fn dataset_fit_matches_slice_fit() {
        let series = lab_series();
        let dataset: CalibrationDataset = series.iter().copied().collect();
        assert_eq!(fit_dataset(&dataset).unwrap(), fit_calibration(&series).unwrap());
    }

    #[test]
    fn constant_delay_is_invalid_calibration() {
        let pts = points(&[(0.1, 1e-3), (0.2, 1e-3)]);
        assert!(matches!(
            fit_calibration(&pts),
            Err(EchoError::InvalidCalibration { .. })
        ));
    }
}
