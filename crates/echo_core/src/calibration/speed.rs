//! Propagation speed from a calibration dataset by the difference method.
//!
//! Adjacent points (in distance order) give `v = 2 * Δd / Δt`. A constant
//! delay offset shared by all measurements cancels in the difference.

use crate::errors::{EchoError, EchoResult};

use super::types::{CalibrationDataset, CalibrationPoint, OutlierPolicy, SkippedPair, SpeedEstimate, SpeedSample};

/// Outlier multiplier for difference-method aggregation.
pub const SPEED_OUTLIER_MULTIPLIER: f64 = 1.5;

/// Outlier multiplier for the hard-replacement variant.
pub const HARD_REPLACEMENT_MULTIPLIER: f64 = 2.0;

/// Aggregate pairwise speeds into mean, spread and standard error.
///
/// Samples above `outlier_multiplier * literature_speed` are replaced by
/// `literature_speed` and kept. Pairs with zero delay difference are skipped.
///
/// # Errors
/// * `InsufficientCalibrationPoints` - fewer than 2 points
/// * `NoValidSpeedSamples` - every pair was skipped
/// * `InvalidParameter` - non-positive speed or multiplier
pub fn aggregate_speed(
    points: &[CalibrationPoint],
    literature_speed: f64,
    outlier_multiplier: f64,
) -> EchoResult<SpeedEstimate> {
    let policy = OutlierPolicy::new(literature_speed, outlier_multiplier)?;
    aggregate_speed_with_policy(points, &policy)
}

/// Aggregate pairwise speeds with an explicit outlier policy.
///
/// Points are keyed by distance first; a later point at the same distance
/// replaces the earlier one.
pub fn aggregate_speed_with_policy(
    points: &[CalibrationPoint],
    policy: &OutlierPolicy,
) -> EchoResult<SpeedEstimate> {
    let dataset: CalibrationDataset = points.iter().copied().collect();
    aggregate_dataset(&dataset, policy)
}

/// Aggregate pairwise speeds over a dataset with unique, sorted distances.
pub fn aggregate_dataset(
    dataset: &CalibrationDataset,
    policy: &OutlierPolicy,
) -> EchoResult<SpeedEstimate> {
    let points = dataset.points();
    if points.len() < 2 {
        return Err(EchoError::InsufficientCalibrationPoints {
            got: points.len(),
            required: 2,
        });
    }

    let mut samples = Vec::with_capacity(points.len() - 1);
    let mut skipped = Vec::new();

    for pair in points.windows(2) {
        let (near, far) = (pair[0], pair[1]);
        let delta_d = far.distance_m - near.distance_m;
        let delta_t = far.delay_s - near.delay_s;

        if delta_t == 0.0 {
            tracing::warn!(
                "Delta t = 0 between {:.3} m and {:.3} m, skipping pair",
                near.distance_m,
                far.distance_m
            );
            skipped.push(SkippedPair {
                from_m: near.distance_m,
                to_m: far.distance_m,
            });
            continue;
        }

        // Factor 2: the delay covers the distance twice
        let raw_speed = 2.0 * delta_d / delta_t;
        let (speed, clamped) = policy.apply(raw_speed);
        if clamped {
            tracing::warn!(
                "Outlier between {:.3} m and {:.3} m: v = {:.2} m/s replaced by {} m/s",
                near.distance_m,
                far.distance_m,
                raw_speed,
                policy.reference_speed
            );
        }

        samples.push(SpeedSample {
            from_m: near.distance_m,
            to_m: far.distance_m,
            raw_speed,
            speed,
            clamped,
        });
    }

    if samples.is_empty() {
        return Err(EchoError::NoValidSpeedSamples);
    }

    let speeds: Vec<f64> = samples.iter().map(|s| s.speed).collect();
    let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
    let std_dev = sample_std_dev(&speeds, mean);
    let std_error = std_dev / (speeds.len() as f64).sqrt();

    tracing::info!(
        "Speed of sound: {:.2} m/s (std {:.2} m/s, std of mean {:.2} m/s, {} samples)",
        mean,
        std_dev,
        std_error,
        speeds.len()
    );

    Ok(SpeedEstimate {
        mean,
        std_dev,
        std_error,
        samples,
        skipped,
    })
}

/// Bessel-corrected standard deviation; 0.0 for fewer than 2 values.
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
