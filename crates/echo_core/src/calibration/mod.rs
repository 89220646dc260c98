//! Calibration of delay against known distances.
//!
//! Two independent evaluations of a calibration dataset:
//!
//! - **Linear fit** (`fit`): `t = m·d + b` with coefficient standard errors;
//!   the slope gives the propagation speed `v = 2/m`.
//! - **Difference method** (`speed`): pairwise speeds between adjacent
//!   distances with outlier clamping, then mean and standard error.

mod fit;
mod speed;
pub mod types;

pub use fit::{fit_calibration, fit_dataset, MIN_CALIBRATION_POINTS};
pub use speed::{
    aggregate_dataset, aggregate_speed, aggregate_speed_with_policy, HARD_REPLACEMENT_MULTIPLIER,
    SPEED_OUTLIER_MULTIPLIER,
};
pub use types::{
    CalibrationDataset, CalibrationFit, CalibrationPoint, DerivedSpeed, OutlierPolicy,
    SkippedPair, SpeedEstimate, SpeedSample, SPEED_OF_SOUND_AIR,
};
