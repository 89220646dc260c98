//! Echo Core - Backend logic for Echo Ranger
//!
//! Estimates distance from the round-trip time of an ultrasonic pulse:
//! the transmit pulse is located in the send signal, its echo is found in the
//! receive signal by cross-correlation, and the delay is mapped to a distance
//! through a literature speed of sound or a measured linear calibration.
//!
//! This crate has no UI dependencies; the `echo-ranger` binary is a thin
//! front end over it.

pub mod analysis;
pub mod batch;
pub mod calibration;
pub mod capture;
pub mod config;
pub mod distance;
pub mod errors;
pub mod logging;

pub use analysis::estimate_delay;
pub use calibration::{aggregate_speed, fit_calibration};
pub use distance::resolve_distance;
pub use errors::{EchoError, EchoResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
