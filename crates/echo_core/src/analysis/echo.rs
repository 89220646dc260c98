//! Echo delay estimation.
//!
//! Pure functions that turn a capture into a round-trip time. The receive
//! signal is correlated against the detected transmit pulse; the echo is the
//! correlation maximum after skipping one template length past zero lag,
//! which excludes the direct transmit-to-receive coupling.

use crate::errors::{check_positive, EchoError, EchoResult};

use super::methods::{create_from_kind, CorrelationMethod, CorrelationMethodKind, Direct};
use super::pulse::{locate_pulse, BATCH_THRESHOLD_FRACTION, DISPLAY_THRESHOLD_FRACTION};
use super::types::{EchoCapture, EchoDelay, Template};

/// Configured delay estimator.
pub struct DelayEstimator {
    /// Pulse detection threshold as a fraction of the send peak.
    threshold_fraction: f64,
    /// Correlation implementation.
    method: Box<dyn CorrelationMethod>,
}

impl DelayEstimator {
    /// Create an estimator with the given threshold and correlation method.
    pub fn new(threshold_fraction: f64, kind: CorrelationMethodKind) -> Self {
        Self {
            threshold_fraction,
            method: create_from_kind(kind),
        }
    }

    /// Estimator for batch calibration and analysis (5% threshold).
    pub fn batch() -> Self {
        Self::new(BATCH_THRESHOLD_FRACTION, CorrelationMethodKind::Direct)
    }

    /// Estimator for single-shot distance display (10% threshold).
    pub fn display() -> Self {
        Self::new(DISPLAY_THRESHOLD_FRACTION, CorrelationMethodKind::Direct)
    }

    /// Get the threshold fraction.
    pub fn threshold_fraction(&self) -> f64 {
        self.threshold_fraction
    }

    /// Get the correlation method name.
    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// Estimate the echo delay of a capture.
    pub fn estimate(&self, capture: &EchoCapture) -> EchoResult<EchoDelay> {
        let dt = capture.sampling_period()?;
        let template = locate_pulse(&capture.send, self.threshold_fraction)?;
        delay_with_method(&capture.receive, &template, dt, self.method.as_ref())
    }
}

impl Default for DelayEstimator {
    fn default() -> Self {
        Self::batch()
    }
}

impl std::fmt::Debug for DelayEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayEstimator")
            .field("threshold_fraction", &self.threshold_fraction)
            .field("method", &self.method.name())
            .finish()
    }
}

impl EchoCapture {
    /// Estimate the round-trip time of this capture in seconds.
    pub fn estimate_delay(&self, threshold_fraction: f64) -> EchoResult<f64> {
        let dt = self.sampling_period()?;
        estimate_delay(&self.send, &self.receive, dt, threshold_fraction)
    }
}

/// Estimate round-trip time from send and receive amplitudes.
///
/// # Arguments
/// * `send` - Send signal amplitudes
/// * `receive` - Receive signal amplitudes
/// * `dt` - Sampling period in seconds
/// * `threshold_fraction` - Pulse detection threshold fraction
///
/// # Returns
/// Round-trip time in seconds.
pub fn estimate_delay(
    send: &[f64],
    receive: &[f64],
    dt: f64,
    threshold_fraction: f64,
) -> EchoResult<f64> {
    let template = locate_pulse(send, threshold_fraction)?;
    delay_from_template(receive, &template, dt).map(|d| d.time_delay_secs)
}

/// Locate the echo of `template` in `receive` using direct correlation.
pub fn delay_from_template(receive: &[f64], template: &Template, dt: f64) -> EchoResult<EchoDelay> {
    delay_with_method(receive, template, dt, &Direct)
}

/// Locate the echo of `template` in `receive` with a given correlation method.
pub fn delay_with_method(
    receive: &[f64],
    template: &Template,
    dt: f64,
    method: &dyn CorrelationMethod,
) -> EchoResult<EchoDelay> {
    check_positive("dt", dt)?;

    if template.is_empty() {
        return Err(EchoError::NoPulseDetected {
            threshold_fraction: 0.0,
        });
    }
    if receive.is_empty() {
        return Err(EchoError::InsufficientSamples {
            got: 0,
            required: 1,
        });
    }

    let corr = method.full_correlation(receive, &template.samples);

    let zero_lag_index = template.len() - 1;
    let search_start = zero_lag_index + template.len();
    if search_start >= corr.len() {
        return Err(EchoError::InsufficientData {
            search_start,
            correlation_len: corr.len(),
        });
    }

    let (peak_index, peak_value) = first_max(&corr[search_start..])
        .ok_or_else(|| EchoError::malformed("correlation contains no comparable values"))?;

    let sample_delay = search_start + peak_index - zero_lag_index;
    let time_delay_secs = sample_delay as f64 * dt;

    tracing::debug!(
        "Echo peak at correlation index {} (value {:.4e}), delay {} samples = {:.6e} s",
        search_start + peak_index,
        peak_value,
        sample_delay,
        time_delay_secs
    );

    Ok(EchoDelay {
        sample_delay,
        time_delay_secs,
        peak_value,
        sampling_period_secs: dt,
        template_start: template.start_index,
        template_len: template.len(),
    })
}

/// Index and value of the first maximum, ignoring NaN.
fn first_max(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, best_val)) if v <= best_val => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rectangular pulse at the start of the send window, echo `k` samples later.
    fn make_capture(len: usize, pulse_len: usize, k: usize, dt: f64) -> EchoCapture {
        let time: Vec<f64> = (0..len).map(|i| i as f64 * dt).collect();
        let mut send = vec![0.0; len];
        for s in &mut send[..pulse_len] {
            *s = 1.0;
        }
        let mut receive = vec![0.0; len];
        for s in &mut receive[k..k + pulse_len] {
            *s = 0.4;
        }
        EchoCapture::new(time, send, receive).unwrap()
    }

    #[test]
    fn shifted_pulse_gives_exact_delay() {
        let dt = 1e-6;
        let capture = make_capture(1000, 20, 300, dt);

        let delay = estimate_delay(&capture.send, &capture.receive, dt, BATCH_THRESHOLD_FRACTION)
            .unwrap();
        assert_eq!(delay, 300.0 * dt);
    }

    #[test]
    fn scaling_both_signals_does_not_change_delay() {
        let dt = 2e-6;
        let capture = make_capture(800, 16, 123, dt);
        let scaled_send: Vec<f64> = capture.send.iter().map(|x| x * 4.0).collect();
        let scaled_receive: Vec<f64> = capture.receive.iter().map(|x| x * 4.0).collect();

        let a = estimate_delay(&capture.send, &capture.receive, dt, 0.1).unwrap();
        let b = estimate_delay(&scaled_send, &scaled_receive, dt, 0.1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn direct_coupling_zone_is_skipped() {
        let dt = 1e-6;
        let mut capture = make_capture(600, 10, 250, dt);
        // Strong crosstalk at the start of the receive window
        for s in &mut capture.receive[..10] {
            *s = 5.0;
        }

        let delay = capture.estimate_delay(BATCH_THRESHOLD_FRACTION).unwrap();
        assert_eq!(delay, 250.0 * dt);
    }

    #[test]
    fn echo_inside_coupling_window_is_not_found() {
        // Echo at lag 5 with a 10-sample template lies before the search start.
        // The search begins at lag 10, where 5 echo samples still overlap the
        // template; overlap only shrinks beyond it, so the peak is the first
        // searched index.
        let dt = 1.0;
        let capture = make_capture(100, 10, 5, dt);
        let result = DelayEstimator::batch().estimate(&capture).unwrap();
        assert_eq!(result.sample_delay, 10);
        assert!((result.peak_value - 5.0 * 0.4).abs() < 1e-12);
    }

    #[test]
    fn short_receive_is_insufficient_data() {
        let template = Template {
            samples: vec![1.0; 8],
            start_index: 0,
            threshold: 0.05,
        };
        let receive = vec![0.0; 8];
        assert!(matches!(
            delay_from_template(&receive, &template, 1e-6),
            Err(EchoError::InsufficientData {
                search_start: 15,
                correlation_len: 15
            })
        ));
    }

    #[test]
    fn all_zero_send_has_no_pulse() {
        let capture = EchoCapture::new(vec![0.0, 1.0, 2.0], vec![0.0; 3], vec![1.0; 3]).unwrap();
        assert!(matches!(
            DelayEstimator::display().estimate(&capture),
            Err(EchoError::NoPulseDetected { .. })
        ));
    }

    #[test]
    fn single_sample_capture_is_insufficient() {
        let capture = EchoCapture::new(vec![0.0], vec![1.0], vec![1.0]).unwrap();
        assert!(matches!(
            capture.estimate_delay(0.1),
            Err(EchoError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn ties_resolve_to_first_maximum() {
        assert_eq!(first_max(&[1.0, 3.0, 3.0, 2.0]), Some((1, 3.0)));
        assert_eq!(first_max(&[f64::NAN, 2.0]), Some((1, 2.0)));
        assert_eq!(first_max(&[]), None);
    }

    #[test]
    fn fft_estimator_agrees_with_direct() {
        let dt = 1e-6;
        let capture = make_capture(2048, 32, 700, dt);
        let direct = DelayEstimator::new(0.05, CorrelationMethodKind::Direct)
            .estimate(&capture)
            .unwrap();
        let fft = DelayEstimator::new(0.05, CorrelationMethodKind::Fft)
            .estimate(&capture)
            .unwrap();
        assert_eq!(direct.sample_delay, fft.sample_delay);
    }

    #[test]
    fn delay_reports_template_bounds() {
        let capture = make_capture(500, 12, 200, 1e-6);
        let result = DelayEstimator::batch().estimate(&capture).unwrap();
        assert_eq!(result.template_start, 0);
        assert_eq!(result.template_len, 12);
        assert_eq!(result.sample_delay, 200);
        assert!((result.time_delay_ms() - 0.2).abs() < 1e-12);
    }
}
