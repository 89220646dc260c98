//! Transmit pulse detection.
//!
//! The pulse is the span of the send signal between the first and the last
//! sample whose magnitude exceeds a fraction of the signal's peak magnitude.

use crate::errors::{check_fraction, EchoError, EchoResult};

use super::types::Template;

/// Threshold fraction for batch calibration and analysis runs.
pub const BATCH_THRESHOLD_FRACTION: f64 = 0.05;

/// Threshold fraction for single-shot distance display.
pub const DISPLAY_THRESHOLD_FRACTION: f64 = 0.10;

/// Locate the transmit pulse in the send signal.
///
/// # Arguments
/// * `send` - Send signal amplitudes
/// * `threshold_fraction` - Fraction of the peak magnitude, in (0, 1)
///
/// # Errors
/// `NoPulseDetected` if no sample exceeds the threshold (e.g. an all-zero
/// signal), `InsufficientSamples` for an empty signal.
pub fn locate_pulse(send: &[f64], threshold_fraction: f64) -> EchoResult<Template> {
    check_fraction("threshold_fraction", threshold_fraction)?;

    if send.is_empty() {
        return Err(EchoError::InsufficientSamples {
            got: 0,
            required: 1,
        });
    }

    let peak = send.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    let threshold = threshold_fraction * peak;

    let first = send.iter().position(|x| x.abs() > threshold);
    let last = send.iter().rposition(|x| x.abs() > threshold);

    match (first, last) {
        (Some(start), Some(end)) => {
            tracing::debug!(
                "Pulse located at samples {}..={} (threshold {:.4e})",
                start,
                end,
                threshold
            );
            Ok(Template {
                samples: send[start..=end].to_vec(),
                start_index: start,
                threshold,
            })
        }
        _ => Err(EchoError::NoPulseDetected { threshold_fraction }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_rectangular_pulse() {
        let mut send = vec![0.0; 100];
        for s in &mut send[10..20] {
            *s = 1.0;
        }

        let template = locate_pulse(&send, BATCH_THRESHOLD_FRACTION).unwrap();
        assert_eq!(template.start_index, 10);
        assert_eq!(template.end_index(), 19);
        assert_eq!(template.len(), 10);
    }

    #[test]
    fn all_zero_signal_has_no_pulse() {
        let send = vec![0.0; 64];
        assert!(matches!(
            locate_pulse(&send, BATCH_THRESHOLD_FRACTION),
            Err(EchoError::NoPulseDetected { .. })
        ));
    }

    #[test]
    fn template_keeps_quiet_samples_inside_pulse() {
        // Oscillating burst: zero crossings inside stay in the template
        let send = vec![0.0, 0.01, 1.0, 0.0, -1.0, 0.0, 1.0, 0.02, 0.0];
        let template = locate_pulse(&send, DISPLAY_THRESHOLD_FRACTION).unwrap();
        assert_eq!(template.start_index, 2);
        assert_eq!(template.samples, vec![1.0, 0.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn negative_peaks_count_by_magnitude() {
        let send = vec![0.0, -2.0, 0.5, 0.0];
        let template = locate_pulse(&send, 0.2).unwrap();
        assert_eq!(template.start_index, 1);
        assert_eq!(template.samples, vec![-2.0, 0.5]);
    }

    #[test]
    fn threshold_presets_differ() {
        // A 7% shoulder is part of the pulse at 5% but not at 10%
        let send = vec![0.0, 0.07, 1.0, 0.07, 0.0];
        assert_eq!(locate_pulse(&send, BATCH_THRESHOLD_FRACTION).unwrap().len(), 3);
        assert_eq!(locate_pulse(&send, DISPLAY_THRESHOLD_FRACTION).unwrap().len(), 1);
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        assert!(matches!(
            locate_pulse(&[1.0], 1.5),
            Err(EchoError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn empty_signal_rejected() {
        assert!(matches!(
            locate_pulse(&[], 0.1),
            Err(EchoError::InsufficientSamples { .. })
        ));
    }
}
