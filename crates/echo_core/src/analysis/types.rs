//! Core types for echo analysis.

use serde::{Deserialize, Serialize};

use crate::errors::{EchoError, EchoResult};

/// One digitized measurement: send and receive channels on a shared time base.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoCapture {
    /// Sample times in seconds.
    pub time: Vec<f64>,
    /// Transmitted signal amplitudes.
    pub send: Vec<f64>,
    /// Received signal amplitudes.
    pub receive: Vec<f64>,
}

impl EchoCapture {
    /// Create a capture from three equal-length columns.
    pub fn new(time: Vec<f64>, send: Vec<f64>, receive: Vec<f64>) -> EchoResult<Self> {
        if time.len() != send.len() || time.len() != receive.len() {
            return Err(EchoError::malformed(format!(
                "column lengths differ: time={}, send={}, receive={}",
                time.len(),
                send.len(),
                receive.len()
            )));
        }

        Ok(Self {
            time,
            send,
            receive,
        })
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if the capture is empty.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Sampling period derived from the first two time stamps.
    pub fn sampling_period(&self) -> EchoResult<f64> {
        if self.time.len() < 2 {
            return Err(EchoError::InsufficientSamples {
                got: self.time.len(),
                required: 2,
            });
        }

        let dt = self.time[1] - self.time[0];
        if !dt.is_finite() || dt <= 0.0 {
            return Err(EchoError::malformed(format!(
                "sampling period must be positive, got {}",
                dt
            )));
        }

        Ok(dt)
    }
}

/// The detected transmit pulse, used as the correlation reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Pulse samples, first to last above-threshold sample inclusive.
    pub samples: Vec<f64>,
    /// Index of the first pulse sample in the send signal.
    pub start_index: usize,
    /// Absolute amplitude threshold that delimited the pulse.
    pub threshold: f64,
}

impl Template {
    /// Get the number of template samples (always at least 1).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Templates are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the last pulse sample in the send signal.
    pub fn end_index(&self) -> usize {
        self.start_index + self.samples.len() - 1
    }
}

/// Result of locating the echo of one capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoDelay {
    /// Delay in samples relative to the start of the receive window.
    pub sample_delay: usize,
    /// Round-trip time in seconds.
    pub time_delay_secs: f64,
    /// Correlation value at the echo peak.
    pub peak_value: f64,
    /// Sampling period in seconds.
    pub sampling_period_secs: f64,
    /// First template sample index in the send signal.
    pub template_start: usize,
    /// Number of template samples.
    pub template_len: usize,
}

impl EchoDelay {
    /// Round-trip time in milliseconds.
    pub fn time_delay_ms(&self) -> f64 {
        self.time_delay_secs * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_period_from_first_two_samples() {
        let capture = EchoCapture::new(
            vec![0.0, 1e-6, 2e-6],
            vec![0.0; 3],
            vec![0.0; 3],
        )
        .unwrap();
        assert!((capture.sampling_period().unwrap() - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn single_sample_has_no_sampling_period() {
        let capture = EchoCapture::new(vec![0.0], vec![1.0], vec![1.0]).unwrap();
        assert!(matches!(
            capture.sampling_period(),
            Err(EchoError::InsufficientSamples { got: 1, required: 2 })
        ));
    }

    #[test]
    fn non_increasing_time_is_malformed() {
        let capture = EchoCapture::new(vec![1.0, 1.0], vec![0.0; 2], vec![0.0; 2]).unwrap();
        assert!(matches!(
            capture.sampling_period(),
            Err(EchoError::MalformedInput(_))
        ));
    }

    #[test]
    fn mismatched_columns_rejected() {
        let result = EchoCapture::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]);
        assert!(matches!(result, Err(EchoError::MalformedInput(_))));
    }

    #[test]
    fn template_end_index() {
        let template = Template {
            samples: vec![1.0, 1.0, 1.0],
            start_index: 4,
            threshold: 0.1,
        };
        assert_eq!(template.end_index(), 6);
    }
}
