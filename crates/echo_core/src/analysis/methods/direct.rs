//! Time-domain cross-correlation.
//!
//! O(N·M) sum over overlapping samples. Default method: identical inputs
//! give identical sums, so ties between equal peaks resolve predictably.

use super::CorrelationMethod;

/// Direct (time-domain) full cross-correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl CorrelationMethod for Direct {
    fn name(&self) -> &str {
        "Direct"
    }

    fn full_correlation(&self, signal: &[f64], template: &[f64]) -> Vec<f64> {
        let n = signal.len();
        let m = template.len();
        if n == 0 || m == 0 {
            return Vec::new();
        }

        (0..n + m - 1)
            .map(|k| {
                // lag = k - (m - 1); signal index = j + lag
                let lag = k as isize - (m as isize - 1);
                let j_start = (-lag).max(0) as usize;
                let j_end = ((n as isize - lag).min(m as isize)).max(0) as usize;

                (j_start..j_end)
                    .map(|j| signal[(j as isize + lag) as usize] * template[j])
                    .sum()
            })
            .collect()
    }
}
