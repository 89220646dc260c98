//! FFT-based cross-correlation.
//!
//! Linear correlation is the convolution of the signal with the reversed
//! template; both are zero-padded to a power of two of at least N + M - 1
//! so the circular result contains no wrap-around.

use rustfft::{num_complex::Complex, FftPlanner};

use super::CorrelationMethod;

/// Full cross-correlation computed with rustfft.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fft;

impl CorrelationMethod for Fft {
    fn name(&self) -> &str {
        "FFT"
    }

    fn full_correlation(&self, signal: &[f64], template: &[f64]) -> Vec<f64> {
        let n = signal.len();
        let m = template.len();
        if n == 0 || m == 0 {
            return Vec::new();
        }

        let correlation_len = n + m - 1;
        let fft_len = correlation_len.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);

        let mut signal_complex: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        signal_complex.resize(fft_len, Complex::new(0.0, 0.0));

        let mut template_complex: Vec<Complex<f64>> = template
            .iter()
            .rev()
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        template_complex.resize(fft_len, Complex::new(0.0, 0.0));

        fft.process(&mut signal_complex);
        fft.process(&mut template_complex);

        let mut product: Vec<Complex<f64>> = signal_complex
            .iter()
            .zip(template_complex.iter())
            .map(|(a, b)| a * b)
            .collect();

        ifft.process(&mut product);

        // rustfft does not normalize the inverse transform
        let scale = 1.0 / fft_len as f64;
        product
            .iter()
            .take(correlation_len)
            .map(|c| c.re * scale)
            .collect()
    }
}
