//! Cross-correlation methods for echo detection.
//!
//! Every method produces the full linear cross-correlation of a signal with
//! a template: `corr[k] = sum_j signal[j + k - (M - 1)] * template[j]`,
//! `N + M - 1` values, no normalization. Index `M - 1` is zero lag.

mod direct;
mod fft;

pub use direct::Direct;
pub use fft::Fft;

use serde::{Deserialize, Serialize};

/// Trait for full cross-correlation implementations.
pub trait CorrelationMethod: Send + Sync {
    /// Name of this correlation method.
    fn name(&self) -> &str;

    /// Compute the full cross-correlation of `signal` with `template`.
    ///
    /// Returns an empty vector if either input is empty.
    fn full_correlation(&self, signal: &[f64], template: &[f64]) -> Vec<f64>;
}

/// Correlation method selection for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethodKind {
    /// Time-domain sum, exact tie behaviour.
    #[default]
    Direct,
    /// FFT-based, faster for long captures.
    Fft,
}

impl CorrelationMethodKind {
    /// Every selectable method.
    pub const ALL: [CorrelationMethodKind; 2] =
        [CorrelationMethodKind::Direct, CorrelationMethodKind::Fft];

    /// Look up a method by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "direct" | "time" => Some(CorrelationMethodKind::Direct),
            "fft" => Some(CorrelationMethodKind::Fft),
            _ => None,
        }
    }

    /// Get the configuration name of this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethodKind::Direct => "direct",
            CorrelationMethodKind::Fft => "fft",
        }
    }
}

/// Create a correlation method from its configuration kind.
pub fn create_from_kind(kind: CorrelationMethodKind) -> Box<dyn CorrelationMethod> {
    match kind {
        CorrelationMethodKind::Direct => Box::new(Direct),
        CorrelationMethodKind::Fft => Box::new(Fft),
    }
}

/// Get a list of available correlation method names.
pub fn available_methods() -> Vec<&'static str> {
    CorrelationMethodKind::ALL.iter().map(|k| k.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_creates_methods() {
        assert_eq!(create_from_kind(CorrelationMethodKind::Direct).name(), "Direct");
        assert_eq!(create_from_kind(CorrelationMethodKind::Fft).name(), "FFT");
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(
            CorrelationMethodKind::from_name("FFT"),
            Some(CorrelationMethodKind::Fft)
        );
        assert_eq!(
            CorrelationMethodKind::from_name("time"),
            Some(CorrelationMethodKind::Direct)
        );
        assert_eq!(CorrelationMethodKind::from_name("gcc_phat"), None);
    }

    #[test]
    fn available_names_resolve_to_their_kind() {
        assert_eq!(available_methods(), vec!["direct", "fft"]);
        for name in available_methods() {
            let kind = CorrelationMethodKind::from_name(name).unwrap();
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn fft_matches_direct() {
        let signal: Vec<f64> = (0..300)
            .map(|i| (i as f64 * 0.37).sin() + 0.25 * (i as f64 * 1.3).cos())
            .collect();
        let template: Vec<f64> = (0..40).map(|i| (i as f64 * 0.5).sin()).collect();

        let direct = Direct.full_correlation(&signal, &template);
        let fft = Fft.full_correlation(&signal, &template);

        assert_eq!(direct.len(), fft.len());
        for (a, b) in direct.iter().zip(fft.iter()) {
            assert!((a - b).abs() < 1e-9, "direct {} vs fft {}", a, b);
        }
    }
}
