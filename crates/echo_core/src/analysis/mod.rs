//! Echo analysis: pulse detection and delay estimation.
//!
//! # Architecture
//!
//! 1. **Pulse Detection** (`pulse`): find the transmit pulse in the send
//!    signal; it becomes the correlation template.
//!
//! 2. **Correlation** (`methods`): full linear cross-correlation of the
//!    receive signal with the template (direct or FFT).
//!
//! 3. **Echo Delay** (`echo`): skip the direct-coupling zone, take the first
//!    correlation maximum, convert samples to seconds.
//!
//! # Usage
//!
//! ```ignore
//! use echo_core::analysis::{DelayEstimator, EchoCapture};
//!
//! let capture = EchoCapture::new(time, send, receive)?;
//! let delay = DelayEstimator::batch().estimate(&capture)?;
//! println!("t = {:.6e} s", delay.time_delay_secs);
//! ```

mod echo;
pub mod methods;
mod pulse;
pub mod types;

pub use types::{EchoCapture, EchoDelay, Template};

pub use pulse::{locate_pulse, BATCH_THRESHOLD_FRACTION, DISPLAY_THRESHOLD_FRACTION};

pub use echo::{delay_from_template, delay_with_method, estimate_delay, DelayEstimator};

pub use methods::{
    available_methods, create_from_kind, CorrelationMethod, CorrelationMethodKind,
    Direct, Fft,
};
