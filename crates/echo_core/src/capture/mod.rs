//! Capture input: oscilloscope CSV exports and calibration file labels.
//!
//! Captures are plain CSV files with a short header followed by
//! `time,send,receive[,...]` rows. Calibration captures carry their ground
//! truth distance in the file name (`Distance_12.5cm.csv`).

mod csv;
mod label;

pub use csv::{load_capture, parse_capture_csv, DEFAULT_HEADER_LINES};
pub use label::distance_label;
