//! CSV capture parser.
//!
//! # Format Overview
//!
//! ```text
//! x-axis,1,2
//! second,Volt,Volt
//! -1.0e-04,0.02,0.01
//! -9.9e-05,0.03,0.00
//! ```
//!
//! The first `header_lines` lines are skipped. Blank lines are ignored.
//! Every other line needs at least three numeric fields; additional columns
//! are ignored.

use std::path::Path;

use crate::analysis::EchoCapture;
use crate::errors::{EchoError, EchoResult};

/// Header lines written by the oscilloscope export.
pub const DEFAULT_HEADER_LINES: usize = 2;

/// Parse CSV content into a capture.
///
/// # Arguments
/// * `content` - Raw file content
/// * `header_lines` - Number of leading lines to skip
///
/// # Errors
/// * `MalformedInput` - a row has fewer than 3 fields or a non-numeric field
/// * `InsufficientSamples` - no data rows remain after the header
pub fn parse_capture_csv(content: &str, header_lines: usize) -> EchoResult<EchoCapture> {
    let mut time = Vec::new();
    let mut send = Vec::new();
    let mut receive = Vec::new();

    for (idx, line) in content.lines().enumerate().skip(header_lines) {
        let line_num = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (t, s, r) = parse_row(line).ok_or_else(|| {
            EchoError::malformed(format!(
                "line {}: expected 3 numeric fields, got '{}'",
                line_num, line
            ))
        })?;

        time.push(t);
        send.push(s);
        receive.push(r);
    }

    if time.is_empty() {
        return Err(EchoError::InsufficientSamples {
            got: 0,
            required: 2,
        });
    }

    tracing::trace!("Parsed {} capture rows", time.len());

    EchoCapture::new(time, send, receive)
}

/// Read and parse a capture file.
pub fn load_capture(path: &Path, header_lines: usize) -> EchoResult<EchoCapture> {
    let content = std::fs::read_to_string(path).map_err(|e| EchoError::io(path, e))?;
    parse_capture_csv(&content, header_lines).map_err(|e| match e {
        EchoError::MalformedInput(msg) => {
            EchoError::malformed(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Parse the first three fields of a row.
fn parse_row(line: &str) -> Option<(f64, f64, f64)> {
    let mut fields = line.split(',').map(str::trim);

    let t = parse_field(fields.next()?)?;
    let s = parse_field(fields.next()?)?;
    let r = parse_field(fields.next()?)?;

    Some((t, s, r))
}

fn parse_field(field: &str) -> Option<f64> {
    let value: f64 = field.parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "x-axis,1,2\nsecond,Volt,Volt\n0.0,0.0,0.1\n1e-6,1.0,0.2\n2e-6,0.5,0.3\n";

    #[test]
    fn parses_rows_after_header() {
        let capture = parse_capture_csv(SAMPLE, DEFAULT_HEADER_LINES).unwrap();
        assert_eq!(capture.len(), 3);
        assert_eq!(capture.time, vec![0.0, 1e-6, 2e-6]);
        assert_eq!(capture.send, vec![0.0, 1.0, 0.5]);
        assert_eq!(capture.receive, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn extra_columns_and_blank_lines_ignored() {
        let content = "h1\nh2\n\n0.0, 1.0, 2.0, 9.9\r\n\n1.0,3.0,4.0,8.8,7.7\n";
        let capture = parse_capture_csv(content, 2).unwrap();
        assert_eq!(capture.len(), 2);
        assert_eq!(capture.receive, vec![2.0, 4.0]);
    }

    #[test]
    fn two_column_row_is_malformed_with_line_number() {
        let content = "h1\nh2\n0.0,1.0,2.0\n1.0,3.0\n";
        match parse_capture_csv(content, 2) {
            Err(EchoError::MalformedInput(msg)) => assert!(msg.contains("line 4"), "{}", msg),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let content = "h1\nh2\n0.0,abc,2.0\n";
        match parse_capture_csv(content, 2) {
            Err(EchoError::MalformedInput(msg)) => assert!(msg.contains("line 3"), "{}", msg),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn header_only_is_insufficient() {
        assert!(matches!(
            parse_capture_csv("h1\nh2\n", 2),
            Err(EchoError::InsufficientSamples { got: 0, .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let capture = load_capture(file.path(), DEFAULT_HEADER_LINES).unwrap();
        assert_eq!(capture.len(), 3);
        assert!((capture.sampling_period().unwrap() - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        assert!(matches!(
            load_capture(&path, 2),
            Err(EchoError::Io { .. })
        ));
    }
}
