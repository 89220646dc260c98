//! Text and JSON rendering of command reports.

use std::fmt::Write;

use serde::Serialize;

use crate::commands::{
    CalibrationReport, DelaysReport, FailureEntry, MeasureReport, Report, SpeedReport,
};

/// JSON document written with `--json`.
#[derive(Serialize)]
struct JsonEnvelope<'a> {
    tool: &'static str,
    version: &'static str,
    generated_at: String,
    report: &'a Report,
}

/// Render a report as pretty JSON with a generation timestamp.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    let envelope = JsonEnvelope {
        tool: "echo-ranger",
        version: env!("CARGO_PKG_VERSION"),
        generated_at: chrono::Utc::now().to_rfc3339(),
        report,
    };
    serde_json::to_string_pretty(&envelope)
}

/// Render a report as human-readable text.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = match report {
        Report::Delays(r) => write_delays(&mut out, r),
        Report::Speed(r) => write_speed(&mut out, r),
        Report::Calibrate(r) => write_calibration(&mut out, r),
        Report::Measure(r) => write_measure(&mut out, r),
    };
    out
}

fn write_delays(out: &mut String, report: &DelaysReport) -> std::fmt::Result {
    for entry in &report.delays {
        writeln!(out, "{}: t = {:.6e} s", entry.file, entry.delay.time_delay_secs)?;
    }
    write_failures(out, &report.failures)
}

fn write_speed(out: &mut String, report: &SpeedReport) -> std::fmt::Result {
    for point in &report.points {
        writeln!(
            out,
            "distance = {:.3} m, t = {:.6e} s",
            point.distance_m, point.delay_s
        )?;
    }

    let estimate = &report.estimate;
    writeln!(out)?;
    writeln!(out, "Speed of sound (difference method):")?;
    writeln!(out, "  Mean: {:.2} m/s", estimate.mean)?;
    writeln!(
        out,
        "  Standard deviation (single samples): {:.2} m/s",
        estimate.std_dev
    )?;
    writeln!(
        out,
        "  Standard deviation of the mean: {:.2} m/s",
        estimate.std_error
    )?;
    if estimate.clamped_count() > 0 {
        writeln!(
            out,
            "  Outliers replaced by {} m/s: {}",
            report.literature_speed,
            estimate.clamped_count()
        )?;
    }
    if !estimate.skipped.is_empty() {
        writeln!(out, "  Skipped pairs (delta t = 0): {}", estimate.skipped.len())?;
    }
    write_failures(out, &report.failures)
}

fn write_calibration(out: &mut String, report: &CalibrationReport) -> std::fmt::Result {
    writeln!(out, "Calibration complete ({} points):", report.fit.n_points)?;
    writeln!(out, "{}", report.fit)?;
    writeln!(
        out,
        "Calibrated v = {:.1} ± {:.1} m/s",
        report.speed.speed_m_per_s, report.speed.uncertainty_m_per_s
    )?;
    write_failures(out, &report.failures)
}

fn write_measure(out: &mut String, report: &MeasureReport) -> std::fmt::Result {
    if let Some(calibration) = &report.calibration {
        write_calibration(out, calibration)?;
        writeln!(out)?;
    }
    writeln!(out, "Measured distance: {:.0} cm", report.distance.displayed_cm())?;
    writeln!(out, "Uncertainty: ±{:.1} cm", report.distance.uncertainty_cm())
}

fn write_failures(out: &mut String, failures: &[FailureEntry]) -> std::fmt::Result {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "Failed files ({}):", failures.len())?;
    for failure in failures {
        writeln!(out, "  {}: {}", failure.file, failure.message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{calibration_dir, capture_csv};
    use crate::commands::{run_calibrate, run_delays};
    use echo_core::config::Settings;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn delays_text_lists_files_and_failures() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), capture_csv(40)).unwrap();
        fs::write(dir.path().join("b.csv"), "h\nh\nx,y,z\n").unwrap();

        let report = Report::Delays(run_delays(dir.path(), &Settings::default()).unwrap());
        let text = render_text(&report);

        assert!(text.contains("a.csv: t = 4.000000e-5 s"), "{}", text);
        assert!(text.contains("Failed files (1):"));
        assert!(text.contains("  b.csv: Malformed input"));
    }

    #[test]
    fn calibration_text_matches_report_format() {
        let dir = calibration_dir();
        let report = Report::Calibrate(run_calibrate(dir.path(), &Settings::default()).unwrap());
        let text = render_text(&report);

        assert!(text.contains("t(d) = 5.80e-3 * d + 2.00e-5"), "{}", text);
        assert!(text.contains("Calibrated v = 344.8 ± 0.0 m/s"), "{}", text);
    }

    #[test]
    fn json_report_is_tagged_and_timestamped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), capture_csv(40)).unwrap();

        let report = Report::Delays(run_delays(dir.path(), &Settings::default()).unwrap());
        let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();

        assert_eq!(json["tool"], "echo-ranger");
        assert_eq!(json["report"]["command"], "delays");
        assert_eq!(json["report"]["delays"][0]["sample_delay"], 40);
        assert!(json["generated_at"].as_str().unwrap().contains('T'));
    }
}
