//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use super::Report;
use crate::calibration::{Calibration, CalibrationStatus};
use crate::clock_rate::{ClockRate, RateSource};

/// Format a Report for human-readable terminal output.
pub fn format_report(report: &Report) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("cycle-clock\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  Counter: {}\n", report.counter));
    if let Some(cycles) = report.timer_overhead_cycles {
        match report.timer_overhead_ns() {
            Some(ns) => output.push_str(&format!(
                "  Timer overhead: {:.0} cycles (~{:.1} ns)\n",
                cycles, ns
            )),
            None => output.push_str(&format!("  Timer overhead: {:.0} cycles\n", cycles)),
        }
    }
    output.push('\n');

    if let Some(rate) = &report.clock_rate {
        output.push_str(&format_clock_rate(rate));
        output.push('\n');
    }

    if let Some(cal) = &report.calibration {
        output.push_str(&format_calibration(cal));
        if let Some(us) = report.tick_cost_us() {
            output.push_str(&format!("    Cost per tick:    ~{:.1} \u{00B5}s\n", us));
        }
        output.push('\n');
    }

    output.push_str(&sep);
    output.push('\n');

    if report.clock_rate.as_ref().is_some_and(ClockRate::is_fallback) {
        output.push_str("Note: Clock rate is a 1.0 GHz placeholder, not a measurement.\n");
    }

    output
}

fn format_clock_rate(rate: &ClockRate) -> String {
    let mut out = format!(
        "  Clock rate: {} ({})\n",
        format!("{:.4} GHz", rate.ghz).bold(),
        format_source(&rate.source)
    );
    if let RateSource::Fallback { reason } = &rate.source {
        out.push_str(&format!("    {}\n", reason.to_string().yellow()));
    }
    out
}

fn format_source(source: &RateSource) -> String {
    match source {
        RateSource::Descriptor => "from descriptor".green().to_string(),
        RateSource::Measured { seconds } => format!("measured over {} s", seconds)
            .green()
            .to_string(),
        RateSource::Fallback { .. } => "fallback".yellow().to_string(),
    }
}

fn format_calibration(cal: &Calibration) -> String {
    let mut out = String::new();

    match &cal.status {
        CalibrationStatus::Complete => {
            out.push_str(&format!(
                "  {}\n\n",
                "\u{2713} Interrupt overhead calibrated".green().bold()
            ));
        }
        CalibrationStatus::NotRun => {
            out.push_str(&format!(
                "  {}\n\n",
                "\u{2717} Interrupt calibration not run".red().bold()
            ));
        }
        CalibrationStatus::Incomplete { reason } => {
            out.push_str(&format!(
                "  {}\n",
                "\u{26A0} Interrupt calibration incomplete".yellow().bold()
            ));
            out.push_str(&format!("    {}\n\n", reason));
        }
    }

    if cal.is_complete() {
        out.push_str(&format!(
            "    Cycles per tick:  {:.1}\n",
            cal.cycles_per_tick
        ));
    } else {
        out.push_str(&format!(
            "    Cycles per tick:  {} (measurements are not compensated)\n",
            "none".red()
        ));
    }
    out.push_str(&format!(
        "    Tick events:      {} ({} accepted, {} rejected)\n",
        cal.events, cal.accepted, cal.rejected
    ));
    out.push_str(&format!(
        "    Polls:            {} in {:.2} s{}\n",
        cal.iterations,
        cal.elapsed.as_secs_f64(),
        if cal.pinned { " (pinned)" } else { "" }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::{complete_report, degraded_report};

    #[test]
    fn test_format_complete_report() {
        colored::control::set_override(false);
        let output = format_report(&complete_report());
        assert!(output.contains("cycle-clock"));
        assert!(output.contains("Counter: rdtsc"));
        assert!(output.contains("3.0000 GHz"));
        assert!(output.contains("Interrupt overhead calibrated"));
        assert!(output.contains("Cycles per tick:  12000.0"));
        assert!(output.contains("~4.0"));
        assert!(!output.contains("placeholder"));
    }

    #[test]
    fn test_format_degraded_report() {
        colored::control::set_override(false);
        let output = format_report(&degraded_report());
        assert!(output.contains("fallback"));
        assert!(output.contains("calibration incomplete"));
        assert!(output.contains("timed out"));
        assert!(output.contains("placeholder"));
        assert!(!output.contains("Timer overhead"));
        assert!(output.contains("not compensated"));
    }

    #[test]
    fn test_format_calibration_not_run() {
        colored::control::set_override(false);
        let report = Report::new("mock").with_calibration(Calibration::uncalibrated());
        let output = format_report(&report);
        assert!(output.contains("calibration not run"));
        assert!(output.contains("Tick events:      0"));
    }
}
