//! JSON serialization for reports.

use super::Report;

/// Serialize a Report to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for Report).
pub fn to_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a Report to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for Report).
pub fn to_json_pretty(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::{complete_report, degraded_report};

    #[test]
    fn test_to_json() {
        let json = to_json(&complete_report()).unwrap();
        assert!(json.contains("\"counter\":\"rdtsc\""));
        assert!(json.contains("\"cycles_per_tick\":12000.0"));
        assert!(json.contains("\"source\":\"Descriptor\""));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json_pretty(&complete_report()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("timer_overhead_cycles"));
    }

    #[test]
    fn test_incomplete_calibration_is_tagged() {
        let json = to_json(&degraded_report()).unwrap();
        assert!(json.contains("Incomplete"));
        assert!(json.contains("Timeout"));
        assert!(json.contains("Fallback"));
        assert!(json.contains("\"timer_overhead_cycles\":null"));
    }

    #[test]
    fn test_parses_back() {
        let report = degraded_report();
        let parsed: Report = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
