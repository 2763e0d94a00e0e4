//! Reporting of clock rate and calibration results.
//!
//! [`Report`] bundles what the crate learned about the machine. It renders as
//! JSON ([`json`]) or as colored text for a terminal ([`terminal`]).

pub mod json;
pub mod terminal;

use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::clock_rate::ClockRate;
use crate::types::CycleDelta;

pub use json::{to_json, to_json_pretty};
pub use terminal::format_report;

/// Summary of the counter, clock rate and calibration on this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Name of the hardware counter (`rdtsc`, `cntvct_el0`, ...).
    pub counter: String,
    /// Cost of an empty start/stop pair, if measured.
    pub timer_overhead_cycles: Option<CycleDelta>,
    /// Clock rate estimate, if one was taken.
    pub clock_rate: Option<ClockRate>,
    /// Interrupt calibration, if one was run.
    pub calibration: Option<Calibration>,
}

impl Report {
    /// Empty report for the named counter.
    pub fn new(counter: impl Into<String>) -> Self {
        Self {
            counter: counter.into(),
            timer_overhead_cycles: None,
            clock_rate: None,
            calibration: None,
        }
    }

    /// Attach the timer overhead.
    pub fn with_overhead(mut self, cycles: CycleDelta) -> Self {
        self.timer_overhead_cycles = Some(cycles);
        self
    }

    /// Attach a clock rate.
    pub fn with_clock_rate(mut self, rate: ClockRate) -> Self {
        self.clock_rate = Some(rate);
        self
    }

    /// Attach a calibration result.
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// Timer overhead in nanoseconds, when both overhead and rate are known.
    pub fn timer_overhead_ns(&self) -> Option<f64> {
        match (self.timer_overhead_cycles, &self.clock_rate) {
            (Some(cycles), Some(rate)) => Some(rate.cycles_to_ns(cycles)),
            _ => None,
        }
    }

    /// Interrupt cost per tick in microseconds, when both inputs are known.
    pub fn tick_cost_us(&self) -> Option<f64> {
        match (&self.calibration, &self.clock_rate) {
            (Some(cal), Some(rate)) if cal.is_complete() => {
                Some(rate.cycles_to_ns(cal.cycles_per_tick) / 1_000.0)
            }
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_derived_units() {
        let report = complete_report();
        assert_eq!(report.timer_overhead_ns(), Some(10.0));
        assert_eq!(report.tick_cost_us(), Some(4.0));
    }

    #[test]
    fn test_derived_units_need_inputs() {
        let report = degraded_report();
        assert_eq!(report.timer_overhead_ns(), None);
        assert_eq!(report.tick_cost_us(), None);
        assert_eq!(Report::new("mock").with_overhead(5.0).timer_overhead_ns(), None);
    }
}
