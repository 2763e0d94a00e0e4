//! Configuration for clock-rate discovery and calibration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CALIBRATION_EVENTS, DEFAULT_DESCRIPTOR_PATH, DESCRIPTOR_ENV_VAR, RECORD_THRESHOLD_CYCLES,
    THRESHOLD_CYCLES,
};
use crate::measurement::ConfigError;

/// Configuration options shared by [`ClockRateEstimator`](crate::ClockRateEstimator)
/// and [`CompensatedTimer`](crate::CompensatedTimer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cycles between polls before the tick counter is re-read (default: 1,000).
    pub threshold_cycles: u64,

    /// Candidates must exceed this many cycles per tick to count (default: 3,000).
    ///
    /// Smaller values are ordinary poll gaps with no interrupt in them.
    pub record_threshold_cycles: f64,

    /// Accepted tick events needed to finish calibration (default: 100).
    pub events: usize,

    /// Optional bound on calibration poll iterations (default: None).
    pub max_iterations: Option<u64>,

    /// Optional bound on calibration wall time (default: 10 s).
    ///
    /// With a 100 Hz tick clock, 100 events take about one second of CPU time.
    /// Set to `None` (together with `max_iterations`) for the unbounded loop.
    pub max_duration: Option<Duration>,

    /// Pin the thread to its current CPU while calibrating (default: true).
    pub pin_during_calibration: bool,

    /// Path of the textual system descriptor (default: `/proc/cpuinfo`,
    /// overridable with `CYCLE_CLOCK_DESCRIPTOR`).
    pub descriptor_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let descriptor_path = std::env::var_os(DESCRIPTOR_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DESCRIPTOR_PATH));

        Self {
            threshold_cycles: THRESHOLD_CYCLES,
            record_threshold_cycles: RECORD_THRESHOLD_CYCLES,
            events: CALIBRATION_EVENTS,
            max_iterations: None,
            max_duration: Some(Duration::from_secs(10)),
            pin_during_calibration: true,
            descriptor_path,
        }
    }
}

impl Config {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast configuration for tests.
    ///
    /// Settings:
    /// - 10 events (vs 100 default)
    /// - 3 s wall-time bound (vs 10 s default)
    pub fn quick() -> Self {
        Self {
            events: 10,
            max_duration: Some(Duration::from_secs(3)),
            ..Self::default()
        }
    }

    /// Set the poll threshold in cycles.
    pub fn threshold_cycles(mut self, cycles: u64) -> Self {
        self.threshold_cycles = cycles;
        self
    }

    /// Set the minimum accepted cycles-per-tick candidate.
    pub fn record_threshold_cycles(mut self, cycles: f64) -> Self {
        self.record_threshold_cycles = cycles;
        self
    }

    /// Set the number of accepted events to collect.
    pub fn events(mut self, events: usize) -> Self {
        self.events = events;
        self
    }

    /// Bound calibration by poll iterations.
    pub fn max_iterations(mut self, iterations: Option<u64>) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Bound calibration by wall time.
    pub fn max_duration(mut self, duration: Option<Duration>) -> Self {
        self.max_duration = duration;
        self
    }

    /// Remove both calibration bounds.
    ///
    /// Calibration then loops until `events` accepted events are seen, which
    /// never happens if the tick source does not advance.
    pub fn unbounded(self) -> Self {
        self.max_iterations(None).max_duration(None)
    }

    /// Enable or disable CPU pinning during calibration.
    pub fn pin_during_calibration(mut self, pin: bool) -> Self {
        self.pin_during_calibration = pin;
        self
    }

    /// Set the system descriptor path.
    pub fn descriptor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor_path = path.into();
        self
    }

    /// Check that the values can drive a calibration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold_cycles == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.events == 0 {
            return Err(ConfigError::ZeroEvents);
        }
        if !self.record_threshold_cycles.is_finite() || self.record_threshold_cycles < 0.0 {
            return Err(ConfigError::InvalidRecordThreshold(
                self.record_threshold_cycles,
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::ZeroIterationBound);
        }
        Ok(())
    }
}
