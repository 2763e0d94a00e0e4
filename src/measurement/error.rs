//! Error types for clock-rate discovery and calibration.
//!
//! None of these abort a measurement. They describe why a result degraded
//! (fallback clock rate, uncompensated timings) and travel inside the
//! results that carry the degradation.

use serde::{Deserialize, Serialize};

/// Why the system descriptor could not provide a clock rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorError {
    /// The descriptor file could not be opened or read.
    Unreadable {
        /// Path that was tried.
        path: String,
        /// OS error message.
        reason: String,
    },

    /// No line contained the `cpu MHz` marker.
    NoMatch,

    /// A `cpu MHz` line was found but its value did not parse.
    Unparsable {
        /// The offending line, trimmed.
        line: String,
    },

    /// The reported frequency was exactly zero.
    ZeroFrequency,
}

impl std::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorError::Unreadable { path, reason } => {
                write!(f, "can't open {} to get clock information: {}", path, reason)
            }
            DescriptorError::NoMatch => write!(f, "no 'cpu MHz' line in system descriptor"),
            DescriptorError::Unparsable { line } => {
                write!(f, "could not parse clock rate from '{}'", line)
            }
            DescriptorError::ZeroFrequency => write!(f, "system descriptor reports 0 MHz"),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Why interrupt-overhead calibration did not run to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalibrationError {
    /// The poll-iteration bound was reached first.
    IterationLimit {
        /// Iterations performed.
        iterations: u64,
        /// Tick events collected before stopping.
        events: usize,
    },

    /// The wall-time bound was reached first.
    Timeout {
        /// Milliseconds spent.
        elapsed_ms: u64,
        /// Tick events collected before stopping.
        events: usize,
    },

    /// Every tick event fell at or below the record threshold.
    NoCandidate {
        /// Tick events observed.
        events: usize,
        /// The threshold none of them exceeded.
        record_threshold_cycles: f64,
    },
}

impl CalibrationError {
    /// Number of tick events collected before calibration stopped.
    pub fn events(&self) -> usize {
        match self {
            CalibrationError::IterationLimit { events, .. } => *events,
            CalibrationError::Timeout { events, .. } => *events,
            CalibrationError::NoCandidate { events, .. } => *events,
        }
    }
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationError::IterationLimit { iterations, events } => write!(
                f,
                "calibration stopped after {} polls with only {} tick events",
                iterations, events
            ),
            CalibrationError::Timeout { elapsed_ms, events } => write!(
                f,
                "calibration timed out after {} ms with only {} tick events",
                elapsed_ms, events
            ),
            CalibrationError::NoCandidate {
                events,
                record_threshold_cycles,
            } => write!(
                f,
                "none of {} tick events exceeded {:.0} cycles per tick",
                events, record_threshold_cycles
            ),
        }
    }
}

impl std::error::Error for CalibrationError {}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `threshold_cycles` must be positive.
    ZeroThreshold,
    /// `events` must be positive.
    ZeroEvents,
    /// `record_threshold_cycles` must be finite and non-negative.
    InvalidRecordThreshold(f64),
    /// A zero `max_iterations` bound would stop calibration before it starts.
    ZeroIterationBound,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroThreshold => write!(f, "threshold_cycles must be greater than 0"),
            ConfigError::ZeroEvents => write!(f, "events must be greater than 0"),
            ConfigError::InvalidRecordThreshold(v) => {
                write!(f, "record_threshold_cycles must be finite and >= 0, got {}", v)
            }
            ConfigError::ZeroIterationBound => {
                write!(f, "max_iterations must be greater than 0 when set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
