//! Default tuning constants.
//!
//! The calibration values were chosen empirically for a 100 Hz tick clock on
//! multi-GHz hardware. They are only defaults; see [`crate::Config`].

/// Minimum cycle gap between two polls before the tick counter is re-read.
pub const THRESHOLD_CYCLES: u64 = 1_000;

/// Candidates at or below this many cycles per tick are treated as noise.
pub const RECORD_THRESHOLD_CYCLES: f64 = 3_000.0;

/// Number of accepted tick events collected before calibration finishes.
pub const CALIBRATION_EVENTS: usize = 100;

/// Clock rate assumed when the system descriptor is unusable.
pub const FALLBACK_CLOCK_GHZ: f64 = 1.0;

/// Default location of the textual system descriptor.
pub const DEFAULT_DESCRIPTOR_PATH: &str = "/proc/cpuinfo";

/// Line marker for the nominal core frequency in the descriptor.
pub const CPU_MHZ_TOKEN: &str = "cpu MHz";

/// Environment variable that overrides the descriptor path.
pub const DESCRIPTOR_ENV_VAR: &str = "CYCLE_CLOCK_DESCRIPTOR";
