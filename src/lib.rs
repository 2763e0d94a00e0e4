//! # cycle-clock
//!
//! Cycle-accurate timing for short code regions.
//!
//! This crate reads the processor's free-running cycle counter and provides:
//! - A raw start/stop timer ([`CycleTimer`])
//! - Clock-rate discovery, from `/proc/cpuinfo` or by measurement
//!   ([`ClockRateEstimator`])
//! - A timer that subtracts the cost of scheduler interrupts
//!   ([`CompensatedTimer`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use cycle_clock::{ClockRateEstimator, CycleTimer};
//!
//! let mut timer = CycleTimer::new();
//! let overhead = timer.overhead_estimate();
//!
//! timer.start();
//! let v: Vec<u64> = (0..1_000).collect();
//! let cycles = timer.stop() - overhead;
//!
//! let mut rates = ClockRateEstimator::new();
//! let mhz = rates.from_descriptor(false);
//! println!("{} elements in {:.0} cycles (~{:.0} ns)", v.len(), cycles, cycles / mhz * 1e3);
//! ```
//!
//! ## Interrupt compensation
//!
//! Measurements long enough to span a scheduler tick also count the
//! interrupt handler. [`CompensatedTimer`] calibrates the cost of one tick
//! on first use and subtracts `ticks × cycles_per_tick` from each reading.
//!
//! ```no_run
//! use cycle_clock::{CompensatedTimer, Config};
//!
//! let mut timer = CompensatedTimer::with_config(Config::quick())?;
//! timer.start();
//! // ... workload ...
//! let cycles = timer.stop();
//! # let _ = cycles;
//! # Ok::<(), cycle_clock::ConfigError>(())
//! ```
//!
//! ## Caveats
//!
//! Counter values are only comparable on one core. Keep the measuring thread
//! on a single CPU or use a platform whose counter is synchronized across
//! cores. Timers take `&mut self` and are not meant to be shared between
//! threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod types;

// Functional modules
pub mod calibration;
pub mod clock_rate;
pub mod compensated;
pub mod measurement;
pub mod output;

// Re-exports for public API
pub use calibration::{Calibration, CalibrationStatus};
pub use clock_rate::{ClockRate, ClockRateEstimator, RateSource};
pub use compensated::{CompensatedMeasurement, CompensatedTimer};
pub use config::Config;
pub use constants::{
    CALIBRATION_EVENTS, FALLBACK_CLOCK_GHZ, RECORD_THRESHOLD_CYCLES, THRESHOLD_CYCLES,
};
pub use measurement::{
    read_counter, CalibrationError, ConfigError, CycleTimer, DescriptorError, HardwareCounter,
    PlatformCounter, ProcessTicks, TickSource,
};
pub use output::Report;
pub use types::{CycleCount, CycleDelta, Ticks};

/// Build a [`Report`] for this machine.
///
/// Measures the timer overhead, reads the clock rate from the configured
/// descriptor, and runs one interrupt calibration pass.
///
/// # Errors
///
/// Returns an error if `config` fails [`Config::validate`].
pub fn probe(config: &Config) -> Result<Report, ConfigError> {
    config.validate()?;

    let mut timer = CycleTimer::new();
    let overhead = timer.overhead_estimate();

    let mut rates = ClockRateEstimator::with_config(config);
    let rate = rates.descriptor_rate(false).clone();

    let calibration = calibration::calibrate(&mut timer, &ProcessTicks::new(), config);

    Ok(Report::new(timer.counter().name())
        .with_overhead(overhead)
        .with_clock_rate(rate)
        .with_calibration(calibration))
}
