//! Cycle timer with scheduler-tick overhead subtracted.

use serde::{Deserialize, Serialize};

use crate::calibration::{calibrate, Calibration, CalibrationStatus};
use crate::config::Config;
use crate::measurement::{
    ConfigError, CycleTimer, HardwareCounter, PlatformCounter, ProcessTicks, TickSource,
};
use crate::types::{CycleDelta, Ticks};

/// Breakdown of one compensated measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompensatedMeasurement {
    /// Cycles between `start` and `stop` as read from the counter.
    pub raw_cycles: CycleDelta,
    /// Process ticks that elapsed in the interval.
    pub ticks_elapsed: Ticks,
    /// `raw_cycles` minus the estimated interrupt overhead, never negative.
    pub compensated_cycles: CycleDelta,
    /// False when calibration did not complete and the raw value was used.
    pub compensation_applied: bool,
    /// True when the subtraction went negative and was clamped to zero.
    pub clamped: bool,
}

/// A [`CycleTimer`] that subtracts the cost of timer interrupts.
///
/// The first [`start`](Self::start) runs a calibration pass (a busy-wait of
/// roughly one second of CPU time with default settings, bounded by
/// [`Config::max_duration`]). The estimate is kept for the life of the timer
/// and never recomputed.
///
/// Like [`CycleTimer`], an instance is meant for one thread at a time.
///
/// # Example
///
/// ```no_run
/// use cycle_clock::{CompensatedTimer, Config};
///
/// let mut timer = CompensatedTimer::with_config(Config::quick()).unwrap();
/// timer.start();
/// let mut acc = 0u64;
/// for i in 0..50_000_000u64 {
///     acc = acc.wrapping_mul(31).wrapping_add(std::hint::black_box(i));
/// }
/// let m = timer.stop_detailed();
/// assert!(m.compensated_cycles <= m.raw_cycles);
/// # let _ = acc;
/// ```
#[derive(Debug)]
pub struct CompensatedTimer<C: HardwareCounter = PlatformCounter, T: TickSource = ProcessTicks> {
    timer: CycleTimer<C>,
    ticks: T,
    config: Config,
    calibration: Option<Calibration>,
    start_tick: Ticks,
    warned: bool,
}

impl CompensatedTimer<PlatformCounter, ProcessTicks> {
    /// Timer on the platform counter and process ticks, default configuration.
    pub fn new() -> Self {
        let ticks = ProcessTicks::new();
        let start_tick = ticks.user_ticks();
        Self {
            timer: CycleTimer::new(),
            ticks,
            config: Config::default(),
            calibration: None,
            start_tick,
            warned: false,
        }
    }

    /// Timer on the platform sources with a custom configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        Self::with_sources(PlatformCounter, ProcessTicks::new(), config)
    }
}

impl Default for CompensatedTimer<PlatformCounter, ProcessTicks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HardwareCounter, T: TickSource> CompensatedTimer<C, T> {
    /// Timer on arbitrary counter and tick sources.
    pub fn with_sources(counter: C, ticks: T, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let start_tick = ticks.user_ticks();
        Ok(Self {
            timer: CycleTimer::with_counter(counter),
            ticks,
            config,
            calibration: None,
            start_tick,
            warned: false,
        })
    }

    /// Timer with a calibration computed elsewhere. No calibration pass runs.
    pub fn with_calibration(
        counter: C,
        ticks: T,
        config: Config,
        calibration: Calibration,
    ) -> Result<Self, ConfigError> {
        let mut timer = Self::with_sources(counter, ticks, config)?;
        timer.calibration = Some(calibration);
        Ok(timer)
    }

    /// Run calibration now if it has not run yet.
    pub fn calibrate(&mut self) -> &Calibration {
        if self.calibration.is_none() {
            tracing::debug!(
                counter = self.timer.counter().name(),
                events = self.config.events,
                "calibrating timer interrupt overhead"
            );
        }
        let Self {
            timer,
            ticks,
            config,
            calibration,
            ..
        } = self;
        calibration.get_or_insert_with(|| calibrate(timer, &*ticks, config))
    }

    /// The calibration result, if calibration has run.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Estimated cycles per tick, `0.0` while uncalibrated.
    ///
    /// An incomplete calibration may still carry a partial estimate here;
    /// [`stop`](Self::stop) only subtracts it once calibration completed.
    pub fn cycles_per_tick(&self) -> f64 {
        self.calibration.as_ref().map_or(0.0, |c| c.cycles_per_tick)
    }

    /// Begin a measurement, calibrating first on the initial call.
    pub fn start(&mut self) {
        self.calibrate();
        self.start_tick = self.ticks.user_ticks();
        self.timer.start();
    }

    /// Compensated cycles since the last [`start`](Self::start).
    pub fn stop(&mut self) -> CycleDelta {
        self.stop_detailed().compensated_cycles
    }

    /// Like [`stop`](Self::stop), with the raw reading and tick count.
    pub fn stop_detailed(&mut self) -> CompensatedMeasurement {
        let raw_cycles = self.timer.stop();
        let ticks_elapsed = self.ticks.user_ticks().saturating_sub(self.start_tick);

        let cycles_per_tick = match &self.calibration {
            Some(cal) if cal.is_complete() && cal.is_calibrated() => cal.cycles_per_tick,
            _ => 0.0,
        };
        if cycles_per_tick <= 0.0 {
            if !self.warned {
                self.warned = true;
                match self.calibration.as_ref().map(|c| &c.status) {
                    Some(CalibrationStatus::Incomplete { reason }) => tracing::warn!(
                        partial_cycles_per_tick = self.cycles_per_tick(),
                        "interrupt calibration incomplete ({}); compensated timer reports raw cycles",
                        reason
                    ),
                    _ => tracing::warn!(
                        "no interrupt calibration available; compensated timer reports raw cycles"
                    ),
                }
            }
            return CompensatedMeasurement {
                raw_cycles,
                ticks_elapsed,
                compensated_cycles: raw_cycles,
                compensation_applied: false,
                clamped: false,
            };
        }

        let adjusted = raw_cycles - ticks_elapsed as f64 * cycles_per_tick;
        let clamped = adjusted < 0.0;
        if clamped {
            tracing::warn!(
                raw_cycles,
                ticks_elapsed,
                cycles_per_tick,
                "compensated delta went negative; clamping to 0"
            );
        }

        CompensatedMeasurement {
            raw_cycles,
            ticks_elapsed,
            compensated_cycles: adjusted.max(0.0),
            compensation_applied: true,
            clamped,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying raw timer.
    pub fn raw_timer(&self) -> &CycleTimer<C> {
        &self.timer
    }
}
