//! Start/stop cycle timer on top of a [`HardwareCounter`].

use super::counter::{black_box, HardwareCounter, PlatformCounter};
use crate::types::{CycleCount, CycleDelta};

/// Raw start/stop cycle timer.
///
/// Each instance owns its snapshot slot, so independent timers never disturb
/// each other. A single instance is not meant to be shared between threads:
/// `start` and `stop` take `&mut self`, and the measurement is only meaningful
/// if both run on the same core (or the counter is synchronized across cores).
///
/// # Example
///
/// ```
/// use cycle_clock::CycleTimer;
///
/// let mut timer = CycleTimer::new();
/// timer.start();
/// let mut sum = 0u64;
/// for i in 0..1_000u64 {
///     sum = sum.wrapping_add(std::hint::black_box(i));
/// }
/// let cycles = timer.stop();
/// assert!(cycles >= 0.0);
/// # let _ = sum;
/// ```
#[derive(Debug, Clone)]
pub struct CycleTimer<C: HardwareCounter = PlatformCounter> {
    counter: C,
    snapshot: CycleCount,
    anomalies: u64,
}

impl CycleTimer<PlatformCounter> {
    /// Create a timer on the platform counter.
    pub fn new() -> Self {
        Self::with_counter(PlatformCounter)
    }
}

impl Default for CycleTimer<PlatformCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HardwareCounter> CycleTimer<C> {
    /// Create a timer on an arbitrary counter.
    ///
    /// The snapshot is seeded with the current reading, so a `stop` without a
    /// prior `start` measures from construction.
    pub fn with_counter(counter: C) -> Self {
        let snapshot = counter.read();
        Self {
            counter,
            snapshot,
            anomalies: 0,
        }
    }

    /// Record the current counter value as the start of the interval.
    #[inline]
    pub fn start(&mut self) {
        self.snapshot = self.counter.read();
    }

    /// Cycles elapsed since the last [`start`](Self::start).
    ///
    /// The snapshot is left untouched, so calling `stop` repeatedly returns
    /// the running total since the same `start`. The calibration pass relies
    /// on this.
    ///
    /// A counter that went backwards (wraparound, or migration to a core whose
    /// counter lags) yields `0.0` and is counted in [`anomalies`](Self::anomalies).
    #[inline]
    pub fn stop(&mut self) -> CycleDelta {
        let now = self.counter.read();
        match now.checked_sub(self.snapshot) {
            Some(delta) => delta as CycleDelta,
            None => {
                self.anomalies += 1;
                tracing::warn!(
                    start = self.snapshot,
                    end = now,
                    "cycle counter went backwards; reporting 0 cycles"
                );
                0.0
            }
        }
    }

    /// Cost of an empty `start`/`stop` pair.
    ///
    /// The pair runs twice and the second result is returned, so the first
    /// pass pulls the timer code and data into cache.
    pub fn overhead_estimate(&mut self) -> CycleDelta {
        let mut result = 0.0;
        for _ in 0..2 {
            self.start();
            result = self.stop();
        }
        result
    }

    /// Time a closure.
    #[inline]
    pub fn measure<F, T>(&mut self, f: F) -> CycleDelta
    where
        F: FnOnce() -> T,
    {
        self.start();
        black_box(f());
        self.stop()
    }

    /// Counter value captured by the last `start`.
    pub fn snapshot(&self) -> CycleCount {
        self.snapshot
    }

    /// Number of backwards readings seen by `stop`.
    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    /// The underlying counter.
    pub fn counter(&self) -> &C {
        &self.counter
    }
}
