//! Timer-interrupt overhead calibration.
//!
//! On a preemptible OS every scheduler tick runs an interrupt handler (and
//! sometimes other processes) in the middle of whatever is being measured.
//! Calibration estimates how many counter cycles one tick costs, so that
//! [`CompensatedTimer`](crate::CompensatedTimer) can subtract it later.
//!
//! # Method
//!
//! The thread spins, reading the cycle timer in a tight loop. Whenever at
//! least `threshold_cycles` have passed since the previous crossing, the
//! process tick counter is read as well. A crossing whose gap also spans a
//! tick boundary contains the interrupt, so
//!
//! ```text
//! candidate = gap_cycles / ticks_advanced
//! ```
//!
//! Every tick boundary counts as one event. Candidates at or below
//! `record_threshold_cycles` are ordinary polls and do not enter the
//! estimate. Among the accepted candidates the minimum wins: it is the gap
//! least polluted by unrelated preemption. The loop ends after `events`
//! tick boundaries.
//!
//! # Termination
//!
//! If the tick counter never advances (too coarse, or not accounting user
//! time) the loop cannot finish on its own. `max_iterations` and
//! `max_duration` bound it; hitting either yields a
//! [`CalibrationStatus::Incomplete`] result instead of a hang. With both
//! bounds set to `None` the loop is unbounded.
//!
//! A run that sees all its events but accepts none of them is also
//! incomplete ([`CalibrationError::NoCandidate`]): on that machine the
//! record threshold is above the real cost of a tick.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::measurement::affinity::AffinityGuard;
use crate::measurement::{CalibrationError, CycleTimer, HardwareCounter, TickSource};
use crate::types::Ticks;

/// Polls between wall-clock checks when no threshold crossing happens.
const WALL_CHECK_INTERVAL: u64 = 4_096;

/// Whether calibration collected all requested events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalibrationStatus {
    /// Calibration has not run.
    NotRun,
    /// All events were collected and at least one candidate was accepted.
    Complete,
    /// A bound stopped the loop early, or no candidate was accepted.
    Incomplete {
        /// What went wrong, and how far calibration got.
        reason: CalibrationError,
    },
}

/// Outcome of a calibration pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Estimated cycles consumed per scheduler tick (0.0 = uncalibrated).
    pub cycles_per_tick: f64,
    /// Tick boundaries observed.
    pub events: usize,
    /// Boundaries whose candidate entered the estimate.
    pub accepted: usize,
    /// Boundaries whose candidate fell at or below the record threshold.
    pub rejected: usize,
    /// Timer polls performed.
    pub iterations: u64,
    /// Wall time spent calibrating.
    pub elapsed: Duration,
    /// Whether the thread was pinned to one CPU throughout.
    pub pinned: bool,
    /// Completion status.
    pub status: CalibrationStatus,
}

impl Calibration {
    /// The state before any calibration has run.
    pub fn uncalibrated() -> Self {
        Self {
            cycles_per_tick: 0.0,
            events: 0,
            accepted: 0,
            rejected: 0,
            iterations: 0,
            elapsed: Duration::ZERO,
            pinned: false,
            status: CalibrationStatus::NotRun,
        }
    }

    /// Whether a usable cycles-per-tick estimate exists.
    pub fn is_calibrated(&self) -> bool {
        self.cycles_per_tick > 0.0
    }

    /// Whether the run collected every event and produced an estimate.
    pub fn is_complete(&self) -> bool {
        matches!(self.status, CalibrationStatus::Complete)
    }

    /// Estimated interrupt overhead for `ticks` scheduler ticks.
    pub fn overhead_cycles(&self, ticks: Ticks) -> f64 {
        ticks as f64 * self.cycles_per_tick
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::uncalibrated()
    }
}

/// Run one calibration pass.
///
/// Busy-waits on the calling thread until `config.events` tick boundaries
/// are seen or a configured bound is hit. The timer's snapshot is
/// overwritten.
pub fn calibrate<C, T>(timer: &mut CycleTimer<C>, ticks: &T, config: &Config) -> Calibration
where
    C: HardwareCounter,
    T: TickSource + ?Sized,
{
    let guard = if config.pin_during_calibration {
        AffinityGuard::try_pin().into_guard()
    } else {
        None
    };

    let started = Instant::now();
    let threshold = config.threshold_cycles as f64;

    let mut best: Option<f64> = None;
    let mut events = 0usize;
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut iterations = 0u64;
    let mut status = CalibrationStatus::Complete;

    let mut old_ticks = ticks.user_ticks();
    timer.start();
    let mut old_cycles = timer.stop();

    while events < config.events {
        if let Some(max) = config.max_iterations {
            if iterations >= max {
                status = CalibrationStatus::Incomplete {
                    reason: CalibrationError::IterationLimit { iterations, events },
                };
                break;
            }
        }
        iterations += 1;

        let new_cycles = timer.stop();
        let crossed = new_cycles - old_cycles >= threshold;

        if crossed || iterations % WALL_CHECK_INTERVAL == 0 {
            if let Some(limit) = config.max_duration {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    status = CalibrationStatus::Incomplete {
                        reason: CalibrationError::Timeout {
                            elapsed_ms: elapsed.as_millis() as u64,
                            events,
                        },
                    };
                    break;
                }
            }
        }

        if !crossed {
            continue;
        }

        let new_ticks = ticks.user_ticks();
        if new_ticks > old_ticks {
            events += 1;
            let candidate = (new_cycles - old_cycles) / (new_ticks - old_ticks) as f64;
            if candidate > config.record_threshold_cycles {
                accepted += 1;
                best = Some(best.map_or(candidate, |b| b.min(candidate)));
            } else {
                rejected += 1;
            }
            old_ticks = new_ticks;
        }
        old_cycles = new_cycles;
    }

    if status == CalibrationStatus::Complete && best.is_none() {
        status = CalibrationStatus::Incomplete {
            reason: CalibrationError::NoCandidate {
                events,
                record_threshold_cycles: config.record_threshold_cycles,
            },
        };
    }

    let calibration = Calibration {
        cycles_per_tick: best.unwrap_or(0.0),
        events,
        accepted,
        rejected,
        iterations,
        elapsed: started.elapsed(),
        pinned: guard.is_some(),
        status,
    };
    drop(guard);

    match &calibration.status {
        CalibrationStatus::Complete => tracing::debug!(
            cycles_per_tick = calibration.cycles_per_tick,
            events = calibration.events,
            accepted = calibration.accepted,
            rejected = calibration.rejected,
            iterations = calibration.iterations,
            "Setting cycles per tick to {:.1}",
            calibration.cycles_per_tick
        ),
        CalibrationStatus::Incomplete { reason } => tracing::warn!(
            cycles_per_tick = calibration.cycles_per_tick,
            "interrupt calibration incomplete: {}",
            reason
        ),
        CalibrationStatus::NotRun => {}
    }

    calibration
}
