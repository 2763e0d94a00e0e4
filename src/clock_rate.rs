//! Clock-rate discovery.
//!
//! Two interchangeable strategies:
//! - **Descriptor**: read the nominal `cpu MHz` from `/proc/cpuinfo`. Fast,
//!   trusts the OS, falls back to 1.0 GHz when the file is unusable.
//! - **Measured**: count cycles across a `sleep` of whole seconds. Slow, but
//!   independent of the OS descriptor, and the right answer for counters that
//!   do not tick at the core clock (e.g. `cntvct_el0`).
//!
//! Results are cached in the estimator. Repeating the same strategy returns
//! the cached value without touching the system again.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::constants::{CPU_MHZ_TOKEN, FALLBACK_CLOCK_GHZ};
use crate::measurement::{CycleTimer, DescriptorError, HardwareCounter, PlatformCounter};
use crate::types::CycleDelta;

/// Where a [`ClockRate`] came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RateSource {
    /// Parsed from the system descriptor.
    Descriptor,
    /// Cycles counted across a sleep.
    Measured {
        /// Sleep length in seconds.
        seconds: u64,
    },
    /// The descriptor was unusable and the 1.0 GHz default was substituted.
    ///
    /// This is an approximation, not a measurement.
    Fallback {
        /// Why the descriptor could not be used.
        reason: DescriptorError,
    },
}

/// A counter frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockRate {
    /// Frequency in GHz (cycles per nanosecond).
    pub ghz: f64,
    /// How the value was obtained.
    pub source: RateSource,
}

impl ClockRate {
    /// The 1.0 GHz default, tagged with why it was needed.
    pub fn fallback(reason: DescriptorError) -> Self {
        Self {
            ghz: FALLBACK_CLOCK_GHZ,
            source: RateSource::Fallback { reason },
        }
    }

    /// Frequency in GHz.
    pub fn ghz(&self) -> f64 {
        self.ghz
    }

    /// Frequency in MHz.
    pub fn mhz(&self) -> f64 {
        self.ghz * 1_000.0
    }

    /// Frequency in Hz.
    pub fn hz(&self) -> f64 {
        self.ghz * 1e9
    }

    /// Whether this is the default rather than a discovered value.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, RateSource::Fallback { .. })
    }

    /// Convert cycles to nanoseconds.
    #[inline]
    pub fn cycles_to_ns(&self, cycles: CycleDelta) -> f64 {
        cycles / self.ghz
    }

    /// Convert cycles to seconds.
    #[inline]
    pub fn cycles_to_seconds(&self, cycles: CycleDelta) -> f64 {
        cycles / self.hz()
    }
}

/// Extract the first `cpu MHz` value from a descriptor.
///
/// The value is the number after the `:` on the first line containing
/// `cpu MHz`; later lines (other cores) are ignored.
pub fn parse_cpu_mhz<R: BufRead>(mut reader: R) -> Result<f64, DescriptorError> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| DescriptorError::Unreadable {
                path: "<reader>".to_string(),
                reason: e.to_string(),
            })?;
        if read == 0 {
            return Err(DescriptorError::NoMatch);
        }

        let line = String::from_utf8_lossy(&buf);
        if !line.contains(CPU_MHZ_TOKEN) {
            continue;
        }

        let mhz = line
            .split_once(':')
            .and_then(|(_, value)| value.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| DescriptorError::Unparsable {
                line: line.trim().to_string(),
            })?;

        if mhz == 0.0 {
            return Err(DescriptorError::ZeroFrequency);
        }
        return Ok(mhz);
    }
}

/// Read the descriptor at `path` and return its clock rate.
pub fn read_descriptor(path: &Path) -> Result<ClockRate, DescriptorError> {
    let file = File::open(path).map_err(|e| DescriptorError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mhz = parse_cpu_mhz(BufReader::new(file)).map_err(|e| match e {
        DescriptorError::Unreadable { reason, .. } => DescriptorError::Unreadable {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;

    Ok(ClockRate {
        ghz: mhz / 1_000.0,
        source: RateSource::Descriptor,
    })
}

/// Discovers and caches the counter frequency.
///
/// # Example
///
/// ```no_run
/// use cycle_clock::ClockRateEstimator;
///
/// let mut estimator = ClockRateEstimator::new();
/// let mhz = estimator.from_descriptor(true);
/// assert!(mhz > 0.0);
/// ```
#[derive(Debug)]
pub struct ClockRateEstimator<C: HardwareCounter = PlatformCounter> {
    timer: CycleTimer<C>,
    descriptor_path: PathBuf,
    cached: Option<ClockRate>,
}

impl ClockRateEstimator<PlatformCounter> {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create using the descriptor path from `config`.
    pub fn with_config(config: &Config) -> Self {
        Self::with_counter(PlatformCounter, config.descriptor_path.clone())
    }
}

impl Default for ClockRateEstimator<PlatformCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HardwareCounter> ClockRateEstimator<C> {
    /// Create on an arbitrary counter and descriptor path.
    pub fn with_counter(counter: C, descriptor_path: impl Into<PathBuf>) -> Self {
        Self {
            timer: CycleTimer::with_counter(counter),
            descriptor_path: descriptor_path.into(),
            cached: None,
        }
    }

    /// Clock rate in MHz from the system descriptor.
    ///
    /// Never fails: an unusable descriptor yields exactly 1000.0 MHz and a
    /// warning. With `verbose` the discovered rate is logged at info level.
    pub fn from_descriptor(&mut self, verbose: bool) -> f64 {
        self.descriptor_rate(verbose).mhz()
    }

    /// Like [`from_descriptor`](Self::from_descriptor), returning the full rate.
    pub fn descriptor_rate(&mut self, verbose: bool) -> &ClockRate {
        let reuse = matches!(
            self.cached,
            Some(ClockRate {
                source: RateSource::Descriptor | RateSource::Fallback { .. },
                ..
            })
        );
        if !reuse {
            let rate = match read_descriptor(&self.descriptor_path) {
                Ok(rate) => {
                    if verbose {
                        tracing::info!(
                            "Processor Clock Rate ~= {:.4} GHz (extracted from file)",
                            rate.ghz
                        );
                    } else {
                        tracing::debug!(ghz = rate.ghz, "clock rate from descriptor");
                    }
                    rate
                }
                Err(reason) => {
                    tracing::warn!(
                        "{}; assuming {:.1} GHz",
                        reason,
                        FALLBACK_CLOCK_GHZ
                    );
                    ClockRate::fallback(reason)
                }
            };
            self.cached = Some(rate);
        }
        self.cached_or_fallback()
    }

    /// Clock rate in MHz measured across a sleep of `seconds`.
    ///
    /// Blocks the calling thread for the whole sleep; it cannot be cancelled.
    /// A zero duration is raised to one second.
    pub fn measured(&mut self, verbose: bool, seconds: u64) -> f64 {
        self.measured_rate(verbose, seconds).mhz()
    }

    /// Like [`measured`](Self::measured), returning the full rate.
    pub fn measured_rate(&mut self, verbose: bool, seconds: u64) -> &ClockRate {
        let reuse = matches!(
            self.cached,
            Some(ClockRate {
                source: RateSource::Measured { .. },
                ..
            })
        );
        if !reuse {
            let seconds = if seconds == 0 {
                tracing::warn!("clock rate measurement needs a non-zero sleep; using 1 s");
                1
            } else {
                seconds
            };

            self.timer.start();
            std::thread::sleep(Duration::from_secs(seconds));
            let cycles = self.timer.stop();

            let mhz = cycles / (1e6 * seconds as f64);
            if verbose {
                tracing::info!("Processor Clock Rate ~= {:.1} MHz", mhz);
            } else {
                tracing::debug!(mhz, seconds, "measured clock rate");
            }

            self.cached = Some(ClockRate {
                ghz: mhz / 1_000.0,
                source: RateSource::Measured { seconds },
            });
        }
        self.cached_or_fallback()
    }

    /// The cached rate, if any strategy has run.
    pub fn cached(&self) -> Option<&ClockRate> {
        self.cached.as_ref()
    }

    /// Forget the cached rate so the next call recomputes it.
    pub fn clear(&mut self) {
        self.cached = None;
    }

    /// Descriptor path this estimator reads.
    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }

    fn cached_or_fallback(&mut self) -> &ClockRate {
        self.cached
            .get_or_insert_with(|| ClockRate::fallback(DescriptorError::NoMatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::mock::MockCounter;
    use std::io::Cursor;

    const CPUINFO: &str = "processor\t: 0\n\
vendor_id\t: GenuineIntel\n\
model name\t: Intel(R) Xeon(R) CPU @ 2.20GHz\n\
cpu MHz\t\t: 2200.156\n\
cache size\t: 56320 KB\n\
\n\
processor\t: 1\n\
cpu MHz\t\t: 3100.000\n";

    #[test]
    fn test_parse_first_match() {
        let mhz = parse_cpu_mhz(Cursor::new(CPUINFO)).unwrap();
        assert!((mhz - 2200.156).abs() < 1e-9);
    }

    #[test]
    fn test_parse_no_match() {
        let text = "processor\t: 0\nBogoMIPS\t: 48.00\n";
        assert_eq!(
            parse_cpu_mhz(Cursor::new(text)),
            Err(DescriptorError::NoMatch)
        );
    }

    #[test]
    fn test_parse_zero_is_error() {
        let text = "cpu MHz\t\t: 0.000\n";
        assert_eq!(
            parse_cpu_mhz(Cursor::new(text)),
            Err(DescriptorError::ZeroFrequency)
        );
    }

    #[test]
    fn test_parse_garbage_value() {
        let text = "cpu MHz\t\t: fast\n";
        assert!(matches!(
            parse_cpu_mhz(Cursor::new(text)),
            Err(DescriptorError::Unparsable { .. })
        ));
    }

    #[test]
    fn test_rate_conversions() {
        let rate = ClockRate {
            ghz: 2.0,
            source: RateSource::Descriptor,
        };
        assert_eq!(rate.mhz(), 2_000.0);
        assert_eq!(rate.hz(), 2e9);
        assert_eq!(rate.cycles_to_ns(4_000.0), 2_000.0);
        assert_eq!(rate.cycles_to_seconds(2e9), 1.0);
        assert!(!rate.is_fallback());
    }

    #[test]
    fn test_missing_descriptor_falls_back() {
        let mut estimator =
            ClockRateEstimator::with_counter(PlatformCounter, "/nonexistent/cpuinfo");
        assert_eq!(estimator.from_descriptor(false), 1000.0);
        let rate = estimator.cached().unwrap();
        assert!(rate.is_fallback());
        assert!(matches!(
            rate.source,
            RateSource::Fallback {
                reason: DescriptorError::Unreadable { .. }
            }
        ));
    }

    #[test]
    fn test_measured_uses_cycles_over_sleep() {
        let counter = MockCounter::new(3_000_000_000);
        let mut estimator = ClockRateEstimator::with_counter(counter, "/nonexistent");
        // One read at construction, one at start, one at stop: 3e9 cycles over 1 s.
        let mhz = estimator.measured(false, 1);
        assert!((mhz - 3_000.0).abs() < 1e-6, "mhz = {}", mhz);

        // Cached: the second call does not sleep or read the counter again.
        let again = estimator.measured(false, 1);
        assert_eq!(mhz, again);
        assert!(matches!(
            estimator.cached().unwrap().source,
            RateSource::Measured { seconds: 1 }
        ));
    }

    #[test]
    fn test_strategy_switch_recomputes() {
        let counter = MockCounter::new(2_000_000_000);
        let mut estimator = ClockRateEstimator::with_counter(counter, "/nonexistent");
        assert_eq!(estimator.from_descriptor(false), 1000.0);
        assert!(estimator.cached().unwrap().is_fallback());

        let mhz = estimator.measured(false, 1);
        assert!((mhz - 2_000.0).abs() < 1e-6, "mhz = {}", mhz);
        assert!(!estimator.cached().unwrap().is_fallback());

        estimator.clear();
        assert!(estimator.cached().is_none());
    }
}
