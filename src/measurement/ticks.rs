//! Process CPU-time source in scheduler ticks.
//!
//! The calibration pass needs a clock that is much coarser than the cycle
//! counter and that only advances while this process runs in user mode. On
//! Unix that is `times(2)`'s `tms_utime`, reported in `_SC_CLK_TCK` units
//! (100 per second on Linux regardless of the kernel's `CONFIG_HZ`).

use crate::types::Ticks;

/// Source of process CPU time, in whole ticks.
pub trait TickSource {
    /// User-mode CPU ticks consumed by this process so far.
    fn user_ticks(&self) -> Ticks;
}

impl<S: TickSource + ?Sized> TickSource for &S {
    fn user_ticks(&self) -> Ticks {
        (**self).user_ticks()
    }
}

/// Process CPU-time accounting provided by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTicks {
    #[cfg(not(unix))]
    _private: (),
}

impl ProcessTicks {
    /// Create a handle to the process tick counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks per second reported by the OS.
    ///
    /// Falls back to 100 if `sysconf` does not know the value.
    pub fn ticks_per_second() -> u64 {
        #[cfg(unix)]
        {
            // SAFETY: sysconf has no preconditions.
            let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
            if hz > 0 {
                hz as u64
            } else {
                100
            }
        }

        #[cfg(not(unix))]
        {
            1_000 / FALLBACK_TICK_MS
        }
    }
}

#[cfg(unix)]
impl TickSource for ProcessTicks {
    fn user_ticks(&self) -> Ticks {
        let mut t = libc::tms {
            tms_utime: 0,
            tms_stime: 0,
            tms_cutime: 0,
            tms_cstime: 0,
        };
        // SAFETY: `t` is a valid, writable tms struct for the duration of the call.
        unsafe {
            libc::times(&mut t);
        }
        t.tms_utime.max(0) as Ticks
    }
}

/// Tick length used where no process-time accounting is available.
#[cfg(not(unix))]
const FALLBACK_TICK_MS: u64 = 10;

#[cfg(not(unix))]
impl TickSource for ProcessTicks {
    fn user_ticks(&self) -> Ticks {
        use std::sync::OnceLock;
        use std::time::Instant;

        static ORIGIN: OnceLock<Instant> = OnceLock::new();

        let origin = ORIGIN.get_or_init(Instant::now);
        origin.elapsed().as_millis() as u64 / FALLBACK_TICK_MS
    }
}
