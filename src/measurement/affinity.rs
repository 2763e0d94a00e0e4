//! Keep the calling thread on one CPU while cycles are being compared.
//!
//! Cycle counters of different cores are not guaranteed to agree. Calibration
//! compares counter readings taken thousands of times in a row, so a single
//! migration can produce a bogus (or negative) gap. [`AffinityGuard`] pins the
//! thread to the CPU it is currently running on and restores the previous
//! mask when dropped.
//!
//! Only Linux enforces the pin (`sched_setaffinity`, no privileges needed).
//! Elsewhere [`AffinityGuard::try_pin`] reports [`AffinityResult::NotPinned`]
//! and measurement continues unpinned.

/// Outcome of a pin attempt.
#[derive(Debug)]
pub enum AffinityResult {
    /// Pinned; keep the guard alive for as long as the pin is needed.
    Pinned(AffinityGuard),
    /// Not pinned; the reason is informational only.
    NotPinned {
        /// Why the pin was not applied.
        reason: String,
    },
}

impl AffinityResult {
    /// The guard, if the pin succeeded.
    pub fn into_guard(self) -> Option<AffinityGuard> {
        match self {
            AffinityResult::Pinned(guard) => Some(guard),
            AffinityResult::NotPinned { reason } => {
                tracing::debug!("CPU affinity not pinned: {}", reason);
                None
            }
        }
    }
}

/// RAII guard restoring the thread's original CPU mask on drop.
pub struct AffinityGuard {
    #[cfg(target_os = "linux")]
    original_mask: libc::cpu_set_t,
    #[cfg(target_os = "linux")]
    cpu: usize,
    #[cfg(not(target_os = "linux"))]
    _private: (),
}

impl AffinityGuard {
    /// Pin the current thread to the CPU it is running on.
    pub fn try_pin() -> AffinityResult {
        #[cfg(target_os = "linux")]
        {
            Self::try_pin_linux()
        }

        #[cfg(not(target_os = "linux"))]
        {
            AffinityResult::NotPinned {
                reason: "CPU affinity pinning is only supported on Linux".to_string(),
            }
        }
    }

    /// CPU the thread is pinned to.
    #[cfg(target_os = "linux")]
    pub fn cpu(&self) -> usize {
        self.cpu
    }

    #[cfg(target_os = "linux")]
    fn try_pin_linux() -> AffinityResult {
        use std::mem::{size_of, MaybeUninit};

        // SAFETY: the masks are plain bitsets sized by size_of::<cpu_set_t>(),
        // and pid 0 addresses the calling thread.
        unsafe {
            let mut original = MaybeUninit::<libc::cpu_set_t>::uninit();
            if libc::sched_getaffinity(0, size_of::<libc::cpu_set_t>(), original.as_mut_ptr()) != 0
            {
                return AffinityResult::NotPinned {
                    reason: format!(
                        "sched_getaffinity failed: {}",
                        std::io::Error::last_os_error()
                    ),
                };
            }
            let original_mask = original.assume_init();

            let cpu = libc::sched_getcpu();
            if cpu < 0 {
                return AffinityResult::NotPinned {
                    reason: format!("sched_getcpu failed: {}", std::io::Error::last_os_error()),
                };
            }

            let mut mask: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut mask);
            libc::CPU_SET(cpu as usize, &mut mask);

            if libc::sched_setaffinity(0, size_of::<libc::cpu_set_t>(), &mask) != 0 {
                return AffinityResult::NotPinned {
                    reason: format!(
                        "sched_setaffinity failed: {}",
                        std::io::Error::last_os_error()
                    ),
                };
            }

            tracing::debug!("pinned thread to CPU {}", cpu);

            AffinityResult::Pinned(AffinityGuard {
                original_mask,
                cpu: cpu as usize,
            })
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for AffinityGuard {
    fn drop(&mut self) {
        // SAFETY: original_mask was filled by sched_getaffinity.
        let result = unsafe {
            libc::sched_setaffinity(
                0,
                std::mem::size_of::<libc::cpu_set_t>(),
                &self.original_mask,
            )
        };

        if result != 0 {
            tracing::warn!(
                "failed to restore CPU affinity: {}",
                std::io::Error::last_os_error()
            );
        } else {
            tracing::debug!("restored CPU affinity after pinning to CPU {}", self.cpu);
        }
    }
}

impl std::fmt::Debug for AffinityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        #[allow(unused_mut)]
        let mut s = f.debug_struct("AffinityGuard");
        #[cfg(target_os = "linux")]
        s.field("cpu", &self.cpu);
        s.finish()
    }
}
