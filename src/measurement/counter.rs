//! Platform-specific hardware cycle counter.
//!
//! Provides the free-running counter read through:
//! - x86_64: `lfence; rdtsc` with compiler fences
//! - aarch64: `isb; mrs cntvct_el0` with compiler fences
//! - Fallback: nanoseconds since a process-wide `Instant` origin
//!
//! The choice is made at compile time. Code above this module only sees the
//! [`HardwareCounter`] trait.

use std::hint::black_box as std_black_box;

use crate::types::CycleCount;

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
///
/// Use this to wrap work being measured so the compiler can neither elide it
/// nor move it across the counter reads.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// A monotonically increasing counter that can be sampled cheaply.
pub trait HardwareCounter {
    /// Read the current counter value.
    fn read(&self) -> CycleCount;

    /// Counter name for diagnostics.
    fn name(&self) -> &'static str;
}

impl<C: HardwareCounter + ?Sized> HardwareCounter for &C {
    #[inline]
    fn read(&self) -> CycleCount {
        (**self).read()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// The architecture's free-running counter register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCounter;

impl PlatformCounter {
    /// Create a handle to the platform counter.
    pub fn new() -> Self {
        Self
    }
}

impl HardwareCounter for PlatformCounter {
    #[inline]
    fn read(&self) -> CycleCount {
        read_counter()
    }

    fn name(&self) -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            "rdtsc"
        }
        #[cfg(target_arch = "aarch64")]
        {
            "cntvct_el0"
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            "Instant"
        }
    }
}

/// Read the CPU cycle counter with appropriate serialization.
///
/// On x86_64, this uses `lfence; rdtsc` to ensure all prior instructions
/// complete before reading the timestamp counter.
///
/// On aarch64, this uses `isb; mrs cntvct_el0` for the virtual timer count.
/// The virtual counter ticks at a fixed SoC frequency (24 MHz on Apple
/// Silicon, 1 GHz on ARMv8.6+), not at the core clock.
#[inline]
pub fn read_counter() -> CycleCount {
    #[cfg(target_arch = "x86_64")]
    {
        rdtsc_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        cntvct_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        instant_fallback()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtsc_x86_64() -> CycleCount {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    // SAFETY: lfence and rdtsc have no memory operands and touch only rax/rdx.
    unsafe {
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    cycles
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn cntvct_aarch64() -> CycleCount {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let cycles: u64;
    // SAFETY: cntvct_el0 is readable from EL0 on every supported OS.
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    cycles
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn instant_fallback() -> CycleCount {
    use std::sync::OnceLock;
    use std::time::Instant;

    static ORIGIN: OnceLock<Instant> = OnceLock::new();

    let origin = ORIGIN.get_or_init(Instant::now);
    origin.elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_counter_monotonic() {
        let a = read_counter();
        let b = read_counter();
        assert!(b >= a || a.saturating_sub(b) < 1000);
    }

    #[test]
    fn test_counter_advances_over_work() {
        let counter = PlatformCounter::new();
        let a = counter.read();
        let mut sum = 0u64;
        for i in 0..100_000u64 {
            sum = sum.wrapping_add(black_box(i));
        }
        black_box(sum);
        let b = counter.read();
        assert!(b > a, "counter did not advance: {} -> {}", a, b);
    }

    #[test]
    fn test_counter_name() {
        let name = PlatformCounter.name();
        assert!(["rdtsc", "cntvct_el0", "Instant"].contains(&name));
    }
}
