//! Measurement infrastructure.
//!
//! This module provides:
//! - The hardware cycle counter behind the [`HardwareCounter`] trait
//! - The process CPU-tick source behind the [`TickSource`] trait
//! - [`CycleTimer`], the raw start/stop timer
//! - CPU affinity pinning used while calibrating
//! - Scripted sources for deterministic tests ([`mock`])
//!
//! # Counter Selection
//!
//! The counter is picked at compile time:
//! - **x86_64**: `rdtsc` (invariant TSC on modern parts, runs at the nominal clock)
//! - **aarch64**: `cntvct_el0` virtual timer (fixed SoC frequency)
//! - **other**: `std::time::Instant` nanoseconds
//!
//! ARM64 virtual timer frequency depends on the SoC:
//! - ARMv8.6+ (Graviton4): 1 GHz
//! - Apple Silicon: 24 MHz
//! - Raspberry Pi 4: 54 MHz
//!
//! On those parts one "cycle" is one counter tick, not one core clock.

pub mod affinity;
mod counter;
mod error;
pub mod mock;
mod ticks;
mod timer;

pub use counter::{black_box, read_counter, HardwareCounter, PlatformCounter};
pub use error::{CalibrationError, ConfigError, DescriptorError};
pub use ticks::{ProcessTicks, TickSource};
pub use timer::CycleTimer;
