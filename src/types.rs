//! Type aliases and common types.

/// Raw snapshot of the hardware cycle counter.
pub type CycleCount = u64;

/// Elapsed cycles between two counter snapshots.
///
/// Always non-negative when handed to callers; a counter that runs backwards
/// is reported as `0.0` and flagged instead.
pub type CycleDelta = f64;

/// Process CPU time in scheduler ticks (`_SC_CLK_TCK` units on Unix).
pub type Ticks = u64;
