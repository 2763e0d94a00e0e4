//! Scripted counter and tick sources.
//!
//! Real counters and tick clocks depend on the machine and on the scheduler,
//! which makes the calibration arithmetic hard to check. These sources replay
//! a fixed script instead:
//!
//! ```
//! use cycle_clock::measurement::mock::{MockCounter, MockTicks};
//! use cycle_clock::measurement::{HardwareCounter, TickSource};
//!
//! let counter = MockCounter::from_values([10, 25]);
//! assert_eq!(counter.read(), 10);
//! assert_eq!(counter.read(), 25);
//!
//! let ticks = MockTicks::from_values([0, 3]);
//! assert_eq!(ticks.user_ticks(), 0);
//! assert_eq!(ticks.user_ticks(), 3);
//! assert_eq!(ticks.user_ticks(), 3);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::{HardwareCounter, TickSource};
use crate::types::{CycleCount, Ticks};

/// A counter that replays scripted readings.
///
/// Once the script is exhausted each read advances by `step` cycles.
#[derive(Debug)]
pub struct MockCounter {
    values: RefCell<VecDeque<CycleCount>>,
    last: Cell<CycleCount>,
    step: CycleCount,
    reads: Cell<u64>,
}

impl MockCounter {
    /// A counter starting at 0 that advances by `step` on every read.
    pub fn new(step: CycleCount) -> Self {
        Self {
            values: RefCell::new(VecDeque::new()),
            last: Cell::new(0),
            step,
            reads: Cell::new(0),
        }
    }

    /// A counter returning `values` in order, then holding the last value.
    pub fn from_values(values: impl IntoIterator<Item = CycleCount>) -> Self {
        Self {
            values: RefCell::new(values.into_iter().collect()),
            last: Cell::new(0),
            step: 0,
            reads: Cell::new(0),
        }
    }

    /// A counter whose `n`-th read returns the sum of the first `n` steps,
    /// continuing with `then` per read afterwards.
    pub fn from_steps(steps: impl IntoIterator<Item = CycleCount>, then: CycleCount) -> Self {
        let mut now: CycleCount = 0;
        let values = steps
            .into_iter()
            .map(|step| {
                now += step;
                now
            })
            .collect();
        Self {
            values: RefCell::new(values),
            last: Cell::new(0),
            step: then,
            reads: Cell::new(0),
        }
    }

    /// Number of reads so far.
    pub fn reads(&self) -> u64 {
        self.reads.get()
    }
}

impl HardwareCounter for MockCounter {
    fn read(&self) -> CycleCount {
        self.reads.set(self.reads.get() + 1);
        let value = match self.values.borrow_mut().pop_front() {
            Some(v) => v,
            None => self.last.get().wrapping_add(self.step),
        };
        self.last.set(value);
        value
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A tick source replaying scripted values, then holding the last one.
#[derive(Debug)]
pub struct MockTicks {
    values: RefCell<VecDeque<Ticks>>,
    last: Cell<Ticks>,
}

impl MockTicks {
    /// A tick source that never advances.
    pub fn fixed(value: Ticks) -> Self {
        Self::from_values([value])
    }

    /// A tick source returning `values` in order, then the last value forever.
    pub fn from_values(values: impl IntoIterator<Item = Ticks>) -> Self {
        Self {
            values: RefCell::new(values.into_iter().collect()),
            last: Cell::new(0),
        }
    }
}

impl TickSource for MockTicks {
    fn user_ticks(&self) -> Ticks {
        if let Some(v) = self.values.borrow_mut().pop_front() {
            self.last.set(v);
        }
        self.last.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_accumulate() {
        let counter = MockCounter::from_steps([5, 10], 1);
        assert_eq!(counter.read(), 5);
        assert_eq!(counter.read(), 15);
        assert_eq!(counter.read(), 16);
        assert_eq!(counter.reads(), 3);
    }

    #[test]
    fn test_constant_step() {
        let counter = MockCounter::new(100);
        assert_eq!(counter.read(), 100);
        assert_eq!(counter.read(), 200);
    }

    #[test]
    fn test_values_hold_last() {
        let counter = MockCounter::from_values([7]);
        assert_eq!(counter.read(), 7);
        assert_eq!(counter.read(), 7);
    }
}
