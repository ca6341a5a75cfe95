use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::{NANOS_PER_SECOND, Tick, TickDelta};

/// A monotonic counter that timestamps timer events.
///
/// Ticks are opaque units. Only the difference between two ticks from the same source carries
/// meaning, and [`rate()`][Self::rate] says how many ticks make up one second.
#[cfg_attr(test, mockall::automock)]
pub trait TickSource: Debug {
    /// The current value of the counter.
    ///
    /// This is on the hot path of every timer start and stop, so it must never block,
    /// allocate or fail.
    fn now(&self) -> Tick;

    /// Ticks per second. Never zero.
    fn rate(&self) -> u64;

    /// Converts a tick delta into seconds.
    fn to_seconds(&self, delta: TickDelta) -> f64 {
        ticks_to_seconds(delta, self.rate())
    }

    /// Converts a tick delta into a [`Duration`], rounding down to whole nanoseconds.
    ///
    /// Negative deltas convert to [`Duration::ZERO`]. Deltas too long to represent
    /// saturate to the longest representable duration.
    fn to_duration(&self, delta: TickDelta) -> Duration {
        let Ok(ticks) = u128::try_from(delta) else {
            return Duration::ZERO;
        };

        let nanos = ticks
            .saturating_mul(u128::from(NANOS_PER_SECOND))
            .checked_div(u128::from(self.rate()))
            .unwrap_or_default();

        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sub-tick precision is meaningless for timing data"
)]
fn ticks_to_seconds(delta: TickDelta, rate: u64) -> f64 {
    delta as f64 / rate as f64
}

/// Nanoseconds of the monotonic clock, counted from the moment the source was created.
///
/// Reading this source costs a call into the operating system clock, which is slower than
/// a [`CycleCounter`][crate::CycleCounter] but needs no calibration.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicTicks {
    epoch: Instant,
}

impl MonotonicTicks {
    /// Creates a source that reads zero right now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicTicks {
    #[inline]
    fn now(&self) -> Tick {
        // Saturates after roughly 584 years of uptime.
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    #[cfg_attr(test, mutants::skip)] // Constant.
    fn rate(&self) -> u64 {
        NANOS_PER_SECOND
    }
}

/// A tick source that only moves when told to.
///
/// Clones share the same counter, so a test can keep one clone to drive time forward while
/// an [`Engine`][crate::Engine] reads from another.
///
/// # Example
///
/// ```
/// use tick_tock::{Engine, ManualTicks};
///
/// let ticks = ManualTicks::new(1000);
/// let engine = Engine::builder().tick_source(ticks.clone()).build();
///
/// engine.start_timer("step").unwrap();
/// ticks.advance(250);
/// engine.stop_timer("step").unwrap();
/// engine.collect().unwrap();
///
/// assert_eq!(*engine.samples_for(&"step"), [250]);
/// assert_eq!(engine.to_duration(250).as_millis(), 250);
/// ```
#[derive(Clone, Debug)]
pub struct ManualTicks {
    tick: Rc<Cell<Tick>>,
    rate: u64,
}

impl ManualTicks {
    /// Creates a source reading zero, with `rate` ticks per second.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is zero.
    #[must_use]
    pub fn new(rate: u64) -> Self {
        assert!(rate != 0, "a tick source must have a non-zero rate");

        Self {
            tick: Rc::new(Cell::new(0)),
            rate,
        }
    }

    /// Sets the counter to `tick`.
    ///
    /// Nothing stops the counter from being moved backwards. Timers that observe a backwards
    /// step are rejected during collection, which makes this useful for testing that path.
    pub fn set(&self, tick: Tick) {
        self.tick.set(tick);
    }

    /// Moves the counter forward by `ticks`.
    pub fn advance(&self, ticks: u64) {
        self.tick.set(self.tick.get().saturating_add(ticks));
    }

    /// The current value of the counter.
    #[must_use]
    pub fn get(&self) -> Tick {
        self.tick.get()
    }
}

impl TickSource for ManualTicks {
    #[inline]
    fn now(&self) -> Tick {
        self.tick.get()
    }

    fn rate(&self) -> u64 {
        self.rate
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(MonotonicTicks: Send, Sync, Copy);
    assert_not_impl_any!(ManualTicks: Send, Sync);

    #[test]
    fn monotonic_ticks_advance() {
        let ticks = MonotonicTicks::new();

        let first = ticks.now();
        thread::sleep(Duration::from_millis(1));
        let second = ticks.now();

        assert!(second > first);
        assert!(second - first >= 1_000_000);
        assert_eq!(ticks.rate(), NANOS_PER_SECOND);
    }

    #[test]
    fn manual_ticks_are_shared_between_clones() {
        let ticks = ManualTicks::new(10);
        let other = ticks.clone();

        ticks.set(100);
        other.advance(5);

        assert_eq!(ticks.now(), 105);
        assert_eq!(other.get(), 105);
    }

    #[test]
    #[should_panic]
    fn manual_ticks_zero_rate_panics() {
        drop(ManualTicks::new(0));
    }

    #[test]
    fn to_duration_divides_by_rate() {
        let ticks = ManualTicks::new(3_000_000_000);

        assert_eq!(ticks.to_duration(3_000_000_000), Duration::from_secs(1));
        assert_eq!(ticks.to_duration(3), Duration::from_nanos(1));
        // Rounds down to whole nanoseconds.
        assert_eq!(ticks.to_duration(4), Duration::from_nanos(1));
        assert_eq!(ticks.to_duration(0), Duration::ZERO);
    }

    #[test]
    fn to_duration_clamps_out_of_range() {
        let ticks = ManualTicks::new(1);

        assert_eq!(ticks.to_duration(-5), Duration::ZERO);
        assert_eq!(
            ticks.to_duration(TickDelta::MAX),
            Duration::from_nanos(u64::MAX)
        );
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exactly representable")]
    fn to_seconds_divides_by_rate() {
        let ticks = ManualTicks::new(4);

        assert_eq!(ticks.to_seconds(2), 0.5);
        assert_eq!(ticks.to_seconds(-8), -2.0);
    }
}
