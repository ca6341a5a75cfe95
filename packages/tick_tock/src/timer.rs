use std::time::Duration;

use crate::{Engine, Result, Tick, TickDelta, TickSource, TimerKey};

/// A running timer that stops itself when dropped.
///
/// Created by [`Engine::timer()`] or [`Timer::start()`]. Stopping, whether explicit or on drop,
/// records a stop event with the timer's name, so the timer is paired correctly even when other
/// timers start and stop inside its scope.
///
/// # Example
///
/// ```
/// use tick_tock::{Engine, ManualTicks};
///
/// let ticks = ManualTicks::new(1_000);
/// let engine = Engine::builder().tick_source(ticks.clone()).build();
///
/// {
///     let _outer = engine.timer("outer").unwrap();
///     ticks.advance(5);
///
///     let mut inner = engine.timer("inner").unwrap();
///     ticks.advance(20);
///     assert_eq!(inner.stop().unwrap(), 20);
///     assert_eq!(inner.elapsed().unwrap().as_millis(), 20);
///
///     ticks.advance(5);
/// }
///
/// engine.collect().unwrap();
///
/// assert_eq!(*engine.samples_for(&"inner"), [20]);
/// assert_eq!(*engine.samples_for(&"outer"), [30]);
/// ```
#[derive(Debug)]
#[must_use = "the timer stops when dropped, so an unused timer measures nothing"]
pub struct Timer<'e, K, S>
where
    K: TimerKey,
    S: TickSource,
{
    engine: &'e Engine<K, S>,
    name: K,
    start: Tick,
    stop: Option<Tick>,
}

impl<'e, K, S> Timer<'e, K, S>
where
    K: TimerKey,
    S: TickSource,
{
    /// Starts a timer named `name` on `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`][crate::Error::Capacity] if the engine has a bounded log
    /// that is full.
    pub fn start(engine: &'e Engine<K, S>, name: K) -> Result<Self> {
        let (_, start) = engine.append_start(name)?;

        Ok(Self {
            engine,
            name,
            start,
            stop: None,
        })
    }

    /// Stops the timer, returning the ticks elapsed since it started.
    ///
    /// Stopping an already stopped timer returns the same result without recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`][crate::Error::Capacity] if the engine has a bounded log
    /// that is full, or [`Error::Underflow`][crate::Error::Underflow] if the timer was already
    /// closed by an unnamed stop. The timer remains running in both cases.
    pub fn stop(&mut self) -> Result<TickDelta> {
        if let Some(stop) = self.stop {
            return Ok(tick_delta(self.start, stop));
        }

        let (_, stop) = self.engine.append_stop(Some(self.name))?;
        self.stop = Some(stop);

        Ok(tick_delta(self.start, stop))
    }

    /// Time between the start and the stop of the timer, or `None` if it is still running.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed_ticks()
            .map(|delta| self.engine.tick_source().to_duration(delta))
    }

    /// Ticks between the start and the stop of the timer, or `None` if it is still running.
    #[must_use]
    pub fn elapsed_ticks(&self) -> Option<TickDelta> {
        self.stop.map(|stop| tick_delta(self.start, stop))
    }

    /// The name of the timer.
    #[must_use]
    pub fn name(&self) -> K {
        self.name
    }
}

impl<K, S> Drop for Timer<'_, K, S>
where
    K: TimerKey,
    S: TickSource,
{
    fn drop(&mut self) {
        if self.stop.is_some() {
            return;
        }

        if let Err(error) = self.stop() {
            tracing::warn!(%error, name = %self.name, "timer could not be stopped on drop");
        }
    }
}

/// Signed difference between two ticks, saturating at the limits of [`TickDelta`].
fn tick_delta(start: Tick, stop: Tick) -> TickDelta {
    let delta = i128::from(stop).wrapping_sub(i128::from(start));

    TickDelta::try_from(delta).unwrap_or(if delta < 0 {
        TickDelta::MIN
    } else {
        TickDelta::MAX
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{Error, ManualTicks};

    fn manual_engine() -> (Engine<&'static str, ManualTicks>, ManualTicks) {
        let ticks = ManualTicks::new(1_000);
        let engine = Engine::builder().tick_source(ticks.clone()).build();
        (engine, ticks)
    }

    #[test]
    fn drop_stops_timer() {
        let (engine, ticks) = manual_engine();

        {
            let _timer = engine.timer("scoped").unwrap();
            ticks.advance(42);
        }

        assert_eq!(engine.open_count(), 0);
        engine.collect().unwrap();
        assert_eq!(*engine.samples_for(&"scoped"), [42]);
    }

    #[test]
    fn drop_on_error_path_stops_timer() {
        fn fallible(engine: &Engine<&'static str, ManualTicks>) -> std::result::Result<(), ()> {
            let _timer = engine.timer("fallible").map_err(|_| ())?;
            Err(())
        }

        let (engine, _ticks) = manual_engine();

        assert!(fallible(&engine).is_err());

        engine.collect().unwrap();
        assert_eq!(engine.samples_for(&"fallible").len(), 1);
    }

    #[test]
    fn explicit_stop_is_idempotent() {
        let (engine, ticks) = manual_engine();

        let mut timer = engine.timer("a").unwrap();
        assert_eq!(timer.elapsed_ticks(), None);
        assert_eq!(timer.elapsed(), None);

        ticks.advance(500);
        assert_eq!(timer.stop().unwrap(), 500);

        ticks.advance(500);
        assert_eq!(timer.stop().unwrap(), 500);
        assert_eq!(timer.elapsed(), Some(Duration::from_millis(500)));
        drop(timer);

        // One start and one stop, nothing extra on drop.
        assert_eq!(engine.pending_events().len(), 2);
    }

    #[test]
    fn nested_handles_pair_by_name() {
        let (engine, ticks) = manual_engine();

        let outer = Timer::start(&engine, "outer").unwrap();
        ticks.advance(1);
        let inner = Timer::start(&engine, "inner").unwrap();
        ticks.advance(2);

        // Out of order on purpose. Each handle stops its own name.
        drop(outer);
        ticks.advance(4);
        drop(inner);

        engine.collect().unwrap();

        assert_eq!(*engine.samples_for(&"outer"), [3]);
        assert_eq!(*engine.samples_for(&"inner"), [6]);
    }

    #[test]
    fn start_on_full_log_fails() {
        let engine: Engine = Engine::builder().bounded(1).build();

        let _first = engine.timer("a").unwrap();

        assert!(matches!(
            engine.timer("b"),
            Err(Error::Capacity { capacity: 1 })
        ));
    }

    #[test]
    fn drop_failure_is_not_fatal() {
        let engine: Engine = Engine::builder().bounded(1).build();

        let timer = engine.timer("a").unwrap();
        assert_eq!(timer.name(), "a");

        // The log is full, so the stop cannot be recorded. Dropping must not panic.
        drop(timer);

        assert_eq!(engine.open_count(), 1);
    }

    #[test]
    fn tick_delta_saturates() {
        assert_eq!(tick_delta(10, 4), -6);
        assert_eq!(tick_delta(0, u64::MAX), TickDelta::MAX);
        assert_eq!(tick_delta(u64::MAX, 0), TickDelta::MIN);
    }
}
