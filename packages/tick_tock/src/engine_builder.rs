use std::marker::PhantomData;

use crate::{DEFAULT_LOG_CAPACITY, Engine, EventLog, MonotonicTicks, TickSource, TimerKey};

/// Creates instances of [`Engine`].
///
/// Obtained from [`Engine::builder()`].
#[derive(Debug)]
#[must_use]
pub struct EngineBuilder<K, S>
where
    K: TimerKey,
    S: TickSource,
{
    capacity: usize,
    bounded: bool,
    tick_source: S,

    _key: PhantomData<K>,
}

impl<K> EngineBuilder<K, MonotonicTicks>
where
    K: TimerKey,
{
    pub(crate) fn new() -> Self {
        Self {
            capacity: DEFAULT_LOG_CAPACITY,
            bounded: false,
            tick_source: MonotonicTicks::new(),
            _key: PhantomData,
        }
    }
}

impl<K, S> EngineBuilder<K, S>
where
    K: TimerKey,
    S: TickSource,
{
    /// Sets the number of events the log has room for before it needs to grow.
    ///
    /// The log grows as needed. Growing allocates on the hot path, so size this to cover
    /// the events recorded between collections.
    ///
    /// Defaults to [`DEFAULT_LOG_CAPACITY`].
    pub fn capacity(self, capacity: usize) -> Self {
        Self {
            capacity,
            bounded: false,
            ..self
        }
    }

    /// Limits the log to `capacity` events, all allocated up front.
    ///
    /// Starting or stopping a timer then never allocates, and fails with
    /// [`Error::Capacity`][crate::Error::Capacity] once the log is full
    /// until the next collection.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(self, capacity: usize) -> Self {
        assert!(capacity != 0, "a bounded event log must have room for events");

        Self {
            capacity,
            bounded: true,
            ..self
        }
    }

    /// Sets the source of the ticks that timestamp timer events.
    ///
    /// Defaults to [`MonotonicTicks`].
    pub fn tick_source<S2>(self, tick_source: S2) -> EngineBuilder<K, S2>
    where
        S2: TickSource,
    {
        EngineBuilder {
            capacity: self.capacity,
            bounded: self.bounded,
            tick_source,
            _key: PhantomData,
        }
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> Engine<K, S> {
        let log = if self.bounded {
            EventLog::bounded(self.capacity)
        } else {
            EventLog::growable(self.capacity)
        };

        Engine::new(self.tick_source, log)
    }
}
