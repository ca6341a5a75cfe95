use std::cell::{Cell, Ref, RefCell, RefMut};
use std::mem;
use std::time::Duration;

use crate::{
    Attributes, EngineBuilder, Error, Event, EventLog, MonotonicTicks, OpenTimers, Result,
    RunningTimer, SampleStore, Tick, TickDelta, TickSource, Timer, TimerKey,
};

/// Records timer starts and stops, then pairs them into per-name durations on demand.
///
/// Starting and stopping a timer reads the tick source and appends an event to a log. Nothing
/// else happens until [`collect()`][Self::collect], which walks the pending events in order,
/// pairs each stop with an open start and records the tick delta in the [`SampleStore`].
///
/// Timers with the same name may nest. A stop closes the most recently started open instance
/// of its name. A stop without a name closes the most recently started open timer of any name.
/// Timers that are still open at collection time stay open and can be stopped later.
///
/// # Example
///
/// ```
/// use tick_tock::Engine;
///
/// let engine = Engine::builder().build();
///
/// engine.start_timer("outer").unwrap();
/// engine.start_timer("inner").unwrap();
/// engine.stop_timer("inner").unwrap();
///
/// let stats = engine.collect().unwrap();
///
/// assert_eq!(stats.samples(), 1);
/// assert_eq!(stats.open(), 1);
/// assert_eq!(engine.samples_for(&"inner").len(), 1);
/// assert!(engine.samples_for(&"outer").is_empty());
/// ```
///
/// # Thread safety
///
/// The engine can be moved between threads but not shared between them. Use one engine per
/// thread and merge the samples, or put the engine behind a lock (as
/// [`global`][crate::global] does).
///
/// # Panics
///
/// Every method borrows the engine state internally. Holding on to a borrow returned by
/// [`samples_for()`][Self::samples_for], [`samples()`][Self::samples],
/// [`pending_events()`][Self::pending_events] or [`attributes()`][Self::attributes]
/// while calling a method that mutates the same state panics.
#[derive(Debug)]
pub struct Engine<K = &'static str, S = MonotonicTicks>
where
    K: TimerKey,
    S: TickSource,
{
    tick_source: S,

    log: RefCell<EventLog<K>>,

    /// Starts minus stops appended so far, counting both committed open timers and those
    /// still in the log.
    pending_open: Cell<usize>,

    /// Open timers as of the last successful collection.
    open_timers: RefCell<OpenTimers<K>>,

    samples: RefCell<SampleStore<K>>,
    attributes: RefCell<Attributes>,
}

impl<K> Engine<K, MonotonicTicks>
where
    K: TimerKey,
{
    /// Starts building an engine. The defaults are a growable log and [`MonotonicTicks`].
    ///
    /// # Example
    ///
    /// ```
    /// use tick_tock::{CycleCounter, Engine};
    ///
    /// let engine = Engine::builder()
    ///     .bounded(4096)
    ///     .tick_source(CycleCounter::new())
    ///     .build();
    ///
    /// engine.start_timer("work").unwrap();
    /// engine.stop_timer("work").unwrap();
    /// ```
    pub fn builder() -> EngineBuilder<K, MonotonicTicks> {
        EngineBuilder::new()
    }
}

impl<K, S> Engine<K, S>
where
    K: TimerKey,
    S: TickSource,
{
    pub(crate) fn new(tick_source: S, log: EventLog<K>) -> Self {
        Self {
            tick_source,
            log: RefCell::new(log),
            pending_open: Cell::new(0),
            open_timers: RefCell::new(OpenTimers::new()),
            samples: RefCell::new(SampleStore::new()),
            attributes: RefCell::new(Attributes::new()),
        }
    }

    /// Starts a timer named `name`, returning the position of its event in the pending log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`] if the engine has a bounded log that is full.
    /// Nothing is recorded in that case.
    #[inline]
    pub fn start_timer(&self, name: K) -> Result<usize> {
        self.append_start(name).map(|(index, _)| index)
    }

    /// Stops a timer, returning the position of its event in the pending log.
    ///
    /// Pass a name to stop the most recently started open timer with that name, or `None` to
    /// stop the most recently started open timer of any name. Which timer is stopped is only
    /// decided during [`collect()`][Self::collect].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underflow`] if every timer started so far has already been stopped.
    /// Returns [`Error::Capacity`] if the engine has a bounded log that is full.
    /// Nothing is recorded in either case.
    ///
    /// A name that has no open timer is only detected during collection.
    #[inline]
    pub fn stop_timer(&self, name: impl Into<Option<K>>) -> Result<usize> {
        self.append_stop(name.into()).map(|(index, _)| index)
    }

    #[inline]
    pub(crate) fn append_start(&self, name: K) -> Result<(usize, Tick)> {
        let tick = self.tick_source.now();
        let index = self.log.borrow_mut().append(Event::Start { name, tick })?;

        // Cannot overflow, each open timer occupies at least one event.
        self.pending_open.set(self.pending_open.get().wrapping_add(1));

        Ok((index, tick))
    }

    #[inline]
    pub(crate) fn append_stop(&self, name: Option<K>) -> Result<(usize, Tick)> {
        let open = self.pending_open.get();

        if open == 0 {
            return Err(Error::Underflow);
        }

        let tick = self.tick_source.now();
        let index = self.log.borrow_mut().append(Event::Stop { name, tick })?;

        self.pending_open.set(open.wrapping_sub(1));

        Ok((index, tick))
    }

    /// Pairs all pending starts and stops, recording the durations of completed timers.
    ///
    /// Pending events are processed in the order they were recorded. Completed durations are
    /// appended to the samples of their name in the order the timers were stopped. Timers that
    /// are still open remain open for later collections.
    ///
    /// Collecting with no pending events does nothing.
    ///
    /// # Errors
    ///
    /// Collection is all-or-nothing. If any pending event cannot be paired, nothing from the
    /// batch is committed: samples and open timers are as they were before the call, and the
    /// pending events are kept for inspection via [`pending_events()`][Self::pending_events].
    /// Call [`discard_pending()`][Self::discard_pending] to drop them.
    ///
    /// * [`Error::Underflow`] if an unnamed stop finds no open timer.
    /// * [`Error::Pairing`] if a named stop finds no open timer with that name.
    /// * [`Error::NegativeDuration`] if a timer stopped at an earlier tick than it started.
    pub fn collect(&self) -> Result<CollectStats> {
        let mut log = self.log.borrow_mut();

        if log.is_empty() {
            return Ok(CollectStats {
                events: 0,
                samples: 0,
                open: self.open_timers.borrow().len(),
            });
        }

        let mut open_timers = self.open_timers.borrow_mut();
        let mut completed = Vec::new();

        if let Err(error) = pair_events(&log, &mut open_timers, &mut completed) {
            open_timers.rollback();
            tracing::warn!(%error, pending = log.len(), "rejected pending timer events");
            return Err(error);
        }

        open_timers.commit();

        let mut samples = self.samples.borrow_mut();
        for (name, duration) in &completed {
            samples.record(*name, *duration);
        }

        let stats = CollectStats {
            events: log.len(),
            samples: completed.len(),
            open: open_timers.len(),
        };

        debug_assert_eq!(stats.open, self.pending_open.get());

        log.clear();

        tracing::debug!(
            events = stats.events,
            samples = stats.samples,
            open = stats.open,
            "collected timer events"
        );

        Ok(stats)
    }

    /// The durations recorded for `name`, in the order the timers were stopped.
    ///
    /// Empty if no timer with that name has completed.
    pub fn samples_for(&self, name: &K) -> Ref<'_, [TickDelta]> {
        Ref::map(self.samples.borrow(), |samples| samples.samples_for(name))
    }

    /// All recorded durations.
    pub fn samples(&self) -> Ref<'_, SampleStore<K>> {
        self.samples.borrow()
    }

    /// Removes and returns all recorded durations, leaving the engine with an empty store.
    ///
    /// Open timers and pending events are not affected.
    pub fn take_samples(&self) -> SampleStore<K> {
        mem::take(&mut *self.samples.borrow_mut())
    }

    /// The number of timers that have been started and not yet stopped,
    /// counting pending events that have not been collected yet.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.pending_open.get()
    }

    /// The timers that were still open after the last successful collection,
    /// in the order they were started.
    #[must_use]
    pub fn running_timers(&self) -> Vec<RunningTimer<K>> {
        self.open_timers.borrow().running()
    }

    /// The events recorded since the last successful collection.
    pub fn pending_events(&self) -> Ref<'_, EventLog<K>> {
        self.log.borrow()
    }

    /// Drops all pending events without pairing them.
    ///
    /// This is the way out after [`collect()`][Self::collect] rejected a batch. Timers that
    /// were open after the last successful collection remain open.
    pub fn discard_pending(&self) {
        let mut log = self.log.borrow_mut();
        let discarded = log.len();
        log.clear();

        let open = self.open_timers.borrow().len();
        self.pending_open.set(open);

        tracing::debug!(discarded, open, "discarded pending timer events");
    }

    /// Starts a timer that stops itself when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`] if the engine has a bounded log that is full.
    pub fn timer(&self, name: K) -> Result<Timer<'_, K, S>> {
        Timer::start(self, name)
    }

    /// The tick source that timestamps this engine's events.
    #[must_use]
    pub fn tick_source(&self) -> &S {
        &self.tick_source
    }

    /// Converts a recorded tick delta into a duration, using the rate of this engine's
    /// tick source.
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    pub fn to_duration(&self, delta: TickDelta) -> Duration {
        self.tick_source.to_duration(delta)
    }

    /// Named values that travel with this engine's samples, such as a run label.
    pub fn attributes(&self) -> RefMut<'_, Attributes> {
        self.attributes.borrow_mut()
    }
}

/// Walks `log` in order, opening and closing timers in `open_timers` and staging the durations
/// of completed timers in `completed`.
fn pair_events<K>(
    log: &EventLog<K>,
    open_timers: &mut OpenTimers<K>,
    completed: &mut Vec<(K, TickDelta)>,
) -> Result<()>
where
    K: TimerKey,
{
    for (event_index, event) in log.iter().enumerate() {
        match *event {
            Event::Start { name, tick } => open_timers.open(name, tick),
            Event::Stop { name, tick } => {
                let name = match name {
                    Some(name) => name,
                    None => open_timers.latest_name().ok_or(Error::Underflow)?,
                };

                let start = open_timers.close(name).ok_or_else(|| Error::Pairing {
                    name: name.to_string(),
                    event_index,
                })?;

                let Some(elapsed) = tick.checked_sub(start) else {
                    return Err(Error::NegativeDuration {
                        name: name.to_string(),
                        start,
                        stop: tick,
                    });
                };

                completed.push((name, TickDelta::try_from(elapsed).unwrap_or(TickDelta::MAX)));
            }
        }
    }

    Ok(())
}

/// What a successful [`Engine::collect()`] did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CollectStats {
    events: usize,
    samples: usize,
    open: usize,
}

impl CollectStats {
    /// Number of pending events that were processed.
    #[must_use]
    pub fn events(&self) -> usize {
        self.events
    }

    /// Number of timers that completed, each contributing one sample.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Number of timers left open after the collection.
    #[must_use]
    pub fn open(&self) -> usize {
        self.open
    }
}
