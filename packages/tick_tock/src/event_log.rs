use std::slice;

use crate::{Error, Event, Result, TimerKey};

/// Append-only buffer of timer events awaiting collection.
///
/// A growable log reallocates when it runs out of room. A bounded log allocates its full
/// capacity up front and refuses appends once full, so appending never allocates.
#[derive(Debug)]
pub struct EventLog<K>
where
    K: TimerKey,
{
    events: Vec<Event<K>>,

    /// If set, the log never holds more than this many events.
    limit: Option<usize>,
}

impl<K> EventLog<K>
where
    K: TimerKey,
{
    /// Creates a log that starts with room for `capacity` events and grows as needed.
    #[must_use]
    pub fn growable(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            limit: None,
        }
    }

    /// Creates a log that holds at most `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity != 0, "a bounded event log must have room for events");

        Self {
            events: Vec::with_capacity(capacity),
            limit: Some(capacity),
        }
    }

    /// Appends an event, returning its position in the log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`] if the log is bounded and already full.
    /// The log is unchanged in that case.
    #[inline]
    pub fn append(&mut self, event: Event<K>) -> Result<usize> {
        let index = self.events.len();

        if let Some(capacity) = self.limit.filter(|&capacity| index >= capacity) {
            return Err(Error::Capacity { capacity });
        }

        self.events.push(event);
        Ok(index)
    }

    /// Discards all events without processing them. Allocated capacity is retained.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Iterates over the events in the order they were appended.
    pub fn iter(&self) -> slice::Iter<'_, Event<K>> {
        self.events.iter()
    }

    /// Number of events in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The maximum number of events a bounded log can hold, or `None` if the log grows.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl<'a, K> IntoIterator for &'a EventLog<K>
where
    K: TimerKey,
{
    type Item = &'a Event<K>;
    type IntoIter = slice::Iter<'a, Event<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
