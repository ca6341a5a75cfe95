use std::fmt::{self, Display};

use foldhash::{HashMap, HashMapExt};

use crate::{TickDelta, TimerKey};

/// Completed timer durations, per timer name, in the order the timers completed.
///
/// Durations are tick deltas - convert them to time via the
/// [`TickSource`][crate::TickSource] that produced them.
///
/// The store only ever grows as timers complete. Use [`take()`][Self::take] or
/// [`clear()`][Self::clear] to shed data that has been consumed.
///
/// # Merging per-thread data
///
/// Engines are not shared between threads. To combine the data from one engine per thread,
/// take the samples from each and merge them:
///
/// ```
/// use std::thread;
///
/// use tick_tock::{Engine, SampleStore};
///
/// let per_thread = thread::scope(|s| {
///     let workers = (0..2)
///         .map(|_| {
///             s.spawn(|| {
///                 let engine = Engine::builder().capacity(16).build();
///                 engine.start_timer("work").unwrap();
///                 engine.stop_timer("work").unwrap();
///                 engine.collect().unwrap();
///                 engine.take_samples()
///             })
///         })
///         .collect::<Vec<_>>();
///
///     workers
///         .into_iter()
///         .map(|w| w.join().unwrap())
///         .collect::<Vec<_>>()
/// });
///
/// let mut combined = SampleStore::new();
/// for samples in per_thread {
///     combined.merge_from(samples);
/// }
///
/// assert_eq!(combined.samples_for(&"work").len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct SampleStore<K>
where
    K: TimerKey,
{
    samples: HashMap<K, Vec<TickDelta>>,
}

impl<K> SampleStore<K>
where
    K: TimerKey,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }

    /// Appends a completed duration for `name`.
    pub fn record(&mut self, name: K, duration: TickDelta) {
        self.samples.entry(name).or_default().push(duration);
    }

    /// The durations recorded for `name`, in completion order.
    ///
    /// Empty if nothing has been recorded for `name`.
    #[must_use]
    pub fn samples_for(&self, name: &K) -> &[TickDelta] {
        self.samples
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Removes and returns the durations recorded for `name`.
    pub fn take(&mut self, name: &K) -> Vec<TickDelta> {
        self.samples.remove(name).unwrap_or_default()
    }

    /// Removes all recorded durations.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Appends all durations from `other` after the durations already in this store.
    pub fn merge_from(&mut self, other: Self) {
        for (name, durations) in other.samples {
            self.samples.entry(name).or_default().extend(durations);
        }
    }

    /// Iterates over every name with its durations, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[TickDelta])> {
        self.samples
            .iter()
            .map(|(name, durations)| (*name, durations.as_slice()))
    }

    /// Number of names with at least one recorded duration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.values().filter(|d| !d.is_empty()).count()
    }

    /// Whether no durations are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.values().all(Vec::is_empty)
    }

    /// Number of durations recorded across all names.
    #[must_use]
    pub fn total_samples(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }
}

impl<K> Default for SampleStore<K>
where
    K: TimerKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Display for SampleStore<K>
where
    K: TimerKey,
{
    #[cfg_attr(test, mutants::skip)] // Cosmetic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sort by rendered name so the output is stable regardless of hashing.
        let mut lines = self
            .samples
            .iter()
            .filter(|(_, durations)| !durations.is_empty())
            .map(|(name, durations)| (name.to_string(), durations.len()))
            .collect::<Vec<_>>();
        lines.sort();

        for (name, count) in lines {
            writeln!(f, "{name}: {count} samples")?;
        }

        Ok(())
    }
}
