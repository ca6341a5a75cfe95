use std::collections::VecDeque;

use foldhash::{HashMap, HashMapExt};

use crate::{Tick, TimerKey};

/// When the arrival queue holds this many more tokens than twice the number of open timers,
/// stale tokens are swept out of it.
const ARRIVALS_COMPACTION_SLACK: usize = 64;

/// A timer that has been started but not yet stopped, as seen by the collection pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct RunningTimer<K>
where
    K: TimerKey,
{
    /// Name of the timer.
    pub name: K,

    /// Tick at which the timer was started.
    pub start: Tick,
}

/// Bookkeeping of open timer instances during collection.
///
/// Each name has its own stack of open instances, so that a named stop closes the most recently
/// opened instance of that name. A separate queue records the order in which instances were
/// opened, so that an unnamed stop can find the most recently opened instance of any name.
///
/// Instances closed by a named stop are not removed from the arrival queue right away. Their
/// tokens become stale and are skipped (and discarded) when they reach the back of the queue,
/// with an occasional sweep on [`commit()`][Self::commit] to stop stale tokens from piling up
/// in the middle.
///
/// Every change is journaled until the next [`commit()`][Self::commit] or
/// [`rollback()`][Self::rollback], so a batch of changes can be undone at a cost proportional
/// to the batch rather than to the number of open instances.
#[derive(Debug)]
pub(crate) struct OpenTimers<K>
where
    K: TimerKey,
{
    /// Open instances per name. Serials ascend within each stack, oldest at the bottom.
    /// Names without open instances have no entry.
    stacks: HashMap<K, Vec<OpenInstance>>,

    /// Tokens of instances in the order they were opened, most recent at the back.
    /// May contain tokens of instances that have since been closed.
    arrivals: VecDeque<Arrival<K>>,

    /// Changes since the last commit or rollback, most recent at the back.
    journal: Vec<Change<K>>,

    open: usize,
    next_serial: u64,
}

#[derive(Clone, Copy, Debug)]
struct OpenInstance {
    serial: u64,
    start: Tick,
}

#[derive(Clone, Copy, Debug)]
struct Arrival<K> {
    name: K,
    serial: u64,
}

#[derive(Clone, Copy, Debug)]
enum Change<K> {
    Opened { name: K },
    Closed { name: K, instance: OpenInstance },
    DiscardedArrival(Arrival<K>),
}

impl<K> OpenTimers<K>
where
    K: TimerKey,
{
    pub(crate) fn new() -> Self {
        Self {
            stacks: HashMap::new(),
            arrivals: VecDeque::new(),
            journal: Vec::new(),
            open: 0,
            next_serial: 0,
        }
    }

    /// Opens a new instance of `name` that started at `start`.
    pub(crate) fn open(&mut self, name: K, start: Tick) {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);

        self.stacks
            .entry(name)
            .or_default()
            .push(OpenInstance { serial, start });
        self.arrivals.push_back(Arrival { name, serial });

        self.open = self.open.wrapping_add(1);

        self.journal.push(Change::Opened { name });
    }

    /// The name of the most recently opened instance that is still open, if any.
    pub(crate) fn latest_name(&mut self) -> Option<K> {
        self.discard_stale_tail();
        self.arrivals.back().map(|arrival| arrival.name)
    }

    /// Closes the most recently opened instance of `name`, returning its start tick.
    ///
    /// Returns `None` if no instance of `name` is open.
    pub(crate) fn close(&mut self, name: K) -> Option<Tick> {
        let stack = self.stacks.get_mut(&name)?;
        let instance = stack.pop()?;

        if stack.is_empty() {
            self.stacks.remove(&name);
        }

        self.open = self.open.wrapping_sub(1);

        self.journal.push(Change::Closed { name, instance });

        self.discard_stale_tail();

        Some(instance.start)
    }

    /// Keeps every change since the last commit or rollback.
    pub(crate) fn commit(&mut self) {
        self.journal.clear();

        if self.arrivals.len()
            > self
                .open
                .saturating_mul(2)
                .saturating_add(ARRIVALS_COMPACTION_SLACK)
        {
            let stacks = &self.stacks;
            self.arrivals
                .retain(|arrival| is_open(stacks, arrival).is_some());
        }
    }

    /// Undoes every change since the last commit or rollback, most recent first.
    pub(crate) fn rollback(&mut self) {
        while let Some(change) = self.journal.pop() {
            match change {
                Change::Opened { name } => {
                    if let Some(stack) = self.stacks.get_mut(&name) {
                        stack.pop();

                        if stack.is_empty() {
                            self.stacks.remove(&name);
                        }
                    }

                    // Everything pushed after this token has already been undone.
                    self.arrivals.pop_back();

                    self.open = self.open.wrapping_sub(1);
                    self.next_serial = self.next_serial.wrapping_sub(1);
                }
                Change::Closed { name, instance } => {
                    self.stacks.entry(name).or_default().push(instance);
                    self.open = self.open.wrapping_add(1);
                }
                Change::DiscardedArrival(arrival) => self.arrivals.push_back(arrival),
            }
        }
    }

    /// Number of open instances across all names.
    pub(crate) fn len(&self) -> usize {
        self.open
    }

    /// The open instances, in the order they were opened.
    pub(crate) fn running(&self) -> Vec<RunningTimer<K>> {
        self.arrivals
            .iter()
            .filter_map(|arrival| {
                is_open(&self.stacks, arrival).map(|start| RunningTimer {
                    name: arrival.name,
                    start,
                })
            })
            .collect()
    }

    fn discard_stale_tail(&mut self) {
        while let Some(&arrival) = self.arrivals.back() {
            if is_open(&self.stacks, &arrival).is_some() {
                break;
            }

            self.arrivals.pop_back();
            self.journal.push(Change::DiscardedArrival(arrival));
        }
    }

    #[cfg(test)]
    fn arrivals_len(&self) -> usize {
        self.arrivals.len()
    }

    #[cfg(test)]
    fn names_len(&self) -> usize {
        self.stacks.len()
    }

    #[cfg(test)]
    fn journal_len(&self) -> usize {
        self.journal.len()
    }
}

/// Returns the start tick of the instance an arrival token refers to, if it is still open.
fn is_open<K>(stacks: &HashMap<K, Vec<OpenInstance>>, arrival: &Arrival<K>) -> Option<Tick>
where
    K: TimerKey,
{
    let stack = stacks.get(&arrival.name)?;

    stack
        .binary_search_by_key(&arrival.serial, |instance| instance.serial)
        .ok()
        .and_then(|index| stack.get(index))
        .map(|instance| instance.start)
}
