use crate::{Tick, TimerKey};

/// A timer lifecycle event, as recorded in an [`EventLog`][crate::EventLog].
///
/// Events are produced by [`Engine::start_timer()`][crate::Engine::start_timer] and
/// [`Engine::stop_timer()`][crate::Engine::stop_timer] and consumed by
/// [`Engine::collect()`][crate::Engine::collect].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a timer is either started or stopped, there is nothing else to record"
)]
pub enum Event<K>
where
    K: TimerKey,
{
    /// A timer named `name` was started at `tick`.
    Start {
        /// Name of the started timer.
        name: K,

        /// Tick at which the timer was started.
        tick: Tick,
    },

    /// A timer was stopped at `tick`.
    ///
    /// Without a name, the stop applies to the most recently started timer that is still open.
    Stop {
        /// Name of the stopped timer, if specified.
        name: Option<K>,

        /// Tick at which the timer was stopped.
        tick: Tick,
    },
}

impl<K> Event<K>
where
    K: TimerKey,
{
    /// The tick at which the event was recorded.
    #[must_use]
    pub fn tick(&self) -> Tick {
        match self {
            Self::Start { tick, .. } | Self::Stop { tick, .. } => *tick,
        }
    }

    /// The name carried by the event, if any.
    #[must_use]
    pub fn name(&self) -> Option<K> {
        match self {
            Self::Start { name, .. } => Some(*name),
            Self::Stop { name, .. } => *name,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let start = Event::Start {
            name: "a",
            tick: 10,
        };
        let named_stop = Event::Stop {
            name: Some("a"),
            tick: 20,
        };
        let unnamed_stop: Event<&str> = Event::Stop {
            name: None,
            tick: 30,
        };

        assert_eq!(start.tick(), 10);
        assert_eq!(named_stop.tick(), 20);
        assert_eq!(unnamed_stop.tick(), 30);

        assert_eq!(start.name(), Some("a"));
        assert_eq!(named_stop.name(), Some("a"));
        assert_eq!(unnamed_stop.name(), None);
    }
}
