use thiserror::Error;

use crate::Tick;

/// Errors that can occur when recording or reconciling timers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A timer was stopped while no timer was open.
    ///
    /// Raised immediately by [`Engine::stop_timer()`][crate::Engine::stop_timer] and by
    /// [`Engine::collect()`][crate::Engine::collect] when an unnamed stop finds nothing to close.
    #[error("no open timer can be stopped")]
    Underflow,

    /// A stop event named a timer that has no open start with that name.
    #[error("stop event #{event_index} refers to timer '{name}' which has no matching open start")]
    Pairing {
        /// Name of the timer the stop event referred to.
        name: String,

        /// Position of the offending event among the pending events of the engine.
        event_index: usize,
    },

    /// A stop tick was earlier than the start tick it was paired with.
    ///
    /// This means the tick source is not monotonic, which is a violation of its contract.
    #[error("timer '{name}' stopped at tick {stop} before it started at tick {start}")]
    NegativeDuration {
        /// Name of the timer.
        name: String,

        /// Tick at which the timer was started.
        start: Tick,

        /// Tick at which the timer was stopped.
        stop: Tick,
    },

    /// An event could not be appended because the bounded event log is full.
    #[error("event log is full ({capacity} events)")]
    Capacity {
        /// The fixed capacity of the event log.
        capacity: usize,
    },

    /// The tick rate could not be obtained from the hardware.
    ///
    /// Rate calibration recovers from this by estimating the rate empirically,
    /// so this error never escapes [`TickSource::rate()`][crate::TickSource::rate].
    #[error("hardware tick rate is unavailable: {reason}")]
    ClockUnavailable {
        /// A human-readable description of why the rate is unavailable.
        reason: &'static str,
    },

    /// An attribute was read as a different type than it was stored as.
    #[error("attribute '{name}' does not hold a value of type {expected}")]
    AttributeType {
        /// Name of the attribute.
        name: String,

        /// The type the caller asked for.
        expected: &'static str,
    },
}

/// A specialized `Result` type for timer operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn pairing_message_names_timer_and_event() {
        let error = Error::Pairing {
            name: "db_query".to_string(),
            event_index: 7,
        };

        let message = error.to_string();

        assert!(message.contains("db_query"));
        assert!(message.contains("#7"));
    }

    #[test]
    fn negative_duration_message_includes_ticks() {
        let error = Error::NegativeDuration {
            name: "parse".to_string(),
            start: 500,
            stop: 400,
        };

        let message = error.to_string();

        assert!(message.contains("500"));
        assert!(message.contains("400"));
    }
}
