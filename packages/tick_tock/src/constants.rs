use std::time::Duration;

/// Number of events an engine log can hold before it needs to grow, unless configured otherwise.
///
/// Sized generously so that typical collection intervals never reallocate on the hot path.
pub const DEFAULT_LOG_CAPACITY: usize = 1024 * 1024;

/// How long the empirical rate calibration of a [`CycleCounter`][crate::CycleCounter] sleeps
/// between its two readings, unless configured otherwise.
///
/// Longer sleeps give more accurate estimates at the cost of slower startup.
pub const DEFAULT_CALIBRATION_SLEEP: Duration = Duration::from_millis(200);

// A poisoned lock means a panic happened mid-update and the timer state cannot be trusted.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - timer bookkeeping may \
    be half-updated and can no longer be relied upon";

pub(crate) const NANOS_PER_SECOND: u64 = 1_000_000_000;
