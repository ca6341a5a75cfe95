use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::Result;

pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Reads the hardware tick counter. Never fails and never blocks.
    fn read_counter(&self) -> u64;

    /// The frequency of the hardware tick counter in ticks per second,
    /// as reported by the hardware itself.
    fn counter_frequency(&self) -> Result<u64>;

    // Rust has no clock abstraction, so without this we would have nothing to mock.
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}
