use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::pal::{Platform, PlatformFacade};
use crate::{DEFAULT_CALIBRATION_SLEEP, Error, NANOS_PER_SECOND, Result, Tick, TickSource};

/// Rate of the hardware counter, shared by every [`CycleCounter`] in the process.
/// Zero until the first calibration.
static PROCESS_RATE: AtomicU64 = AtomicU64::new(0);

/// Options for calibrating the rate of a [`CycleCounter`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use tick_tock::{Calibration, CycleCounter};
///
/// let counter = CycleCounter::new();
///
/// let rate = counter.rate_with(
///     &Calibration::new()
///         .sleep(Duration::from_millis(50))
///         .force_recompute(true),
/// );
///
/// assert!(rate > 0);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Calibration {
    sleep: Duration,
    force_recompute: bool,
}

impl Calibration {
    /// Default options: a 200 ms estimation window and reuse of any cached rate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sleep: DEFAULT_CALIBRATION_SLEEP,
            force_recompute: false,
        }
    }

    /// How long to sleep between the two readings of an empirical estimate.
    ///
    /// Longer windows give smaller errors but delay the first caller of
    /// [`CycleCounter::rate_with()`] by that much.
    #[must_use]
    pub const fn sleep(self, sleep: Duration) -> Self {
        Self { sleep, ..self }
    }

    /// Whether to calibrate again even if a rate is already cached.
    #[must_use]
    pub const fn force_recompute(self, force_recompute: bool) -> Self {
        Self {
            force_recompute,
            ..self
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new()
    }
}

/// The processor's own tick counter: the time stamp counter on x86_64 and the virtual counter
/// on aarch64. Other targets fall back to nanoseconds of the monotonic clock.
///
/// Reading the counter costs a handful of cycles. The rate is not known up front:
///
/// 1. If the processor reports the counter frequency, that is used.
/// 2. Otherwise the rate is estimated by comparing the counter against the wall clock across a
///    short sleep. The estimate is approximate, typically off by a fraction of a percent, and
///    can be skewed if the wall clock is adjusted (e.g. by NTP) during the sleep.
///
/// Calibration happens on the first call to [`rate()`][TickSource::rate] or
/// [`rate_with()`][Self::rate_with] and the result is cached for the whole process.
///
/// The counter is assumed to tick at a constant rate and to be synchronized across processors,
/// which holds for all mainstream processors of the last decade.
#[derive(Clone, Debug)]
pub struct CycleCounter {
    platform: PlatformFacade,
    rate: &'static AtomicU64,
}

impl CycleCounter {
    /// Creates a counter that shares its calibrated rate with every other counter in the process.
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real(), &PROCESS_RATE)
    }

    pub(crate) fn with_platform(platform: PlatformFacade, rate: &'static AtomicU64) -> Self {
        Self { platform, rate }
    }

    /// Ticks per second, calibrating according to `calibration` if needed.
    ///
    /// Never zero. If the rate cannot be determined at all, nanosecond ticks are assumed.
    pub fn rate_with(&self, calibration: &Calibration) -> u64 {
        if !calibration.force_recompute {
            let cached = self.rate.load(Ordering::Relaxed);

            if cached != 0 {
                return cached;
            }
        }

        // Concurrent first calibrations each store a valid rate. The last one wins.
        let rate = calibrate(&self.platform, calibration.sleep);
        self.rate.store(rate, Ordering::Relaxed);

        rate
    }

    /// Estimates the rate empirically, ignoring any rate the hardware reports.
    ///
    /// Blocks the calling thread for `sleep`. The result is not cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockUnavailable`] if the counter or the wall clock did not advance
    /// during the sleep.
    pub fn estimate_rate(&self, sleep: Duration) -> Result<u64> {
        estimate_rate(&self.platform, sleep)
    }
}

impl Default for CycleCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for CycleCounter {
    #[inline]
    fn now(&self) -> Tick {
        self.platform.read_counter()
    }

    fn rate(&self) -> u64 {
        self.rate_with(&Calibration::default())
    }
}

fn calibrate(platform: &impl Platform, sleep: Duration) -> u64 {
    match platform.counter_frequency() {
        Ok(rate) => {
            tracing::debug!(rate, "using tick rate reported by hardware");
            return rate;
        }
        Err(error) => {
            tracing::warn!(%error, ?sleep, "estimating tick rate empirically");
        }
    }

    match estimate_rate(platform, sleep) {
        Ok(rate) => {
            tracing::debug!(rate, ?sleep, "estimated tick rate");
            rate
        }
        Err(error) => {
            tracing::warn!(%error, "assuming nanosecond ticks");
            NANOS_PER_SECOND
        }
    }
}

fn estimate_rate(platform: &impl Platform, sleep: Duration) -> Result<u64> {
    let wall_start = platform.now();
    let ticks_start = platform.read_counter();

    platform.sleep(sleep);

    let wall_end = platform.now();
    let ticks_end = platform.read_counter();

    let elapsed = wall_end.saturating_duration_since(wall_start);
    let ticks = ticks_end.saturating_sub(ticks_start);

    if elapsed.is_zero() || ticks == 0 {
        return Err(Error::ClockUnavailable {
            reason: "tick counter or wall clock did not advance during calibration",
        });
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "a rate is positive and far below 2^52, well within f64 precision"
    )]
    let rate = (ticks as f64 / elapsed.as_secs_f64()).round() as u64;

    Ok(rate.max(1))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Instant;

    use mockall::Sequence;
    use mockall::predicate::eq;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::MockPlatform;

    assert_impl_all!(CycleCounter: Send, Sync, Clone);

    fn isolated_cache() -> &'static AtomicU64 {
        Box::leak(Box::new(AtomicU64::new(0)))
    }

    fn expect_estimate(platform: &mut MockPlatform, ticks: u64, elapsed: Duration) {
        let wall_start = Instant::now();
        let mut seq = Sequence::new();

        platform
            .expect_now()
            .once()
            .in_sequence(&mut seq)
            .return_const(wall_start);
        platform
            .expect_read_counter()
            .once()
            .in_sequence(&mut seq)
            .return_const(1_000_u64);
        platform
            .expect_sleep()
            .with(eq(DEFAULT_CALIBRATION_SLEEP))
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        platform
            .expect_now()
            .once()
            .in_sequence(&mut seq)
            .return_const(wall_start + elapsed);
        platform
            .expect_read_counter()
            .once()
            .in_sequence(&mut seq)
            .return_const(1_000 + ticks);
    }

    #[test]
    fn hardware_rate_is_used_and_cached() {
        let mut platform = MockPlatform::new();
        platform
            .expect_counter_frequency()
            .once()
            .returning(|| Ok(2_400_000_000));

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());

        assert_eq!(counter.rate(), 2_400_000_000);
        // Second call is served from the cache, the mock would panic on a second query.
        assert_eq!(counter.rate(), 2_400_000_000);
    }

    #[test]
    fn clones_share_the_cache() {
        let mut platform = MockPlatform::new();
        platform
            .expect_counter_frequency()
            .once()
            .returning(|| Ok(1_000));

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());
        let clone = counter.clone();

        assert_eq!(counter.rate(), 1_000);
        assert_eq!(clone.rate(), 1_000);
    }

    #[test]
    fn falls_back_to_estimate() {
        let mut platform = MockPlatform::new();
        platform.expect_counter_frequency().once().returning(|| {
            Err(Error::ClockUnavailable {
                reason: "not enumerated",
            })
        });
        expect_estimate(&mut platform, 600_000_000, Duration::from_millis(200));

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());

        assert_eq!(counter.rate(), 3_000_000_000);
    }

    #[test]
    fn estimate_that_does_not_advance_assumes_nanoseconds() {
        let mut platform = MockPlatform::new();
        platform.expect_counter_frequency().once().returning(|| {
            Err(Error::ClockUnavailable {
                reason: "not enumerated",
            })
        });
        expect_estimate(&mut platform, 0, Duration::from_millis(200));

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());

        assert_eq!(counter.rate(), NANOS_PER_SECOND);
    }

    #[test]
    fn force_recompute_calibrates_again() {
        let mut platform = MockPlatform::new();
        let mut seq = Sequence::new();
        platform
            .expect_counter_frequency()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(1_000));
        platform
            .expect_counter_frequency()
            .once()
            .in_sequence(&mut seq)
            .returning(|| Ok(2_000));

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());

        assert_eq!(counter.rate(), 1_000);
        assert_eq!(
            counter.rate_with(&Calibration::new().force_recompute(true)),
            2_000
        );
        // The recomputed rate replaces the cached one.
        assert_eq!(counter.rate(), 2_000);
    }

    #[test]
    fn estimate_rate_ignores_hardware_rate() {
        let mut platform = MockPlatform::new();
        platform.expect_counter_frequency().never();
        expect_estimate(&mut platform, 100_000_000, Duration::from_millis(100));

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());

        assert_eq!(
            counter.estimate_rate(DEFAULT_CALIBRATION_SLEEP).unwrap(),
            1_000_000_000
        );
    }

    #[test]
    fn now_reads_the_counter() {
        let mut platform = MockPlatform::new();
        platform.expect_read_counter().once().return_const(42_u64);

        let counter = CycleCounter::with_platform(platform.into(), isolated_cache());

        assert_eq!(counter.now(), 42);
    }

    #[test]
    fn real_counter_calibrates() {
        let counter = CycleCounter::with_platform(PlatformFacade::real(), isolated_cache());

        let rate = counter.rate_with(&Calibration::new().sleep(Duration::from_millis(10)));

        assert!(rate > 0);
    }

    #[test]
    fn calibration_builder() {
        let calibration = Calibration::new()
            .sleep(Duration::from_millis(5))
            .force_recompute(true);

        assert_eq!(calibration.sleep, Duration::from_millis(5));
        assert!(calibration.force_recompute);
        assert_eq!(Calibration::default(), Calibration::new());
    }
}
