use std::thread;
use std::time::{Duration, Instant};

use crate::Result;
use crate::pal::Platform;

pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

/// Reads the tick counter of the processor the build targets.
///
/// * x86_64 uses the time stamp counter, with the frequency reported by CPUID.
/// * aarch64 uses the virtual counter, with the frequency reported by `cntfrq_el0`.
/// * Anything else (including Miri) counts nanoseconds of the monotonic clock.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    #[inline]
    fn read_counter(&self) -> u64 {
        read_counter()
    }

    fn counter_frequency(&self) -> Result<u64> {
        counter_frequency()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[cfg(all(target_arch = "x86_64", not(miri)))]
#[inline]
fn read_counter() -> u64 {
    // SAFETY: Every x86_64 processor has a time stamp counter and user mode may read it.
    unsafe { std::arch::x86_64::_rdtsc() }
}

#[cfg(all(target_arch = "x86_64", not(miri)))]
fn counter_frequency() -> Result<u64> {
    use std::arch::x86_64::__cpuid;

    /// Time stamp counter and core crystal clock information.
    const LEAF_TSC: u32 = 0x15;
    /// Processor frequency information.
    const LEAF_FREQUENCY: u32 = 0x16;
    const HZ_PER_MHZ: u64 = 1_000_000;

    // SAFETY: CPUID is available on every x86_64 processor.
    let max_leaf = unsafe { __cpuid(0) }.eax;

    if max_leaf < LEAF_TSC {
        return Err(crate::Error::ClockUnavailable {
            reason: "processor does not enumerate the time stamp counter frequency",
        });
    }

    // SAFETY: CPUID is available on every x86_64 processor and we checked the leaf exists.
    let tsc = unsafe { __cpuid(LEAF_TSC) };
    let (denominator, numerator, crystal_hz) = (tsc.eax, tsc.ebx, tsc.ecx);

    if denominator == 0 || numerator == 0 {
        return Err(crate::Error::ClockUnavailable {
            reason: "processor does not enumerate the time stamp counter to crystal clock ratio",
        });
    }

    if crystal_hz != 0 {
        return u64::from(crystal_hz)
            .checked_mul(u64::from(numerator))
            .and_then(|product| product.checked_div(u64::from(denominator)))
            .ok_or(crate::Error::ClockUnavailable {
                reason: "processor reported an out of range time stamp counter frequency",
            });
    }

    // The crystal frequency is not enumerated but the base frequency might be,
    // and the time stamp counter ticks at the base frequency.
    if max_leaf >= LEAF_FREQUENCY {
        // SAFETY: CPUID is available on every x86_64 processor and we checked the leaf exists.
        let base_mhz = unsafe { __cpuid(LEAF_FREQUENCY) }.eax;

        if base_mhz != 0 {
            return Ok(u64::from(base_mhz).saturating_mul(HZ_PER_MHZ));
        }
    }

    Err(crate::Error::ClockUnavailable {
        reason: "processor does not enumerate the crystal clock or base frequency",
    })
}

#[cfg(all(target_arch = "aarch64", not(miri)))]
#[inline]
fn read_counter() -> u64 {
    let ticks: u64;

    // SAFETY: The virtual counter is readable from user mode on every supported OS.
    // The barrier keeps the read from being hoisted above earlier instructions.
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) ticks,
            options(nostack, nomem),
        );
    }

    ticks
}

#[cfg(all(target_arch = "aarch64", not(miri)))]
fn counter_frequency() -> Result<u64> {
    let frequency: u64;

    // SAFETY: The counter frequency register is readable from user mode on every supported OS.
    unsafe {
        std::arch::asm!(
            "mrs {}, cntfrq_el0",
            out(reg) frequency,
            options(nostack, nomem),
        );
    }

    if frequency == 0 {
        return Err(crate::Error::ClockUnavailable {
            reason: "counter frequency register is not programmed",
        });
    }

    Ok(frequency)
}

#[cfg(any(miri, not(any(target_arch = "x86_64", target_arch = "aarch64"))))]
#[inline]
fn read_counter() -> u64 {
    use std::sync::LazyLock;

    static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

    u64::try_from(EPOCH.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(any(miri, not(any(target_arch = "x86_64", target_arch = "aarch64"))))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "matches the signature of the hardware implementations"
)]
fn counter_frequency() -> Result<u64> {
    Ok(crate::NANOS_PER_SECOND)
}
