use std::fmt::{self, Debug};
#[cfg(test)]
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform};

#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Real(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) fn real() -> Self {
        Self::Real(&BUILD_TARGET_PLATFORM)
    }
}

impl Platform for PlatformFacade {
    #[inline]
    fn read_counter(&self) -> u64 {
        match self {
            Self::Real(p) => p.read_counter(),
            #[cfg(test)]
            Self::Mock(p) => p.read_counter(),
        }
    }

    fn counter_frequency(&self) -> crate::Result<u64> {
        match self {
            Self::Real(p) => p.counter_frequency(),
            #[cfg(test)]
            Self::Mock(p) => p.counter_frequency(),
        }
    }

    fn now(&self) -> Instant {
        match self {
            Self::Real(p) => p.now(),
            #[cfg(test)]
            Self::Mock(p) => p.now(),
        }
    }

    fn sleep(&self, duration: Duration) {
        match self {
            Self::Real(p) => p.sleep(duration),
            #[cfg(test)]
            Self::Mock(p) => p.sleep(duration),
        }
    }
}

impl From<&'static BuildTargetPlatform> for PlatformFacade {
    fn from(p: &'static BuildTargetPlatform) -> Self {
        Self::Real(p)
    }
}

#[cfg(test)]
impl From<MockPlatform> for PlatformFacade {
    fn from(p: MockPlatform) -> Self {
        Self::Mock(Arc::new(p))
    }
}

impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(p) => p.fmt(f),
            #[cfg(test)]
            Self::Mock(p) => p.fmt(f),
        }
    }
}
