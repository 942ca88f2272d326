use std::fmt::Debug;
use std::io;
#[cfg(test)]
use std::sync::Arc;

use nonempty::NonEmpty;

use crate::CpuSet;
#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform, ProcessorInfo};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Target(&'static BuildTargetPlatform),

    #[cfg(test)]
    Fallback(&'static crate::pal::fallback::BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BUILD_TARGET_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) const fn fallback() -> Self {
        Self::Fallback(&crate::pal::fallback::BUILD_TARGET_PLATFORM)
    }
}

impl Platform for PlatformFacade {
    fn processors(&self) -> NonEmpty<ProcessorInfo> {
        match self {
            Self::Target(platform) => platform.processors(),
            #[cfg(test)]
            Self::Fallback(platform) => platform.processors(),
            #[cfg(test)]
            Self::Mock(mock) => mock.processors(),
        }
    }

    fn set_thread_affinity(&self, mask: &CpuSet) -> Result<(), io::Error> {
        match self {
            Self::Target(platform) => platform.set_thread_affinity(mask),
            #[cfg(test)]
            Self::Fallback(platform) => platform.set_thread_affinity(mask),
            #[cfg(test)]
            Self::Mock(mock) => mock.set_thread_affinity(mask),
        }
    }

    fn current_thread_affinity(&self) -> Result<CpuSet, io::Error> {
        match self {
            Self::Target(platform) => platform.current_thread_affinity(),
            #[cfg(test)]
            Self::Fallback(platform) => platform.current_thread_affinity(),
            #[cfg(test)]
            Self::Mock(mock) => mock.current_thread_affinity(),
        }
    }
}

#[cfg(test)]
impl From<MockPlatform> for PlatformFacade {
    fn from(platform: MockPlatform) -> Self {
        Self::Mock(Arc::new(platform))
    }
}

impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Fallback(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
