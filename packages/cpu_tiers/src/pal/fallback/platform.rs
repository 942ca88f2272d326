use std::io;
use std::num::NonZeroUsize;
use std::sync::OnceLock;
use std::thread;

use nonempty::NonEmpty;

use crate::pal::{Platform, ProcessorInfo};
use crate::{CpuSet, ProcessorId};

/// Singleton instance of `BuildTargetPlatform`, used by public API types to hook up to the
/// correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform::new();

/// Fallback platform implementation for operating systems without native affinity support.
///
/// Code compiles and runs on any platform with graceful degradation:
///
/// * Processor count comes from `std::thread::available_parallelism()`, closed to 1.
/// * No performance indicator is reported, so the topology classifies as homogeneous.
/// * Affinity calls fail with `io::ErrorKind::Unsupported`; callers are expected to proceed
///   unpinned.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    processors: OnceLock<NonEmpty<ProcessorInfo>>,
}

impl Platform for BuildTargetPlatform {
    fn processors(&self) -> NonEmpty<ProcessorInfo> {
        self.get_processors().clone()
    }

    fn set_thread_affinity(&self, _mask: &CpuSet) -> Result<(), io::Error> {
        Err(Self::unsupported())
    }

    fn current_thread_affinity(&self) -> Result<CpuSet, io::Error> {
        Err(Self::unsupported())
    }
}

impl BuildTargetPlatform {
    pub(crate) const fn new() -> Self {
        Self {
            processors: OnceLock::new(),
        }
    }

    fn get_processors(&self) -> &NonEmpty<ProcessorInfo> {
        self.processors.get_or_init(|| {
            let count = thread::available_parallelism().map_or(1, NonZeroUsize::get);

            Self::processors_for_count(count)
        })
    }

    fn processors_for_count(count: usize) -> NonEmpty<ProcessorInfo> {
        // Processors beyond the affinity mask capacity are not representable, so the
        // visible count is capped there.
        let count = count.clamp(1, CpuSet::CAPACITY);

        let processors = (0..count as ProcessorId)
            .map(|id| ProcessorInfo {
                id,
                max_frequency_khz: None,
            })
            .collect::<Vec<_>>();

        NonEmpty::from_vec(processors)
            .expect("processor count is at least 1, so this cannot fail")
    }

    fn unsupported() -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "thread affinity control is not available on this platform",
        )
    }
}
