use std::io;
use std::num::NonZeroUsize;
use std::sync::OnceLock;
use std::thread;

use itertools::Itertools;
use nonempty::NonEmpty;

use crate::pal::linux::{Bindings, BindingsFacade, Filesystem, FilesystemFacade};
use crate::pal::{Platform, ProcessorInfo};
use crate::{CpuSet, ProcessorId};

/// Singleton instance of `BuildTargetPlatform`, used by public API types to hook up to the
/// correct PAL implementation.
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform =
    BuildTargetPlatform::new(BindingsFacade::real(), FilesystemFacade::real());

/// The platform that matches the crate's build target.
///
/// You would only use a different platform in unit tests that need to mock the platform.
/// Even then, whenever possible, unit tests should use the real platform for maximum realism.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform {
    bindings: BindingsFacade,
    fs: FilesystemFacade,

    /// Enumerated once per process; hot-plug events are deliberately not observed.
    processors: OnceLock<NonEmpty<ProcessorInfo>>,
}

impl Platform for BuildTargetPlatform {
    fn processors(&self) -> NonEmpty<ProcessorInfo> {
        self.get_processors().clone()
    }

    fn set_thread_affinity(&self, mask: &CpuSet) -> Result<(), io::Error> {
        self.bindings.sched_setaffinity_current(mask.as_native())
    }

    fn current_thread_affinity(&self) -> Result<CpuSet, io::Error> {
        self.bindings
            .sched_getaffinity_current()
            .map(CpuSet::from_native)
    }
}

impl BuildTargetPlatform {
    pub(super) const fn new(bindings: BindingsFacade, fs: FilesystemFacade) -> Self {
        Self {
            bindings,
            fs,
            processors: OnceLock::new(),
        }
    }

    fn get_processors(&self) -> &NonEmpty<ProcessorInfo> {
        self.processors.get_or_init(|| self.load_processors())
    }

    fn load_processors(&self) -> NonEmpty<ProcessorInfo> {
        // /sys/devices/system/cpu/possible names every processor the kernel could bring up,
        // in cpulist format. If it is missing or malformed we fall back to the parallelism
        // the standard library can see - this layer never fails loudly.
        let candidate_ids = self
            .fs
            .get_possible_cpus_contents()
            .and_then(|contents| cpulist::parse(contents.trim()).ok())
            .filter(|ids| !ids.is_empty())
            .unwrap_or_else(Self::fallback_candidate_ids);

        let processors = candidate_ids
            .into_iter()
            // Processors beyond the affinity mask capacity are not representable.
            .filter(|id| (*id as usize) < CpuSet::CAPACITY)
            // Some Linux flavors do not report the online state, so assume online by default.
            // The file is also routinely absent for cpu0, which cannot be taken offline.
            .filter(|id| {
                self.fs
                    .get_cpu_online_contents(*id)
                    .is_none_or(|contents| contents.trim() == "1")
            })
            .map(|id| ProcessorInfo {
                id,
                max_frequency_khz: self
                    .fs
                    .get_cpu_max_frequency_contents(id)
                    .and_then(|contents| contents.trim().parse::<u64>().ok()),
            })
            .sorted()
            .collect_vec();

        // If enumeration produced nothing usable, report a single processor with no
        // performance indicator rather than failing.
        NonEmpty::from_vec(processors).unwrap_or_else(|| {
            NonEmpty::new(ProcessorInfo {
                id: 0,
                max_frequency_khz: None,
            })
        })
    }

    fn fallback_candidate_ids() -> Vec<ProcessorId> {
        let count = thread::available_parallelism().map_or(1, NonZeroUsize::get);

        (0..count as ProcessorId).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;
    use crate::pal::linux::{BuildTargetBindings, MockBindings, MockFilesystem};

    /// Configures the mock filesystem to simulate a particular processor layout.
    ///
    /// The simulation is valid for one call to `load_processors()`. A `None` frequency
    /// simulates a processor without a cpufreq driver.
    fn simulate_processor_layout<const PROCESSOR_COUNT: usize>(
        fs: &mut MockFilesystem,
        processor_ids: [ProcessorId; PROCESSOR_COUNT],
        // If None, all are online.
        processor_is_online: Option<[bool; PROCESSOR_COUNT]>,
        frequencies_khz: [Option<u64>; PROCESSOR_COUNT],
    ) {
        let processor_is_online = processor_is_online.unwrap_or([true; PROCESSOR_COUNT]);

        let mut possible = cpulist::emit(processor_ids);
        // \n might or might not be present, so verify that it gets trimmed if it is.
        possible.push('\n');

        fs.expect_get_possible_cpus_contents()
            .times(1)
            .return_const(Some(possible));

        for (index, id) in processor_ids.into_iter().enumerate() {
            let is_online = processor_is_online[index];

            fs.expect_get_cpu_online_contents()
                .withf(move |cpu| *cpu == id)
                .times(1)
                .return_const(if is_online {
                    Some("1\n".to_string())
                } else {
                    Some("0".to_string())
                });

            if is_online {
                let frequency = frequencies_khz[index];

                fs.expect_get_cpu_max_frequency_contents()
                    .withf(move |cpu| *cpu == id)
                    .times(1)
                    .return_const(frequency.map(|khz| format!("{khz}\n")));
            }
        }
    }

    #[test]
    fn enumerates_processors_with_frequencies() {
        let mut fs = MockFilesystem::new();

        simulate_processor_layout(
            &mut fs,
            [0, 1, 2, 3],
            None,
            [
                Some(1_800_000),
                Some(1_800_000),
                Some(2_800_000),
                Some(2_800_000),
            ],
        );

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(MockBindings::new()),
            FilesystemFacade::from_mock(fs),
        );

        let processors = platform.processors();

        assert_eq!(processors.len(), 4);
        assert_eq!(processors[0].id, 0);
        assert_eq!(processors[0].max_frequency_khz, Some(1_800_000));
        assert_eq!(processors[3].id, 3);
        assert_eq!(processors[3].max_frequency_khz, Some(2_800_000));
    }

    #[test]
    fn enumeration_is_cached() {
        let mut fs = MockFilesystem::new();

        // The mock tolerates exactly one enumeration pass; a second pass would violate the
        // times(1) expectations.
        simulate_processor_layout(&mut fs, [0, 1], None, [Some(1_000_000), Some(1_000_000)]);

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(MockBindings::new()),
            FilesystemFacade::from_mock(fs),
        );

        let first = platform.processors();
        let second = platform.processors();

        assert_eq!(first, second);
    }

    #[test]
    fn offline_processors_are_ignored() {
        let mut fs = MockFilesystem::new();

        simulate_processor_layout(
            &mut fs,
            [0, 1, 2, 3],
            Some([true, true, false, true]),
            [Some(1_000_000); 4],
        );

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(MockBindings::new()),
            FilesystemFacade::from_mock(fs),
        );

        let processors = platform.processors();

        assert_eq!(processors.len(), 3);
        assert_eq!(
            processors.iter().map(|p| p.id).collect_vec(),
            vec![0, 1, 3]
        );
    }

    #[test]
    fn missing_online_file_means_online() {
        let mut fs = MockFilesystem::new();

        fs.expect_get_possible_cpus_contents()
            .times(1)
            .return_const(Some("0-1".to_string()));

        fs.expect_get_cpu_online_contents()
            .times(2)
            .return_const(None);

        fs.expect_get_cpu_max_frequency_contents()
            .times(2)
            .return_const(Some("2000000".to_string()));

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(MockBindings::new()),
            FilesystemFacade::from_mock(fs),
        );

        assert_eq!(platform.processors().len(), 2);
    }

    #[test]
    fn missing_frequency_is_reported_as_none() {
        let mut fs = MockFilesystem::new();

        simulate_processor_layout(&mut fs, [0, 1], None, [Some(1_500_000), None]);

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(MockBindings::new()),
            FilesystemFacade::from_mock(fs),
        );

        let processors = platform.processors();

        assert_eq!(processors[0].max_frequency_khz, Some(1_500_000));
        assert_eq!(processors[1].max_frequency_khz, None);
    }

    #[test]
    fn missing_possible_file_falls_back_to_available_parallelism() {
        let mut fs = MockFilesystem::new();

        fs.expect_get_possible_cpus_contents()
            .times(1)
            .return_const(None);
        fs.expect_get_cpu_online_contents().return_const(None);
        fs.expect_get_cpu_max_frequency_contents().return_const(None);

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(MockBindings::new()),
            FilesystemFacade::from_mock(fs),
        );

        let processors = platform.processors();

        assert!(!processors.is_empty());
        assert_eq!(processors.first().id, 0);
    }

    #[test]
    fn set_thread_affinity_passes_mask_to_os() {
        let mask: CpuSet = [0, 2].into_iter().collect();
        let expected = *mask.as_native();

        let mut bindings = MockBindings::new();
        bindings
            .expect_sched_setaffinity_current()
            .withf(move |cpu_set| {
                // SAFETY: No safety requirements.
                unsafe { libc::CPU_EQUAL(cpu_set, &expected) }
            })
            .times(1)
            .returning(|_| Ok(()));

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(bindings),
            FilesystemFacade::from_mock(MockFilesystem::new()),
        );

        platform.set_thread_affinity(&mask).unwrap();
    }

    #[test]
    fn set_thread_affinity_surfaces_os_failure() {
        let mut bindings = MockBindings::new();
        bindings
            .expect_sched_setaffinity_current()
            .times(1)
            .returning(|_| Err(io::Error::from_raw_os_error(libc::EINVAL)));

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(bindings),
            FilesystemFacade::from_mock(MockFilesystem::new()),
        );

        let mask: CpuSet = [0].into_iter().collect();
        assert!(platform.set_thread_affinity(&mask).is_err());
    }

    #[test]
    fn current_thread_affinity_wraps_os_mask() {
        let expected: CpuSet = [1, 3].into_iter().collect();
        let native = *expected.as_native();

        let mut bindings = MockBindings::new();
        bindings
            .expect_sched_getaffinity_current()
            .times(1)
            .returning(move || Ok(native));

        let platform = BuildTargetPlatform::new(
            BindingsFacade::from_mock(bindings),
            FilesystemFacade::from_mock(MockFilesystem::new()),
        );

        assert_eq!(platform.current_thread_affinity().unwrap(), expected);
    }

    #[test]
    fn real_bindings_round_trip_current_thread_affinity() {
        // Exercise the real OS bindings: read the current mask and apply it back unchanged.
        let bindings = BuildTargetBindings;

        let current = bindings.sched_getaffinity_current().unwrap();
        bindings.sched_setaffinity_current(&current).unwrap();

        assert!(!CpuSet::from_native(current).is_empty());

        // cpu_set_t must stay in sync with the CpuSet capacity.
        assert_eq!(mem::size_of_val(&current) * 8, CpuSet::CAPACITY);
    }
}
