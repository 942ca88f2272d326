use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use itertools::{Itertools, MinMaxResult};
use nonempty::NonEmpty;

use crate::pal::{Platform, PlatformFacade, ProcessorInfo};
use crate::{AffinityError, CpuSet, EfficiencyClass, PowersaveMode};

/// The process-wide topology instance backing the free functions of this crate.
static CURRENT: SystemTopology = SystemTopology::new(PlatformFacade::target());

/// Process-wide view of the logical processors, their performance tiers and the powersave
/// policy derived from them.
///
/// The topology is enumerated and classified once per process, on first use, and cached for
/// the process lifetime - hot-plugged processors are deliberately not observed. All reads are
/// safe from any thread.
///
/// # Example
///
/// ```
/// use cpu_tiers::{PowersaveMode, SystemTopology};
///
/// let topology = SystemTopology::current();
///
/// println!("{} logical processors", topology.cpu_count());
/// println!(
///     "performance cluster: {}",
///     topology.affinity_mask(PowersaveMode::PerformanceOnly)
/// );
/// ```
#[derive(Debug)]
pub struct SystemTopology {
    platform: PlatformFacade,

    /// One-shot classification result, guarded against concurrent duplicate computation.
    masks: OnceLock<ClusterMasks>,

    /// Raw value of the most recently applied [`PowersaveMode`].
    ///
    /// The atomic keeps reads well-defined from any thread, but a powersave transition as a
    /// whole is documented as caller-serialized; see [`SystemTopology::set_powersave`].
    powersave: AtomicU32,
}

/// Precomputed cluster masks, derived from one classification pass over the topology.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ClusterMasks {
    all: CpuSet,
    efficiency: CpuSet,
    performance: CpuSet,
}

impl SystemTopology {
    /// Returns the topology of the hardware this process is running on.
    ///
    /// The instance is process-wide; the free functions at the crate root delegate to it.
    #[must_use]
    pub fn current() -> &'static Self {
        &CURRENT
    }

    const fn new(platform: PlatformFacade) -> Self {
        Self {
            platform,
            masks: OnceLock::new(),
            powersave: AtomicU32::new(0),
        }
    }

    #[cfg(test)]
    fn from_platform(platform: PlatformFacade) -> Self {
        Self::new(platform)
    }

    /// The number of logical processors visible to the process.
    ///
    /// Queried from the OS once and cached. If the OS cannot be queried this is 1, never an
    /// error - robustness over precision.
    #[must_use]
    pub fn cpu_count(&self) -> usize {
        self.cluster_masks().all.len()
    }

    /// The affinity mask matching a powersave mode.
    ///
    /// This is a pure lookup with no side effects: callers can retrieve a mask here and apply
    /// it themselves via [`SystemTopology::pin_current_thread`]. On homogeneous hardware all
    /// three modes yield the all-cores mask.
    #[must_use]
    pub fn affinity_mask(&self, mode: PowersaveMode) -> CpuSet {
        let masks = self.cluster_masks();

        match mode {
            PowersaveMode::AllCores => masks.all,
            PowersaveMode::EfficiencyOnly => masks.efficiency,
            PowersaveMode::PerformanceOnly => masks.performance,
        }
    }

    /// The performance tier of a processor, or `None` for IDs outside the topology.
    ///
    /// On homogeneous hardware every processor is [`EfficiencyClass::Performance`].
    #[must_use]
    pub fn efficiency_class(&self, cpu: crate::ProcessorId) -> Option<EfficiencyClass> {
        if (cpu as usize) >= CpuSet::CAPACITY {
            return None;
        }

        let masks = self.cluster_masks();

        if masks.performance.is_set(cpu) {
            Some(EfficiencyClass::Performance)
        } else if masks.efficiency.is_set(cpu) {
            Some(EfficiencyClass::Efficiency)
        } else {
            None
        }
    }

    /// The currently active powersave mode. [`PowersaveMode::AllCores`] at process start.
    #[must_use]
    pub fn powersave(&self) -> PowersaveMode {
        PowersaveMode::from_raw(self.powersave.load(Ordering::Relaxed))
            .expect("only validated modes are ever stored")
    }

    /// Switches the process-wide powersave mode.
    ///
    /// Looks up the cluster mask for `mode`, binds the calling thread to it, and only after
    /// the mask is confirmed applied records `mode` as the new default for worker threads to
    /// pick up via [`SystemTopology::powersave`]. On failure the previous mode stays in
    /// effect.
    ///
    /// Switching powersave is expensive and not thread-safe: callers must ensure no two
    /// threads switch concurrently and that worker threads are not running numerical kernels
    /// during a transition.
    ///
    /// # Errors
    ///
    /// [`AffinityError::Unsupported`] where the platform has no affinity control,
    /// [`AffinityError::Os`] when the OS rejects the mask.
    pub fn set_powersave(&self, mode: PowersaveMode) -> Result<(), AffinityError> {
        let mask = self.affinity_mask(mode);

        self.pin_current_thread(&mask)?;
        self.powersave.store(mode.as_raw(), Ordering::Relaxed);

        Ok(())
    }

    /// Binds the scheduling affinity of the calling thread - never any other thread - to
    /// `mask`.
    ///
    /// There is no retry: a failure is surfaced immediately and the caller decides whether to
    /// proceed unpinned.
    ///
    /// # Errors
    ///
    /// [`AffinityError::EmptyMask`] if `mask` selects no processors,
    /// [`AffinityError::Unsupported`] where the platform has no affinity control,
    /// [`AffinityError::Os`] when the OS rejects the request (e.g. permission denied).
    pub fn pin_current_thread(&self, mask: &CpuSet) -> Result<(), AffinityError> {
        if mask.is_empty() {
            return Err(AffinityError::EmptyMask);
        }

        self.platform
            .set_thread_affinity(mask)
            .map_err(AffinityError::from_platform)
    }

    /// Reads the affinity mask currently applied to the calling thread.
    ///
    /// # Errors
    ///
    /// [`AffinityError::Unsupported`] where the platform has no affinity control,
    /// [`AffinityError::Os`] when the OS query fails.
    pub fn current_thread_affinity(&self) -> Result<CpuSet, AffinityError> {
        self.platform
            .current_thread_affinity()
            .map_err(AffinityError::from_platform)
    }

    fn cluster_masks(&self) -> &ClusterMasks {
        self.masks
            .get_or_init(|| classify(&self.platform.processors()))
    }
}

/// Partitions processors into tiers and derives the three cluster masks.
///
/// The splitting rule is frequency based: processors reporting the fleet maximum frequency
/// form the performance tier, everything slower forms the efficiency tier. If any processor
/// lacks a frequency reading, or all processors report the same value, the topology is
/// homogeneous and both tier masks equal the all-cores mask.
fn classify(processors: &NonEmpty<ProcessorInfo>) -> ClusterMasks {
    let all: CpuSet = processors.iter().map(|p| p.id).collect();

    let homogeneous = ClusterMasks {
        all,
        efficiency: all,
        performance: all,
    };

    let Some(frequencies) = processors
        .iter()
        .map(|p| p.max_frequency_khz)
        .collect::<Option<Vec<_>>>()
    else {
        return homogeneous;
    };

    let max = match frequencies.iter().minmax() {
        MinMaxResult::MinMax(min, max) if min != max => *max,
        // A single processor, or every processor at the same frequency.
        _ => return homogeneous,
    };

    let tier_of = |p: &ProcessorInfo| {
        if p.max_frequency_khz == Some(max) {
            EfficiencyClass::Performance
        } else {
            EfficiencyClass::Efficiency
        }
    };

    let efficiency = processors
        .iter()
        .filter(|p| tier_of(p) == EfficiencyClass::Efficiency)
        .map(|p| p.id)
        .collect();
    let performance = processors
        .iter()
        .filter(|p| tier_of(p) == EfficiencyClass::Performance)
        .map(|p| p.id)
        .collect();

    ClusterMasks {
        all,
        efficiency,
        performance,
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::pal::MockPlatform;

    fn processors(frequencies_khz: &[Option<u64>]) -> NonEmpty<ProcessorInfo> {
        NonEmpty::from_vec(
            frequencies_khz
                .iter()
                .enumerate()
                .map(|(id, max_frequency_khz)| ProcessorInfo {
                    id: id as u32,
                    max_frequency_khz: *max_frequency_khz,
                })
                .collect(),
        )
        .unwrap()
    }

    fn mask_of(ids: &[u32]) -> CpuSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn homogeneous_topology_has_equal_masks() {
        let masks = classify(&processors(&[Some(2_000_000); 4]));

        assert_eq!(masks.all, mask_of(&[0, 1, 2, 3]));
        assert_eq!(masks.efficiency, masks.all);
        assert_eq!(masks.performance, masks.all);
    }

    #[test]
    fn heterogeneous_topology_splits_at_max_frequency() {
        let masks = classify(&processors(&[
            Some(1_000_000),
            Some(1_000_000),
            Some(1_000_000),
            Some(1_000_000),
            Some(2_000_000),
            Some(2_000_000),
            Some(2_000_000),
            Some(2_000_000),
        ]));

        assert_eq!(masks.efficiency, mask_of(&[0, 1, 2, 3]));
        assert_eq!(masks.performance, mask_of(&[4, 5, 6, 7]));

        // Tiers partition the all-cores mask: their union is everything, with no overlap.
        let union: CpuSet = masks
            .efficiency
            .iter()
            .chain(masks.performance.iter())
            .collect();
        assert_eq!(union, masks.all);
        assert!(
            masks
                .efficiency
                .iter()
                .all(|cpu| !masks.performance.is_set(cpu))
        );
    }

    #[test]
    fn mid_tier_processors_classify_as_efficiency() {
        // Three-tier phone-style design: 4 little + 3 mid + 1 prime.
        let masks = classify(&processors(&[
            Some(1_800_000),
            Some(1_800_000),
            Some(1_800_000),
            Some(1_800_000),
            Some(2_500_000),
            Some(2_500_000),
            Some(2_500_000),
            Some(3_200_000),
        ]));

        assert_eq!(masks.efficiency, mask_of(&[0, 1, 2, 3, 4, 5, 6]));
        assert_eq!(masks.performance, mask_of(&[7]));
    }

    #[test]
    fn unreadable_frequency_means_homogeneous() {
        let masks = classify(&processors(&[Some(1_000_000), None, Some(2_000_000)]));

        assert_eq!(masks.efficiency, masks.all);
        assert_eq!(masks.performance, masks.all);
    }

    #[test]
    fn single_processor_is_homogeneous() {
        let masks = classify(&processors(&[Some(2_000_000)]));

        assert_eq!(masks.all, mask_of(&[0]));
        assert_eq!(masks.performance, masks.all);
    }

    #[test]
    fn classification_is_cached_and_deterministic() {
        let mut platform = MockPlatform::new();
        platform
            .expect_processors()
            .times(1)
            .returning(|| processors(&[Some(1_000_000), Some(2_000_000)]));

        let topology = SystemTopology::from_platform(platform.into());

        let first = topology.affinity_mask(PowersaveMode::EfficiencyOnly);
        let second = topology.affinity_mask(PowersaveMode::EfficiencyOnly);

        assert_eq!(first, second);
        assert_eq!(first, mask_of(&[0]));
        assert_eq!(topology.cpu_count(), 2);
    }

    #[test]
    fn efficiency_class_reflects_tiers() {
        let mut platform = MockPlatform::new();
        platform
            .expect_processors()
            .times(1)
            .returning(|| processors(&[Some(1_000_000), Some(2_000_000)]));

        let topology = SystemTopology::from_platform(platform.into());

        assert_eq!(
            topology.efficiency_class(0),
            Some(EfficiencyClass::Efficiency)
        );
        assert_eq!(
            topology.efficiency_class(1),
            Some(EfficiencyClass::Performance)
        );
        assert_eq!(topology.efficiency_class(2), None);
        assert_eq!(topology.efficiency_class(u32::MAX), None);
    }

    #[test]
    fn set_powersave_applies_mask_then_stores_mode() {
        let mut platform = MockPlatform::new();
        platform
            .expect_processors()
            .times(1)
            .returning(|| processors(&[Some(1_000_000), Some(2_000_000)]));

        let expected = mask_of(&[1]);
        platform
            .expect_set_thread_affinity()
            .withf(move |mask| *mask == expected)
            .times(1)
            .returning(|_| Ok(()));

        let topology = SystemTopology::from_platform(platform.into());

        assert_eq!(topology.powersave(), PowersaveMode::AllCores);

        topology
            .set_powersave(PowersaveMode::PerformanceOnly)
            .unwrap();

        assert_eq!(topology.powersave(), PowersaveMode::PerformanceOnly);
        assert_eq!(
            topology.affinity_mask(topology.powersave()),
            mask_of(&[1])
        );
    }

    #[test]
    fn set_powersave_keeps_previous_mode_on_failure() {
        let mut platform = MockPlatform::new();
        platform
            .expect_processors()
            .times(1)
            .returning(|| processors(&[Some(1_000_000), Some(2_000_000)]));
        platform
            .expect_set_thread_affinity()
            .times(1)
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let topology = SystemTopology::from_platform(platform.into());

        let result = topology.set_powersave(PowersaveMode::EfficiencyOnly);

        assert!(matches!(result, Err(AffinityError::Os(_))));
        assert_eq!(topology.powersave(), PowersaveMode::AllCores);
    }

    #[test]
    fn pin_current_thread_rejects_empty_mask() {
        // The platform must never be consulted for an empty mask.
        let topology = SystemTopology::from_platform(MockPlatform::new().into());

        let result = topology.pin_current_thread(&CpuSet::new());

        assert!(matches!(result, Err(AffinityError::EmptyMask)));
    }

    #[test]
    fn unsupported_platform_maps_to_unsupported_error() {
        let topology = SystemTopology::from_platform(PlatformFacade::fallback());

        let mask: CpuSet = [0].into_iter().collect();
        assert!(matches!(
            topology.pin_current_thread(&mask),
            Err(AffinityError::Unsupported)
        ));
        assert!(matches!(
            topology.current_thread_affinity(),
            Err(AffinityError::Unsupported)
        ));

        // The fallback topology still enumerates and classifies.
        assert!(topology.cpu_count() >= 1);
        assert_eq!(
            topology.affinity_mask(PowersaveMode::EfficiencyOnly),
            topology.affinity_mask(PowersaveMode::AllCores)
        );
    }
}
