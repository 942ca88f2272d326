use crate::{AffinityError, CpuSet, PowersaveMode, SystemTopology};

/// The number of logical processors visible to the process.
///
/// Queried from the OS once and cached for the process lifetime. Never fails - if the OS
/// cannot be queried this is 1.
///
/// # Example
///
/// ```
/// let threads = cpu_tiers::cpu_count();
/// assert!(threads >= 1);
/// ```
#[must_use]
pub fn cpu_count() -> usize {
    SystemTopology::current().cpu_count()
}

/// The currently active process-wide powersave mode.
///
/// [`PowersaveMode::AllCores`] until [`set_cpu_powersave`] succeeds.
#[must_use]
pub fn get_cpu_powersave() -> PowersaveMode {
    SystemTopology::current().powersave()
}

/// Switches the process-wide powersave mode, pinning the calling thread to the matching
/// cluster mask.
///
/// Switching powersave is expensive and not thread-safe; see
/// [`SystemTopology::set_powersave`] for the full contract.
///
/// # Errors
///
/// See [`SystemTopology::set_powersave`].
///
/// # Example
///
/// ```no_run
/// use cpu_tiers::PowersaveMode;
///
/// cpu_tiers::set_cpu_powersave(PowersaveMode::PerformanceOnly)?;
/// # Ok::<(), cpu_tiers::AffinityError>(())
/// ```
pub fn set_cpu_powersave(mode: PowersaveMode) -> Result<(), AffinityError> {
    SystemTopology::current().set_powersave(mode)
}

/// The affinity mask matching a powersave mode. A pure lookup, no side effects.
#[must_use]
pub fn get_cpu_thread_affinity_mask(mode: PowersaveMode) -> CpuSet {
    SystemTopology::current().affinity_mask(mode)
}

/// Binds the scheduling affinity of the calling thread to `mask`.
///
/// Only the calling thread is affected; to pin a worker pool, call this from each worker.
///
/// # Errors
///
/// See [`SystemTopology::pin_current_thread`].
pub fn set_cpu_thread_affinity(mask: &CpuSet) -> Result<(), AffinityError> {
    SystemTopology::current().pin_current_thread(mask)
}

/// Reads the affinity mask currently applied to the calling thread.
///
/// # Errors
///
/// See [`SystemTopology::current_thread_affinity`].
pub fn get_cpu_thread_affinity() -> Result<CpuSet, AffinityError> {
    SystemTopology::current().current_thread_affinity()
}
