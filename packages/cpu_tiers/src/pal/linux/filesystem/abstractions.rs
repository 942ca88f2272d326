use std::fmt::Debug;

/// Linux exposes topology data as a virtual filesystem. This trait abstracts that virtual
/// filesystem to allow it to be mocked.
///
/// The scope of this trait is limited to the virtual filesystem exposed by the OS - no "real"
/// file I/O happens in this layer. All reads are synchronous and blocking because the data is
/// never on a real storage device.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Filesystem: Debug + Send + Sync + 'static {
    /// Contents of the /sys/devices/system/cpu/possible file, or `None` if it does not exist.
    ///
    /// This is a cpulist format file ("0,1,2-4" style list) naming every processor the kernel
    /// could possibly bring up.
    fn get_possible_cpus_contents(&self) -> Option<String>;

    /// Contents of the /sys/devices/system/cpu/cpu{}/online file, or `None` if it does not
    /// exist.
    ///
    /// This is a single line file with either 0 or 1 as content (+ newline). It may be absent
    /// on some Linux flavors (and typically is for cpu0), in which case the processor is
    /// assumed online.
    fn get_cpu_online_contents(&self, cpu_index: u32) -> Option<String>;

    /// Contents of the /sys/devices/system/cpu/cpu{}/cpufreq/cpuinfo_max_freq file, or `None`
    /// if it does not exist.
    ///
    /// This is a single line file with the maximum sustainable frequency of the processor in
    /// kHz. It is absent when the kernel has no cpufreq driver for the processor.
    fn get_cpu_max_frequency_contents(&self, cpu_index: u32) -> Option<String>;
}
