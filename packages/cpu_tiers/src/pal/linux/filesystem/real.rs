use std::fmt::Debug;
use std::fs;

use crate::pal::linux::Filesystem;

/// The virtual filesystem for the real operating system that the build is targeting.
///
/// You would only use a different filesystem in PAL unit tests that need to use a mock
/// filesystem. Even then, whenever possible, unit tests should use the real filesystem for
/// maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetFilesystem;

impl Filesystem for BuildTargetFilesystem {
    fn get_possible_cpus_contents(&self) -> Option<String> {
        fs::read_to_string("/sys/devices/system/cpu/possible").ok()
    }

    fn get_cpu_online_contents(&self, cpu_index: u32) -> Option<String> {
        fs::read_to_string(format!("/sys/devices/system/cpu/cpu{cpu_index}/online")).ok()
    }

    fn get_cpu_max_frequency_contents(&self, cpu_index: u32) -> Option<String> {
        fs::read_to_string(format!(
            "/sys/devices/system/cpu/cpu{cpu_index}/cpufreq/cpuinfo_max_freq"
        ))
        .ok()
    }
}
