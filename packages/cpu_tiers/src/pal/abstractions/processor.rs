use std::fmt::Display;

use crate::ProcessorId;

/// A logical processor visible to the current process, together with the static performance
/// indicator used to assign it to a tier.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ProcessorInfo {
    pub(crate) id: ProcessorId,

    /// Maximum sustainable clock frequency in kHz, if the platform reports one.
    ///
    /// `None` means the indicator is unavailable for this processor, in which case the whole
    /// topology is treated as homogeneous.
    pub(crate) max_frequency_khz: Option<u64>,
}

impl Display for ProcessorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max_frequency_khz {
            Some(khz) => write!(f, "processor {} [{khz} kHz]", self.id),
            None => write!(f, "processor {}", self.id),
        }
    }
}

impl PartialOrd for ProcessorInfo {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProcessorInfo {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
