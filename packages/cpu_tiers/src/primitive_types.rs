use derive_more::Display;

use crate::AffinityError;

/// Identifies a logical processor, using the same numbering the operating system's own
/// tooling uses.
///
/// Values are not guaranteed to be sequential or contiguous - offline processors leave holes
/// in the sequence.
pub type ProcessorId = u32;

/// Differentiates processors on the performance-efficiency axis.
///
/// The idea behind this classification is that slower processors tend to be more
/// energy-efficient, so we distinguish processors that should be preferred to get processing
/// done fast from processors that should be preferred to conserve energy.
///
/// This is a relative measurement - the fastest processors in a system are always considered
/// performance processors, with slower ones considered efficiency processors. On homogeneous
/// hardware every processor is a performance processor.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum EfficiencyClass {
    /// A processor that is optimized for energy efficiency at the expense of performance.
    #[display("efficiency")]
    Efficiency,

    /// A processor that is optimized for performance at the expense of energy efficiency.
    #[display("performance")]
    Performance,
}

/// A coarse process-wide policy selecting which cluster of processors is eligible to run
/// worker threads.
///
/// The raw values 0, 1 and 2 match the convention used by heterogeneous-hardware tuning knobs
/// in numerical runtimes; [`PowersaveMode::from_raw`] converts from that convention and rejects
/// anything else.
///
/// On homogeneous hardware all three modes resolve to the same all-cores mask.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum PowersaveMode {
    /// Every processor is eligible. This is the mode at process start.
    #[default]
    #[display("all-cores")]
    AllCores = 0,

    /// Only efficiency-tier processors are eligible, trading speed for energy and
    /// thermal headroom.
    #[display("efficiency-only")]
    EfficiencyOnly = 1,

    /// Only performance-tier processors are eligible.
    #[display("performance-only")]
    PerformanceOnly = 2,
}

impl PowersaveMode {
    /// Converts from the raw 0/1/2 convention.
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::InvalidPowersaveMode`] for any other value.
    pub fn from_raw(raw: u32) -> Result<Self, AffinityError> {
        match raw {
            0 => Ok(Self::AllCores),
            1 => Ok(Self::EfficiencyOnly),
            2 => Ok(Self::PerformanceOnly),
            other => Err(AffinityError::InvalidPowersaveMode(other)),
        }
    }

    /// The raw 0/1/2 value of this mode.
    #[must_use]
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}
