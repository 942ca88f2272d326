use std::fmt::Debug;
use std::io;

use nonempty::NonEmpty;

use crate::CpuSet;
use crate::pal::ProcessorInfo;

/// The operations this crate needs from the operating system.
///
/// All OS access must go through this trait, enabling it to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Returns all logical processors visible to the current process, sorted by processor ID,
    /// ascending.
    ///
    /// This never fails: a platform that cannot enumerate its processors reports a single
    /// processor 0 with no performance indicator (robustness over precision).
    ///
    /// All returned IDs are below [`CpuSet::CAPACITY`], so they can always be placed in an
    /// affinity mask.
    #[must_use]
    fn processors(&self) -> NonEmpty<ProcessorInfo>;

    /// Binds the scheduling affinity of the calling thread - never any other thread - to the
    /// processors in `mask`.
    ///
    /// Platforms without affinity control fail with [`io::ErrorKind::Unsupported`].
    fn set_thread_affinity(&self, mask: &CpuSet) -> Result<(), io::Error>;

    /// Reads the affinity mask currently applied to the calling thread.
    ///
    /// Platforms without affinity control fail with [`io::ErrorKind::Unsupported`].
    fn current_thread_affinity(&self) -> Result<CpuSet, io::Error>;
}
