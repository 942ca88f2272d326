use std::fmt::Debug;
use std::io;

use libc::cpu_set_t;

/// Bindings for FFI calls into the operating system scheduler.
///
/// All PAL FFI calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    // sched_setaffinity() for the current thread
    fn sched_setaffinity_current(&self, cpuset: &cpu_set_t) -> Result<(), io::Error>;

    // sched_getaffinity() for the current thread
    fn sched_getaffinity_current(&self) -> Result<cpu_set_t, io::Error>;
}
