//! Facade over the parallel runtime driving this process, if any.
//!
//! Numerical code often wants to tune its worker pool (thread count, dynamic sizing,
//! spin-wait duration) without linking a specific runtime. This module exposes those knobs
//! behind the [`ParallelRuntime`] trait; a runtime integration registers itself once via
//! [`install_runtime`] and every knob call thereafter is forwarded to it.
//!
//! Without an installed runtime the knobs degrade to inert single-threaded behavior: setters
//! are no-ops and getters report a pool of one thread, so callers never need to special-case
//! the serial configuration.

use std::fmt::Debug;
use std::sync::OnceLock;
use std::time::Duration;

/// The knobs a parallel runtime exposes to this crate.
///
/// Implementations are expected to be cheap to call; in particular
/// [`ParallelRuntime::current_thread_index`] sits on the hot path of work partitioning.
#[cfg_attr(test, mockall::automock)]
pub trait ParallelRuntime: Debug + Send + Sync {
    /// The number of worker threads the runtime will use for the next parallel region.
    fn thread_count(&self) -> usize;

    /// Sets the number of worker threads for subsequent parallel regions.
    fn set_thread_count(&self, count: usize);

    /// Whether the runtime may shrink the pool below the configured thread count.
    fn dynamic_adjustment(&self) -> bool;

    /// Enables or disables dynamic pool sizing.
    fn set_dynamic_adjustment(&self, enabled: bool);

    /// The zero-based index of the calling thread within the current parallel region.
    fn current_thread_index(&self) -> usize;

    /// How long idle workers spin-wait before sleeping.
    fn blocktime(&self) -> Duration;

    /// Sets how long idle workers spin-wait before sleeping.
    fn set_blocktime(&self, duration: Duration);
}

/// Knob dispatch state. A standalone struct so tests can exercise dispatch without touching
/// the process-wide instance.
#[derive(Debug)]
struct RuntimeKnobs {
    runtime: OnceLock<&'static dyn ParallelRuntime>,
}

static KNOBS: RuntimeKnobs = RuntimeKnobs::new();

impl RuntimeKnobs {
    const fn new() -> Self {
        Self {
            runtime: OnceLock::new(),
        }
    }

    fn install(&self, runtime: &'static dyn ParallelRuntime) -> bool {
        self.runtime.set(runtime).is_ok()
    }

    fn thread_count(&self) -> usize {
        self.runtime.get().map_or(1, |r| r.thread_count())
    }

    fn set_thread_count(&self, count: usize) {
        if let Some(runtime) = self.runtime.get() {
            runtime.set_thread_count(count);
        }
    }

    fn dynamic_adjustment(&self) -> bool {
        self.runtime
            .get()
            .is_some_and(|r| r.dynamic_adjustment())
    }

    fn set_dynamic_adjustment(&self, enabled: bool) {
        if let Some(runtime) = self.runtime.get() {
            runtime.set_dynamic_adjustment(enabled);
        }
    }

    fn current_thread_index(&self) -> usize {
        self.runtime.get().map_or(0, |r| r.current_thread_index())
    }

    fn blocktime(&self) -> Duration {
        self.runtime
            .get()
            .map_or(Duration::ZERO, |r| r.blocktime())
    }

    fn set_blocktime(&self, duration: Duration) {
        if let Some(runtime) = self.runtime.get() {
            runtime.set_blocktime(duration);
        }
    }
}

/// Registers the parallel runtime for this process.
///
/// The first installation wins and is permanent; later calls are ignored and return `false`.
pub fn install_runtime(runtime: &'static dyn ParallelRuntime) -> bool {
    KNOBS.install(runtime)
}

/// The number of worker threads for the next parallel region, or 1 without a runtime.
#[must_use]
pub fn thread_count() -> usize {
    KNOBS.thread_count()
}

/// Sets the worker thread count. A no-op without an installed runtime.
pub fn set_thread_count(count: usize) {
    KNOBS.set_thread_count(count);
}

/// Whether the runtime may shrink the pool on its own, or `false` without a runtime.
#[must_use]
pub fn dynamic_adjustment() -> bool {
    KNOBS.dynamic_adjustment()
}

/// Enables or disables dynamic pool sizing. A no-op without an installed runtime.
pub fn set_dynamic_adjustment(enabled: bool) {
    KNOBS.set_dynamic_adjustment(enabled);
}

/// The calling thread's index within the current parallel region, or 0 without a runtime.
#[must_use]
pub fn current_thread_index() -> usize {
    KNOBS.current_thread_index()
}

/// The idle worker spin-wait duration, or [`Duration::ZERO`] without a runtime.
#[must_use]
pub fn blocktime() -> Duration {
    KNOBS.blocktime()
}

/// Sets the idle worker spin-wait duration. A no-op without an installed runtime.
pub fn set_blocktime(duration: Duration) {
    KNOBS.set_blocktime(duration);
}
