//! Platform Abstraction Layer (PAL). This is private API - all operating system access in the
//! crate flows through here so it can be mocked in tests.

mod abstractions;
pub(crate) use abstractions::*;

mod facade;
pub(crate) use facade::*;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) use linux::*;

// The fallback module is compiled in test mode on all platforms so the facade can expose it to
// tests, and as the primary implementation on platforms without native affinity support. On
// supported platforms in test mode it must be accessed via the explicit `fallback::` path to
// avoid ambiguity with the platform-specific implementation.
#[cfg(any(test, not(any(target_os = "linux", target_os = "android"))))]
pub(crate) mod fallback;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) use fallback::*;
