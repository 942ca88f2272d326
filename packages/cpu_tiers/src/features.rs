//! One-shot probes for the optional instruction-set capabilities the numerical kernels
//! dispatch on.
//!
//! Detection runs once per process and is cached behind a single-initialization barrier, so
//! the probes are idempotent, side-effect free and safe to call concurrently.

use std::sync::OnceLock;

/// Outcome of a probe for an optional processor capability.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Support {
    /// The capability is present on the current processor.
    Supported,

    /// The capability is absent on the current processor.
    Unsupported,

    /// The probe is inconclusive because this crate does not know how to detect the
    /// capability on the current architecture.
    Unknown,
}

impl Support {
    /// Whether the capability was positively detected.
    ///
    /// [`Support::Unknown`] maps to `false`: kernels must not select a specialized code path
    /// on an inconclusive probe.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self == Self::Supported
    }

    fn from_detected(detected: bool) -> Self {
        if detected {
            Self::Supported
        } else {
            Self::Unsupported
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CpuFeatures {
    vector: Support,
    fma: Support,
    fp16: Support,
}

static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

fn features() -> &'static CpuFeatures {
    FEATURES.get_or_init(detect)
}

/// Whether the processor supports the wide vector extension the kernels are compiled for
/// (NEON/ASIMD on ARM, AVX2 on x86-64).
#[must_use]
pub fn vector_support() -> Support {
    features().vector
}

/// Whether the processor supports fused multiply-add (VFPv4 on 32-bit ARM, FMA on x86-64;
/// always present on AArch64).
#[must_use]
pub fn fma_support() -> Support {
    features().fma
}

/// Whether the processor supports half-precision arithmetic or conversion (ASIMD-HP on
/// AArch64, F16C on x86-64).
#[must_use]
pub fn fp16_support() -> Support {
    features().fp16
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect() -> CpuFeatures {
    CpuFeatures {
        vector: Support::from_detected(std::arch::is_x86_feature_detected!("avx2")),
        fma: Support::from_detected(std::arch::is_x86_feature_detected!("fma")),
        fp16: Support::from_detected(std::arch::is_x86_feature_detected!("f16c")),
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> CpuFeatures {
    CpuFeatures {
        // ASIMD and fused multiply-add are mandatory in the base AArch64 profile.
        vector: Support::Supported,
        fma: Support::Supported,
        fp16: Support::from_detected(std::arch::is_aarch64_feature_detected!("fp16")),
    }
}

#[cfg(all(target_arch = "arm", any(target_os = "linux", target_os = "android")))]
fn detect() -> CpuFeatures {
    // Bit positions in the AT_HWCAP auxiliary vector word, from the kernel's
    // arch/arm/include/uapi/asm/hwcap.h.
    const HWCAP_NEON: libc::c_ulong = 1 << 12;
    const HWCAP_VFPV4: libc::c_ulong = 1 << 16;

    // SAFETY: getauxval has no preconditions.
    let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };

    CpuFeatures {
        vector: Support::from_detected(hwcap & HWCAP_NEON != 0),
        fma: Support::from_detected(hwcap & HWCAP_VFPV4 != 0),
        // 32-bit ARM only has storage-format fp16 conversions, which is not enough for the
        // half-precision arithmetic kernels.
        fp16: Support::Unsupported,
    }
}

#[cfg(not(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "aarch64",
    all(target_arch = "arm", any(target_os = "linux", target_os = "android"))
)))]
fn detect() -> CpuFeatures {
    CpuFeatures {
        vector: Support::Unknown,
        fma: Support::Unknown,
        fp16: Support::Unknown,
    }
}
