//! Working with heterogeneous processor topologies - enumerating logical processors,
//! classifying them into efficiency and performance tiers, and binding threads to the tier
//! that fits the workload.
//!
//! Modern CPUs increasingly pair fast cores with power-efficient ones. Numerical workloads
//! benefit from knowing which is which: latency-critical kernels want the performance
//! cluster, background work is happier (and cooler) on the efficiency cluster. This crate
//! answers those questions from a single cached snapshot of the hardware:
//!
//! ```
//! use cpu_tiers::PowersaveMode;
//!
//! println!("{} logical processors", cpu_tiers::cpu_count());
//! println!(
//!     "performance cluster: {}",
//!     cpu_tiers::get_cpu_thread_affinity_mask(PowersaveMode::PerformanceOnly)
//! );
//! ```
//!
//! The highest-level control is the powersave mode, which picks a cluster and pins the
//! calling thread to it in one call:
//!
//! ```no_run
//! use cpu_tiers::PowersaveMode;
//!
//! // Keep this thread (and, by convention, the workers it spawns) off the fast cores.
//! cpu_tiers::set_cpu_powersave(PowersaveMode::EfficiencyOnly)?;
//! # Ok::<(), cpu_tiers::AffinityError>(())
//! ```
//!
//! Lower-level access goes through [`CpuSet`] masks and the thread affinity functions, and
//! [`vector_support`]/[`fma_support`]/[`fp16_support`] report which SIMD instruction
//! families the processors implement.
//!
//! Thread affinity control requires OS support; on platforms without it the affinity
//! functions return [`AffinityError::Unsupported`] while topology inspection keeps working.

mod cpu_set;
mod errors;
mod features;
mod functions;
pub mod parallel;
mod primitive_types;
mod topology;

pub use cpu_set::*;
pub use errors::*;
pub use features::*;
pub use functions::*;
pub use primitive_types::*;
pub use topology::*;

pub(crate) mod pal;
