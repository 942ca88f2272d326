use std::fmt;

use crate::ProcessorId;

/// A fixed-capacity set of processor IDs, used as a thread affinity mask.
///
/// This is a plain value type: copying it copies the membership bits and nothing else. It owns
/// no operating system resources.
///
/// On Linux and Android the storage is the kernel's native `cpu_set_t`, so a set can be handed
/// to the scheduler without conversion. Everywhere else an equivalent bit array is used. The
/// two backings are selected at compile time and behave identically.
///
/// # Caller contract
///
/// Processor IDs must be below [`CpuSet::CAPACITY`]. Membership operations assert this rather
/// than silently discarding out-of-range IDs; the check is a single compare against a constant.
///
/// # Example
///
/// ```
/// use cpu_tiers::CpuSet;
///
/// let mut mask = CpuSet::new();
/// mask.set(0);
/// mask.set(2);
///
/// assert!(mask.is_set(0));
/// assert!(!mask.is_set(1));
/// assert_eq!(mask.len(), 2);
/// ```
#[derive(Clone, Copy)]
pub struct CpuSet {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    bits: libc::cpu_set_t,

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    bits: [u64; Self::WORDS],
}

// TODO: Systems with more than 1024 processors need dynamically sized sets (CPU_ALLOC on
// Linux). Until then, processors beyond the capacity are not representable.
#[cfg(any(target_os = "linux", target_os = "android"))]
const _: () = assert!(size_of::<libc::cpu_set_t>() * 8 == CpuSet::CAPACITY);

impl CpuSet {
    /// Number of processor IDs a set can hold. Matches the kernel's `CPU_SETSIZE`.
    pub const CAPACITY: usize = 1024;

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const WORD_BITS: usize = u64::BITS as usize;

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const WORDS: usize = Self::CAPACITY / Self::WORD_BITS;

    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            // SAFETY: An all-zero cpu_set_t is a valid empty set.
            Self {
                bits: unsafe { std::mem::zeroed() },
            }
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            Self {
                bits: [0; Self::WORDS],
            }
        }
    }

    /// Removes every processor from the set.
    pub fn zero(&mut self) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            // SAFETY: An all-zero cpu_set_t is a valid empty set.
            self.bits = unsafe { std::mem::zeroed() };
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            self.bits = [0; Self::WORDS];
        }
    }

    /// Adds `cpu` to the set. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `cpu` is not below [`CpuSet::CAPACITY`].
    pub fn set(&mut self, cpu: ProcessorId) {
        Self::assert_in_capacity(cpu);

        #[cfg(any(target_os = "linux", target_os = "android"))]
        // SAFETY: `cpu` is below CPU_SETSIZE, as asserted above.
        unsafe {
            libc::CPU_SET(cpu as usize, &mut self.bits);
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            self.bits[cpu as usize / Self::WORD_BITS] |= 1 << (cpu as usize % Self::WORD_BITS);
        }
    }

    /// Removes `cpu` from the set. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `cpu` is not below [`CpuSet::CAPACITY`].
    pub fn clear(&mut self, cpu: ProcessorId) {
        Self::assert_in_capacity(cpu);

        #[cfg(any(target_os = "linux", target_os = "android"))]
        // SAFETY: `cpu` is below CPU_SETSIZE, as asserted above.
        unsafe {
            libc::CPU_CLR(cpu as usize, &mut self.bits);
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            self.bits[cpu as usize / Self::WORD_BITS] &= !(1 << (cpu as usize % Self::WORD_BITS));
        }
    }

    /// Whether `cpu` is a member of the set.
    ///
    /// # Panics
    ///
    /// Panics if `cpu` is not below [`CpuSet::CAPACITY`].
    #[must_use]
    pub fn is_set(&self, cpu: ProcessorId) -> bool {
        Self::assert_in_capacity(cpu);

        #[cfg(any(target_os = "linux", target_os = "android"))]
        // SAFETY: `cpu` is below CPU_SETSIZE, as asserted above.
        unsafe {
            libc::CPU_ISSET(cpu as usize, &self.bits)
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            self.bits[cpu as usize / Self::WORD_BITS] & (1 << (cpu as usize % Self::WORD_BITS))
                != 0
        }
    }

    /// Number of processors in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes()
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// Whether the set contains no processors.
    ///
    /// An empty set is not a usable affinity mask - binding a thread to it is rejected before
    /// any OS call is made.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().iter().all(|byte| *byte == 0)
    }

    /// Iterates over the member processor IDs, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ProcessorId> + '_ {
        (0..Self::CAPACITY as ProcessorId).filter(move |cpu| self.is_set(*cpu))
    }

    /// A view of the underlying storage, for handing to OS affinity calls that expect a raw
    /// buffer of a known byte size.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: Both backings are plain bit arrays with no padding and no invalid
        // representations, so viewing them as bytes is always valid.
        unsafe {
            std::slice::from_raw_parts(
                (&raw const self.bits).cast::<u8>(),
                size_of_val(&self.bits),
            )
        }
    }

    /// The native kernel representation, for passing to `sched_setaffinity`.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub(crate) fn as_native(&self) -> &libc::cpu_set_t {
        &self.bits
    }

    /// Wraps a mask returned by `sched_getaffinity`.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub(crate) fn from_native(bits: libc::cpu_set_t) -> Self {
        Self { bits }
    }

    fn assert_in_capacity(cpu: ProcessorId) {
        assert!(
            (cpu as usize) < Self::CAPACITY,
            "processor ID {cpu} is out of range for an affinity mask of capacity {}",
            Self::CAPACITY
        );
    }
}

impl Default for CpuSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CpuSet {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for CpuSet {}

impl FromIterator<ProcessorId> for CpuSet {
    fn from_iter<I: IntoIterator<Item = ProcessorId>>(iter: I) -> Self {
        let mut set = Self::new();

        for cpu in iter {
            set.set(cpu);
        }

        set
    }
}

impl fmt::Display for CpuSet {
    /// Formats the membership in cpulist format, e.g. `0-3,6`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", cpulist::emit(self.iter()))
    }
}

impl fmt::Debug for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CpuSet({self})")
    }
}
