//! We pin the current thread to the performance tier of the machine, do some work there,
//! then restore the original affinity.
//!
//! On homogeneous hardware the performance tier equals the all-cores mask, so this is
//! harmless to run anywhere. On platforms without thread affinity control the program
//! reports that and exits.

use cpu_tiers::{AffinityError, PowersaveMode};

fn main() {
    let original = match cpu_tiers::get_cpu_thread_affinity() {
        Ok(mask) => mask,
        Err(AffinityError::Unsupported) => {
            println!("thread affinity control is not supported on this platform");
            return;
        }
        Err(e) => panic!("failed to read thread affinity: {e}"),
    };

    println!("original affinity: {original}");

    let performance = cpu_tiers::get_cpu_thread_affinity_mask(PowersaveMode::PerformanceOnly);
    cpu_tiers::set_cpu_thread_affinity(&performance)
        .expect("failed to pin to the performance tier");

    println!("now pinned to:     {performance}");

    // Some token work while pinned.
    let sum: u64 = (0..10_000_000).sum();
    println!("work result:       {sum}");

    cpu_tiers::set_cpu_thread_affinity(&original).expect("failed to restore original affinity");

    println!("affinity restored");
}
