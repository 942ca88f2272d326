//! We inspect the processor topology of the current machine and write a human-readable
//! summary of it to the terminal: how many logical processors exist, how they split into
//! efficiency and performance tiers, and which SIMD instruction families they implement.

use cpu_tiers::{PowersaveMode, SystemTopology};

fn main() {
    let topology = SystemTopology::current();

    println!("{} logical processors", topology.cpu_count());
    println!(
        "all cores:         {}",
        topology.affinity_mask(PowersaveMode::AllCores)
    );
    println!(
        "efficiency tier:   {}",
        topology.affinity_mask(PowersaveMode::EfficiencyOnly)
    );
    println!(
        "performance tier:  {}",
        topology.affinity_mask(PowersaveMode::PerformanceOnly)
    );

    println!("vector instructions: {:?}", cpu_tiers::vector_support());
    println!("fused multiply-add:  {:?}", cpu_tiers::fma_support());
    println!("fp16 arithmetic:     {:?}", cpu_tiers::fp16_support());
}
