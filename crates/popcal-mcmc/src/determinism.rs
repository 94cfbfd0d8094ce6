use popcal_core::derive_substream_seed;

const INIT_DOMAIN: u64 = 0xA5A5_A5A5_A5A5_A5A5;

/// Seed of the coordinator RNG for one ensemble step.
pub fn step_seed(master_seed: u64, step: usize) -> u64 {
    derive_substream_seed(master_seed, step as u64)
}

/// Seed used to draw the initial walker positions.
pub fn init_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ INIT_DOMAIN, 0)
}
