// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;
const INIT_SALT: u64 = 0xa0761d6478bd642f;

fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Seed of the sampling RNG for `chain_id`, derived from the master seed.
pub fn chain_seed(master: u64, chain_id: usize) -> u64 {
    let offset = GOLDEN_GAMMA.wrapping_mul((chain_id as u64).wrapping_add(1));
    splitmix64(master.wrapping_add(offset))
}

/// Seed of the RNG that draws the starting point of `chain_id`.
pub fn init_seed(master: u64, chain_id: usize) -> u64 {
    chain_seed(master ^ INIT_SALT, chain_id)
}
