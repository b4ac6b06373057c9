use std::sync::LazyLock;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, find_poseidon_ark_and_mds};

/// Shared Poseidon parameters, derived once per process.
///
/// The circuit gadgets and the native hash must see identical parameters.
pub static POSEIDON: LazyLock<PoseidonConfig<Fr>> = LazyLock::new(poseidon_config);

/// Poseidon configuration for Cloak
///
/// Field: BN254 Fr (254 bits)
/// Rate: 2, Capacity: 1
/// Security: 128 bits
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits: u64 = 254;
    let rate: usize = 2;
    let capacity: usize = 1;
    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;
    // alpha = 5 is standard for Poseidon over large prime fields
    let alpha: u64 = 5;
    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}
