//! MiMC Hash
//!
//! Alternative algebraic hash for commitments. The in-circuit gadget in
//! `cloak-prover` mirrors this construction round for round.
//!
//! - BN254 scalar field (Fr)
//! - x^7 block cipher, 91 rounds
//! - Miyaguchi-Preneel chaining: `h' = h + m + E_h(m)`
//! - Input arity absorbed first as a domain separator

use ark_bn254::Fr;
use ark_ff::Zero;

/// Number of MiMC rounds
pub const MIMC_ROUNDS: u32 = 91;

/// Round constant for round i
///
/// RC[i] = (i+1)^3 + (i+1)
pub fn round_constant(i: u32) -> Fr {
    let idx = Fr::from((i + 1) as u64);
    idx * idx * idx + idx
}

/// MiMC round function: x -> (x + k + c)^7
fn mimc_round(x: Fr, k: Fr, c: Fr) -> Fr {
    let t = x + k + c;
    let t2 = t * t;
    let t4 = t2 * t2;
    let t6 = t4 * t2;
    t6 * t
}

/// MiMC block cipher: encrypts x with key k
pub fn mimc_encrypt(x: Fr, k: Fr) -> Fr {
    let mut state = x;
    for i in 0..MIMC_ROUNDS {
        state = mimc_round(state, k, round_constant(i));
    }
    state + k
}

/// Domain-separated hash of `inputs`
pub fn hash(inputs: &[Fr]) -> Fr {
    let domain = Fr::from(inputs.len() as u64);
    std::iter::once(&domain)
        .chain(inputs)
        .fold(Fr::zero(), |state, input| {
            state + input + mimc_encrypt(*input, state)
        })
}

/// Hash two field elements
pub fn hash_2(a: Fr, b: Fr) -> Fr {
    hash(&[a, b])
}
