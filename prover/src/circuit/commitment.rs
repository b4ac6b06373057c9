//! In-circuit commitment gadgets.
//!
//! Each gadget must agree bit-for-bit with its native counterpart in
//! `cloak_transfer::commitment`, otherwise honest witnesses stop verifying.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar, poseidon::constraints::PoseidonSpongeVar,
};
use ark_r1cs_std::fields::{FieldVar, fp::FpVar};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use cloak_transfer::SchemeKind;
use cloak_transfer::commitment::poseidon_domain;
use cloak_transfer::mimc::{MIMC_ROUNDS, round_constant};
use cloak_transfer::poseidon::POSEIDON;

/// Commit to (value, blinding) under `scheme`
pub fn commit_var(
    scheme: SchemeKind,
    cs: ConstraintSystemRef<Fr>,
    value: &FpVar<Fr>,
    blinding: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    match scheme {
        SchemeKind::Poseidon => poseidon_commit_var(cs, value, blinding),
        SchemeKind::Mimc => mimc_hash_var(&[value.clone(), blinding.clone()]),
    }
}

/// C = Poseidon(DOMAIN, value, blinding)
pub fn poseidon_commit_var(
    cs: ConstraintSystemRef<Fr>,
    value: &FpVar<Fr>,
    blinding: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, &POSEIDON);
    let domain = FpVar::constant(poseidon_domain());
    sponge.absorb(&domain)?;
    sponge.absorb(value)?;
    sponge.absorb(blinding)?;

    let mut result = sponge.squeeze_field_elements(1)?;
    Ok(result.remove(0))
}

/// MiMC block cipher over variables: 91 rounds of (x + k + c)^7
fn mimc_encrypt_var(x: &FpVar<Fr>, k: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let mut state = x.clone();
    for i in 0..MIMC_ROUNDS {
        let t = &state + k + round_constant(i);
        let t2 = t.square()?;
        let t4 = t2.square()?;
        let t6 = &t4 * &t2;
        state = &t6 * &t;
    }
    Ok(state + k)
}

/// Miyaguchi-Preneel MiMC hash with arity domain separation
pub fn mimc_hash_var(inputs: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let domain = FpVar::constant(Fr::from(inputs.len() as u64));
    let mut state = FpVar::<Fr>::zero();
    for input in std::iter::once(&domain).chain(inputs) {
        let encrypted = mimc_encrypt_var(input, &state)?;
        state = &state + input + encrypted;
    }
    Ok(state)
}
