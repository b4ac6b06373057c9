//! Transfer Circuit
//!
//! R1CS rendition of the transfer constraint set.
//!
//! ```text
//! Public Inputs:
//!   - old_commitment
//!   - new_commitment
//!   - fee
//!
//! Private Witness:
//!   - old_value, old_blinding
//!   - new_value, new_blinding
//! ```
//!
//! The constraint layout depends on [`TransferParams`] (commitment gadget,
//! range width, zero rule), so keys produced for one set of params cannot
//! verify proofs produced under another.

use ark_bn254::Fr;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use cloak_transfer::{Note, TransferInstance, TransferParams};

use super::commitment::commit_var;
use super::gadgets::{enforce_bit_width, enforce_le, enforce_nonzero};

/// Number of public inputs: old_commitment, new_commitment, fee
pub const NUM_PUBLIC_INPUTS: usize = 3;

#[derive(Clone, Debug)]
pub struct TransferCircuit {
    // --- Public Inputs ---
    pub old_commitment: Option<Fr>,
    pub new_commitment: Option<Fr>,
    pub fee: Option<Fr>,

    // --- Private Witness ---
    pub old_value: Option<Fr>,
    pub old_blinding: Option<Fr>,
    pub new_value: Option<Fr>,
    pub new_blinding: Option<Fr>,

    // --- Circuit config ---
    pub params: TransferParams,
}

impl TransferCircuit {
    /// Unassigned circuit, usable for key generation only
    pub fn new(params: TransferParams) -> Self {
        Self {
            old_commitment: None,
            new_commitment: None,
            fee: None,
            old_value: None,
            old_blinding: None,
            new_value: None,
            new_blinding: None,
            params,
        }
    }

    pub fn from_instance(params: TransferParams, instance: &TransferInstance) -> Self {
        let old = &instance.witness.old_note;
        let new = &instance.witness.new_note;
        Self {
            old_commitment: Some(instance.public.old_commitment.to_field()),
            new_commitment: Some(instance.public.new_commitment.to_field()),
            fee: Some(instance.public.fee),
            old_value: Some(*old.value()),
            old_blinding: Some(*old.blinding()),
            new_value: Some(*new.value()),
            new_blinding: Some(*new.blinding()),
            params,
        }
    }

    /// Satisfying placeholder instance for setup.
    ///
    /// Uses the smallest value the policy accepts with zero blinding.
    pub fn dummy(params: TransferParams) -> Self {
        let value = if params.policy.allow_zero() { 0 } else { 1 };
        let instance = TransferInstance::honest(
            Note::new(value, Fr::from(0u64)),
            Note::new(value, Fr::from(0u64)),
            0,
            &params.scheme,
        );
        Self::from_instance(params, &instance)
    }
}

impl ConstraintSynthesizer<Fr> for TransferCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let bits = self.params.policy.bits();

        // === Allocate Public Inputs ===
        // Order must match PublicInputs::to_field_elements
        let old_cm_var = FpVar::new_input(cs.clone(), || {
            self.old_commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let new_cm_var = FpVar::new_input(cs.clone(), || {
            self.new_commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let fee_var =
            FpVar::new_input(cs.clone(), || self.fee.ok_or(SynthesisError::AssignmentMissing))?;

        // === Allocate Private Witness ===
        let old_value_var = FpVar::new_witness(cs.clone(), || {
            self.old_value.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let old_blinding_var = FpVar::new_witness(cs.clone(), || {
            self.old_blinding.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let new_value_var = FpVar::new_witness(cs.clone(), || {
            self.new_value.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let new_blinding_var = FpVar::new_witness(cs.clone(), || {
            self.new_blinding.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // 1. Both notes open their public commitments
        let old_cm = commit_var(
            self.params.scheme,
            cs.clone(),
            &old_value_var,
            &old_blinding_var,
        )?;
        old_cm.enforce_equal(&old_cm_var)?;

        let new_cm = commit_var(
            self.params.scheme,
            cs.clone(),
            &new_value_var,
            &new_blinding_var,
        )?;
        new_cm.enforce_equal(&new_cm_var)?;

        // 2. Range: all three amounts fit in `bits`
        enforce_bit_width(cs.clone(), &old_value_var, bits)?;
        enforce_bit_width(cs.clone(), &new_value_var, bits)?;
        enforce_bit_width(cs.clone(), &fee_var, bits)?;

        if !self.params.policy.allow_zero() {
            enforce_nonzero(cs.clone(), &old_value_var)?;
            enforce_nonzero(cs.clone(), &new_value_var)?;
        }

        // 3. fee <= old_value
        enforce_le(cs.clone(), &fee_var, &old_value_var, bits)?;

        // 4. Conservation: old = new + fee
        let outflow = &new_value_var + &fee_var;
        old_value_var.enforce_equal(&outflow)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use cloak_transfer::{AmountPolicy, SchemeKind};

    fn satisfied(params: TransferParams, instance: &TransferInstance) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        TransferCircuit::from_instance(params, instance)
            .generate_constraints(cs.clone())
            .unwrap();
        cs.is_satisfied().unwrap()
    }

    fn honest(old: u64, new: u64, fee: u64) -> TransferInstance {
        TransferInstance::honest(
            Note::new(old, Fr::from(5u64)),
            Note::new(new, Fr::from(6u64)),
            fee,
            &SchemeKind::Poseidon,
        )
    }

    #[test]
    fn test_honest_transfer_satisfies() {
        let params = TransferParams::default();
        assert!(satisfied(params, &honest(100, 90, 10)));
        assert!(satisfied(params, &honest(100, 100, 0)));
    }

    #[test]
    fn test_unbalanced_transfer_fails() {
        assert!(!satisfied(TransferParams::default(), &honest(100, 90, 11)));
    }

    #[test]
    fn test_commitment_mismatch_fails() {
        let mut inst = honest(100, 90, 10);
        inst.public.new_commitment = inst.public.old_commitment;
        assert!(!satisfied(TransferParams::default(), &inst));
    }

    #[test]
    fn test_wrapped_new_value_fails() {
        // old = new + fee holds in the field, but new is "negative"
        let old = Fr::from(10u64);
        let wrapped = old - Fr::from(20u64);
        let inst = TransferInstance::honest(
            Note::from_field(old, Fr::from(1u64)),
            Note::from_field(wrapped, Fr::from(2u64)),
            20,
            &SchemeKind::Poseidon,
        );
        assert!(!satisfied(TransferParams::default(), &inst));
    }

    #[test]
    fn test_zero_rule() {
        let strict = TransferParams::new(SchemeKind::Poseidon, AmountPolicy::strictly_positive());
        assert!(satisfied(TransferParams::default(), &honest(0, 0, 0)));
        assert!(!satisfied(strict, &honest(10, 0, 10)));
        assert!(satisfied(strict, &honest(10, 9, 1)));
    }

    #[test]
    fn test_mimc_circuit() {
        let params = TransferParams::new(SchemeKind::Mimc, AmountPolicy::DEFAULT);
        let inst = TransferInstance::honest(
            Note::new(50, Fr::from(7u64)),
            Note::new(45, Fr::from(8u64)),
            5,
            &SchemeKind::Mimc,
        );
        assert!(satisfied(params, &inst));
        // Poseidon commitments do not open under the MiMC gadget
        assert!(!satisfied(params, &honest(50, 45, 5)));
    }

    #[test]
    fn test_public_input_count() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        TransferCircuit::dummy(TransferParams::default())
            .generate_constraints(cs.clone())
            .unwrap();
        // constant one plus the public inputs
        assert_eq!(cs.num_instance_variables(), NUM_PUBLIC_INPUTS + 1);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_dummy_satisfies_strict_policy() {
        let strict = TransferParams::new(SchemeKind::Mimc, AmountPolicy::strictly_positive());
        let cs = ConstraintSystem::<Fr>::new_ref();
        TransferCircuit::dummy(strict)
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
    }
}
