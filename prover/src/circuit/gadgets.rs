//! Range gadgets.
//!
//! Field elements have no sign, so "x is an amount" is enforced by
//! recomposing x from `bits` boolean witnesses. A value at or above
//! `2^bits` (including every "negative" value `p - k`) has no such
//! decomposition and leaves the system unsatisfied.

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, BigInteger, Field, One, PrimeField, Zero};
use ark_r1cs_std::{
    R1CSVar, alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::FieldVar, fields::fp::FpVar,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Enforce `value < 2^bits`, returning the little-endian bit witnesses
pub fn enforce_bit_width(
    cs: ConstraintSystemRef<Fr>,
    value: &FpVar<Fr>,
    bits: u32,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    // Unavailable during setup; the witnesses are then left unassigned
    let decomposition = value.value().ok().map(|v| v.into_bigint().to_bits_le());

    let mut bit_vars = Vec::with_capacity(bits as usize);
    for i in 0..bits as usize {
        let bit = Boolean::new_witness(cs.clone(), || {
            decomposition
                .as_ref()
                .map(|d| d[i])
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        bit_vars.push(bit);
    }

    let mut recomposed = FpVar::<Fr>::zero();
    let mut coeff = Fr::one();
    for bit in &bit_vars {
        recomposed += FpVar::from(bit.clone()) * coeff;
        coeff.double_in_place();
    }
    recomposed.enforce_equal(value)?;

    Ok(bit_vars)
}

/// Enforce `lhs <= rhs` for operands already known to fit in `bits` bits.
///
/// With both operands below `2^bits`, `rhs - lhs` is either a small
/// non-negative integer or wraps to within `2^bits` of `p`.
pub fn enforce_le(
    cs: ConstraintSystemRef<Fr>,
    lhs: &FpVar<Fr>,
    rhs: &FpVar<Fr>,
    bits: u32,
) -> Result<(), SynthesisError> {
    let diff = rhs - lhs;
    enforce_bit_width(cs, &diff, bits)?;
    Ok(())
}

/// Enforce `value != 0` by exhibiting its inverse.
///
/// A zero value gets a zero hint, which leaves the system unsatisfied
/// instead of aborting synthesis.
pub fn enforce_nonzero(
    cs: ConstraintSystemRef<Fr>,
    value: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    let inverse = FpVar::new_witness(cs, || {
        let v = value.value()?;
        Ok(v.inverse().unwrap_or(Fr::zero()))
    })?;
    value.mul_equals(&inverse, &FpVar::one())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn check_width(value: Fr, bits: u32) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let var = FpVar::new_witness(cs.clone(), || Ok(value)).unwrap();
        enforce_bit_width(cs.clone(), &var, bits).unwrap();
        cs.is_satisfied().unwrap()
    }

    fn check_le(lhs: Fr, rhs: Fr) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(lhs)).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(rhs)).unwrap();
        enforce_le(cs.clone(), &a, &b, 64).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_width_accepts_in_range() {
        assert!(check_width(Fr::from(0u64), 64));
        assert!(check_width(Fr::from(u64::MAX), 64));
        assert!(check_width(Fr::from(255u64), 8));
    }

    #[test]
    fn test_width_rejects_out_of_range() {
        assert!(!check_width(Fr::from(256u64), 8));
        assert!(!check_width(Fr::from(u64::MAX) + Fr::one(), 64));
        assert!(!check_width(-Fr::one(), 64));
    }

    #[test]
    fn test_width_constraint_count() {
        let count = |bits| {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(7u64))).unwrap();
            enforce_bit_width(cs.clone(), &var, bits).unwrap();
            cs.num_constraints()
        };
        // one booleanity constraint per bit
        assert_eq!(count(64) - count(8), 56);
    }

    #[test]
    fn test_le() {
        assert!(check_le(Fr::from(10u64), Fr::from(100u64)));
        assert!(check_le(Fr::from(100u64), Fr::from(100u64)));
        assert!(!check_le(Fr::from(101u64), Fr::from(100u64)));
        assert!(check_le(Fr::from(0u64), Fr::from(u64::MAX)));
    }

    #[test]
    fn test_nonzero() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let zero = FpVar::new_witness(cs.clone(), || Ok(Fr::from(0u64))).unwrap();
        enforce_nonzero(cs.clone(), &zero).unwrap();
        assert!(!cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let one = FpVar::new_witness(cs.clone(), || Ok(Fr::one())).unwrap();
        enforce_nonzero(cs.clone(), &one).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }
}
