//! Notes
//!
//! A Note is a hidden balance: an amount and the blinding factor that hides
//! it inside its commitment.
//!
//! ```text
//! Note = {
//!     value: Fr,     // amount; honest notes hold a u64
//!     blinding: Fr,  // single-use randomness
//! }
//! ```
//!
//! Notes are immutable value objects and carry no validation of their own;
//! whether a value is an acceptable amount is decided by the constraint set.

use ark_bn254::Fr;
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::commitment::{Commitment, CommitmentScheme, random_blinding};
use crate::field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(with = "field::serde_hex")]
    value: Fr,
    #[serde(with = "field::serde_hex")]
    blinding: Fr,
}

impl Note {
    /// Create a note holding an integer amount
    pub fn new(value: u64, blinding: Fr) -> Self {
        Self {
            value: field::amount(value),
            blinding,
        }
    }

    /// Create a note from a raw field value (no interpretation applied)
    pub fn from_field(value: Fr, blinding: Fr) -> Self {
        Self { value, blinding }
    }

    /// Create a note with a fresh random blinding
    pub fn random<R: Rng>(value: u64, rng: &mut R) -> Self {
        Self::new(value, random_blinding(rng))
    }

    pub fn value(&self) -> &Fr {
        &self.value
    }

    pub fn blinding(&self) -> &Fr {
        &self.blinding
    }

    /// Compute the commitment for this note under `scheme`
    pub fn commitment<S: CommitmentScheme + ?Sized>(&self, scheme: &S) -> Commitment {
        scheme.commit(&self.value, &self.blinding)
    }
}
