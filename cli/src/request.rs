//! Transfer request files.
//!
//! ```json
//! {
//!   "old_commitment": "0x…",
//!   "new_commitment": "0x…",
//!   "fee": 10,
//!   "witness": {
//!     "old_value": 100, "old_blinding": "0x…",
//!     "new_value": 90,  "new_blinding": "0x…"
//!   }
//! }
//! ```
//!
//! Amounts are plain integers or, for values outside `u64`, hex field
//! elements.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cloak_transfer::field::{self, Fr};
use cloak_transfer::{Commitment, Note, PrivateWitness, PublicInputs, TransferInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Plain(u64),
    Field(#[serde(with = "field::serde_hex")] Fr),
}

impl Amount {
    pub fn to_field(self) -> Fr {
        match self {
            Amount::Plain(v) => field::amount(v),
            Amount::Field(f) => f,
        }
    }

    fn from_field(f: &Fr) -> Self {
        match field::bounded_u64(f, u64::BITS) {
            Some(v) => Amount::Plain(v),
            None => Amount::Field(*f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessRequest {
    pub old_value: Amount,
    #[serde(with = "field::serde_hex")]
    pub old_blinding: Fr,
    pub new_value: Amount,
    #[serde(with = "field::serde_hex")]
    pub new_blinding: Fr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub old_commitment: Commitment,
    pub new_commitment: Commitment,
    pub fee: Amount,
    pub witness: WitnessRequest,
}

impl TransferRequest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse request file: {}", path.display()))
    }

    pub fn to_instance(&self) -> TransferInstance {
        let w = &self.witness;
        TransferInstance::new(
            PublicInputs {
                old_commitment: self.old_commitment,
                new_commitment: self.new_commitment,
                fee: self.fee.to_field(),
            },
            PrivateWitness {
                old_note: Note::from_field(w.old_value.to_field(), w.old_blinding),
                new_note: Note::from_field(w.new_value.to_field(), w.new_blinding),
            },
        )
    }

    pub fn from_instance(instance: &TransferInstance) -> Self {
        let old = &instance.witness.old_note;
        let new = &instance.witness.new_note;
        Self {
            old_commitment: instance.public.old_commitment,
            new_commitment: instance.public.new_commitment,
            fee: Amount::from_field(&instance.public.fee),
            witness: WitnessRequest {
                old_value: Amount::from_field(old.value()),
                old_blinding: *old.blinding(),
                new_value: Amount::from_field(new.value()),
                new_blinding: *new.blinding(),
            },
        }
    }
}
