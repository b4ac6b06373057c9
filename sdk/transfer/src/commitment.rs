//! Note Commitments
//!
//! A commitment binds a note's value to a public field element while hiding
//! it behind the note's blinding factor.
//!
//! ```text
//! poseidon: C = Poseidon(DOMAIN, value, blinding)
//! mimc:     C = MiMC(value, blinding)
//! ```
//!
//! Schemes are interchangeable behind [`CommitmentScheme`]; the constraint
//! set never depends on which one is in use.

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{CryptographicSponge, poseidon::PoseidonSponge};
use ark_ff::{PrimeField, UniformRand};
use ark_std::rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;
use crate::field;
use crate::mimc;
use crate::poseidon::POSEIDON;

/// Domain separator absorbed ahead of the note fields
pub fn poseidon_domain() -> Fr {
    Fr::from_le_bytes_mod_order(b"cloak:note-commitment:v1")
}

/// A note commitment (one field element)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment(Fr);

impl Commitment {
    pub fn from_field(f: Fr) -> Self {
        Self(f)
    }

    pub fn to_field(&self) -> Fr {
        self.0
    }

    /// Canonical little-endian bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        field::to_bytes(&self.0)
    }

    /// Decode from canonical bytes; encodings `>= p` are rejected
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FieldError> {
        field::from_bytes(bytes).map(Self)
    }

    pub fn to_hex(&self) -> String {
        field::to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, FieldError> {
        field::from_hex(s).map(Self)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        field::serde_hex::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        field::serde_hex::deserialize(deserializer).map(Self)
    }
}

/// Binding and hiding commitment to a (value, blinding) pair.
///
/// Implementations must be pure: identical inputs always produce the
/// identical commitment.
pub trait CommitmentScheme: Send + Sync {
    /// Short identifier used in logs and configuration
    fn name(&self) -> &'static str;

    fn commit(&self, value: &Fr, blinding: &Fr) -> Commitment;
}

/// Poseidon sponge commitment (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseidonCommitment;

impl CommitmentScheme for PoseidonCommitment {
    fn name(&self) -> &'static str {
        "poseidon"
    }

    fn commit(&self, value: &Fr, blinding: &Fr) -> Commitment {
        let mut sponge = PoseidonSponge::<Fr>::new(&POSEIDON);
        sponge.absorb(&poseidon_domain());
        sponge.absorb(value);
        sponge.absorb(blinding);

        let result: Fr = sponge.squeeze_field_elements(1)[0];
        Commitment(result)
    }
}

/// MiMC commitment
#[derive(Debug, Clone, Copy, Default)]
pub struct MimcCommitment;

impl CommitmentScheme for MimcCommitment {
    fn name(&self) -> &'static str {
        "mimc"
    }

    fn commit(&self, value: &Fr, blinding: &Fr) -> Commitment {
        Commitment(mimc::hash_2(*value, *blinding))
    }
}

/// Configuration-selectable commitment scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    #[default]
    Poseidon,
    Mimc,
}

impl SchemeKind {
    pub const ALL: [SchemeKind; 2] = [SchemeKind::Poseidon, SchemeKind::Mimc];
}

impl CommitmentScheme for SchemeKind {
    fn name(&self) -> &'static str {
        match self {
            SchemeKind::Poseidon => PoseidonCommitment.name(),
            SchemeKind::Mimc => MimcCommitment.name(),
        }
    }

    fn commit(&self, value: &Fr, blinding: &Fr) -> Commitment {
        match self {
            SchemeKind::Poseidon => PoseidonCommitment.commit(value, blinding),
            SchemeKind::Mimc => MimcCommitment.commit(value, blinding),
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "poseidon" => Ok(SchemeKind::Poseidon),
            "mimc" => Ok(SchemeKind::Mimc),
            other => Err(format!("unknown commitment scheme: {other}")),
        }
    }
}

/// Generate a fresh blinding factor
pub fn random_blinding<R: Rng>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}
