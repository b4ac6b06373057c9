//! Field Arithmetic
//!
//! All values live in the BN254 scalar field. A prime field has no ordering,
//! so "amount" semantics are imposed by decomposing the canonical
//! representative into bits and rejecting anything with a bit set at or
//! above the amount width.
//!
//! ```text
//! x ∈ Fr,  x = Σ bᵢ·2ⁱ  (i < 254)
//! x is an amount  ⇔  bᵢ = 0 for all i ≥ bits
//! ```

use ark_ff::{BigInteger, PrimeField};
use ark_serialize::CanonicalDeserialize;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, PolicyError};

pub use ark_bn254::Fr;

/// Default amount width in bits
pub const AMOUNT_BITS: u32 = 64;

/// Size of a canonical field element encoding
pub const FIELD_BYTES: usize = 32;

/// Lift an integer amount into the field
pub fn amount(value: u64) -> Fr {
    Fr::from(value)
}

/// Little-endian bit decomposition of the canonical representative
pub fn to_bits_le(f: &Fr) -> Vec<bool> {
    f.into_bigint().to_bits_le()
}

/// Interpret `f` as an unsigned integer and return it if it fits in `bits` bits.
///
/// Widths above 64 bits cannot be represented and always yield `None`.
pub fn bounded_u64(f: &Fr, bits: u32) -> Option<u64> {
    if bits > u64::BITS {
        return None;
    }
    let bits = bits as usize;
    let decomposition = to_bits_le(f);
    if decomposition[bits..].iter().any(|b| *b) {
        return None;
    }
    Some(
        decomposition[..bits]
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 1) | u64::from(*b)),
    )
}

/// Canonical 32-byte little-endian encoding
pub fn to_bytes(f: &Fr) -> [u8; FIELD_BYTES] {
    let bytes = f.into_bigint().to_bytes_le();
    let mut arr = [0u8; FIELD_BYTES];
    arr[..bytes.len()].copy_from_slice(&bytes);
    arr
}

/// Decode a canonical encoding, rejecting values `>= p`
pub fn from_bytes(bytes: &[u8]) -> Result<Fr, FieldError> {
    if bytes.len() != FIELD_BYTES {
        return Err(FieldError::InvalidLength {
            expected: FIELD_BYTES,
            got: bytes.len(),
        });
    }
    Fr::deserialize_compressed(bytes).map_err(|_| FieldError::NonCanonical)
}

pub fn to_hex(f: &Fr) -> String {
    hex::encode(to_bytes(f))
}

/// Parse hex (optionally `0x`-prefixed) into a field element
pub fn from_hex(s: &str) -> Result<Fr, FieldError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| FieldError::InvalidHex(e.to_string()))?;
    from_bytes(&bytes)
}

/// Serde adapter encoding `Fr` as hex
pub mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Fr;

    pub fn serialize<S: Serializer>(f: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(f))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Which field elements count as valid amounts.
///
/// The width bounds every note value and the fee. `allow_zero` decides
/// whether a note may carry a zero value; the fee may always be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyRepr", into = "PolicyRepr")]
pub struct AmountPolicy {
    bits: u32,
    allow_zero: bool,
}

/// Wire form; decoding goes through [`AmountPolicy::new`]
#[derive(Serialize, Deserialize)]
struct PolicyRepr {
    bits: u32,
    allow_zero: bool,
}

impl TryFrom<PolicyRepr> for AmountPolicy {
    type Error = PolicyError;

    fn try_from(repr: PolicyRepr) -> Result<Self, Self::Error> {
        Self::new(repr.bits, repr.allow_zero)
    }
}

impl From<AmountPolicy> for PolicyRepr {
    fn from(policy: AmountPolicy) -> Self {
        Self {
            bits: policy.bits,
            allow_zero: policy.allow_zero,
        }
    }
}

impl AmountPolicy {
    /// 64-bit amounts, zero permitted
    pub const DEFAULT: Self = Self {
        bits: AMOUNT_BITS,
        allow_zero: true,
    };

    pub fn new(bits: u32, allow_zero: bool) -> Result<Self, PolicyError> {
        if bits == 0 || bits > 64 {
            return Err(PolicyError::InvalidWidth(bits));
        }
        Ok(Self { bits, allow_zero })
    }

    /// 64-bit amounts where note values must be strictly positive
    pub fn strictly_positive() -> Self {
        Self {
            bits: AMOUNT_BITS,
            allow_zero: false,
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn allow_zero(&self) -> bool {
        self.allow_zero
    }

    /// Largest representable amount
    pub fn max_amount(&self) -> u64 {
        u64::MAX >> (64 - self.bits)
    }

    /// Range membership of `f` as an amount
    pub fn in_range(&self, f: &Fr) -> Option<u64> {
        bounded_u64(f, self.bits)
    }

    /// Range membership of `f` as a note value (applies the zero rule)
    pub fn note_value(&self, f: &Fr) -> Option<u64> {
        self.in_range(f).filter(|v| self.allow_zero || *v != 0)
    }
}

impl Default for AmountPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
