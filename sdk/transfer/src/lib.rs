//! Cloak Transfer SDK
//!
//! Soundness core for a single confidential value transfer: one hidden input
//! note, one hidden output note and a public fee.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Transfer Instance                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │ old_commit   │  │ new_commit   │  │   fee (public)        │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │              Transfer Constraint Set                    │    │
//! │  │  • commit(old_note) == old_commit                       │    │
//! │  │  • commit(new_note) == new_commit                       │    │
//! │  │  • old_value, new_value, fee fit the amount width       │    │
//! │  │  • fee <= old_value                                     │    │
//! │  │  • old_value == new_value + fee                         │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same constraint set is compiled to R1CS by `cloak-prover`; this crate
//! evaluates it directly and reports the first violated constraint.

pub mod commitment;
pub mod constraints;
pub mod error;
pub mod field;
pub mod mimc;
pub mod note;
pub mod poseidon;
pub mod verify;

pub use commitment::{
    Commitment, CommitmentScheme, MimcCommitment, PoseidonCommitment, SchemeKind, random_blinding,
};
pub use constraints::{Constraint, PrivateWitness, PublicInputs, TransferInstance, TransferParams};
pub use error::{AmountKind, FailureReason, FieldError, NoteSide, PolicyError};
pub use field::{AMOUNT_BITS, AmountPolicy, Fr};
pub use note::Note;
pub use verify::{verify, verify_batch, verify_instance, verify_with};
