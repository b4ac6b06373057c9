//! Transfer Constraint Set
//!
//! ```text
//! Public Inputs:
//!   - old_commitment
//!   - new_commitment
//!   - fee
//!
//! Private Witness:
//!   - old_note: (value, blinding)
//!   - new_note: (value, blinding)
//! ```
//!
//! A transfer is valid iff every [`Constraint`] holds. Range constraints are
//! evaluated before conservation: over a prime field `old == new + fee` is
//! satisfiable by wrapping `new` or `fee` past the modulus, so the equation
//! only means "no value was minted" once all three quantities are bounded.

use ark_bn254::Fr;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::commitment::{Commitment, CommitmentScheme, SchemeKind};
use crate::error::{AmountKind, FailureReason, NoteSide};
use crate::field::{self, AmountPolicy};
use crate::note::Note;

/// Public half of a transfer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    pub old_commitment: Commitment,
    pub new_commitment: Commitment,
    #[serde(with = "field::serde_hex")]
    pub fee: Fr,
}

impl PublicInputs {
    pub fn new(old_commitment: Commitment, new_commitment: Commitment, fee: u64) -> Self {
        Self {
            old_commitment,
            new_commitment,
            fee: field::amount(fee),
        }
    }

    /// Public inputs in circuit order: `[old_commitment, new_commitment, fee]`
    pub fn to_field_elements(&self) -> [Fr; 3] {
        [
            self.old_commitment.to_field(),
            self.new_commitment.to_field(),
            self.fee,
        ]
    }
}

/// Private half of a transfer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateWitness {
    pub old_note: Note,
    pub new_note: Note,
}

/// One transfer step: spend `old_note`, create `new_note`, pay `fee`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstance {
    pub public: PublicInputs,
    pub witness: PrivateWitness,
}

impl TransferInstance {
    pub fn new(public: PublicInputs, witness: PrivateWitness) -> Self {
        Self { public, witness }
    }

    /// Build an instance whose public commitments are computed from the notes
    pub fn honest<S: CommitmentScheme + ?Sized>(
        old_note: Note,
        new_note: Note,
        fee: u64,
        scheme: &S,
    ) -> Self {
        Self {
            public: PublicInputs::new(
                old_note.commitment(scheme),
                new_note.commitment(scheme),
                fee,
            ),
            witness: PrivateWitness { old_note, new_note },
        }
    }
}

/// Scheme and amount policy a verifier evaluates against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub scheme: SchemeKind,
    pub policy: AmountPolicy,
}

impl TransferParams {
    pub fn new(scheme: SchemeKind, policy: AmountPolicy) -> Self {
        Self { scheme, policy }
    }
}

/// Individual checks, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    OldCommitment,
    NewCommitment,
    OldValueRange,
    NewValueRange,
    FeeRange,
    FeeWithinInput,
    Conservation,
}

impl Constraint {
    pub const ORDER: [Constraint; 7] = [
        Constraint::OldCommitment,
        Constraint::NewCommitment,
        Constraint::OldValueRange,
        Constraint::NewValueRange,
        Constraint::FeeRange,
        Constraint::FeeWithinInput,
        Constraint::Conservation,
    ];

    /// Failure reported when this constraint does not hold
    pub fn failure(self) -> FailureReason {
        match self {
            Constraint::OldCommitment => FailureReason::CommitmentMismatch {
                which: NoteSide::Old,
            },
            Constraint::NewCommitment => FailureReason::CommitmentMismatch {
                which: NoteSide::New,
            },
            Constraint::OldValueRange => FailureReason::ValueOutOfRange {
                which: AmountKind::OldValue,
            },
            Constraint::NewValueRange => FailureReason::ValueOutOfRange {
                which: AmountKind::NewValue,
            },
            Constraint::FeeRange | Constraint::FeeWithinInput => FailureReason::ValueOutOfRange {
                which: AmountKind::Fee,
            },
            Constraint::Conservation => FailureReason::ConservationViolated,
        }
    }

    pub fn holds<S: CommitmentScheme + ?Sized>(
        self,
        scheme: &S,
        policy: &AmountPolicy,
        public: &PublicInputs,
        witness: &PrivateWitness,
    ) -> bool {
        let old = &witness.old_note;
        let new = &witness.new_note;
        match self {
            Constraint::OldCommitment => old.commitment(scheme) == public.old_commitment,
            Constraint::NewCommitment => new.commitment(scheme) == public.new_commitment,
            Constraint::OldValueRange => policy.note_value(old.value()).is_some(),
            Constraint::NewValueRange => policy.note_value(new.value()).is_some(),
            Constraint::FeeRange => policy.in_range(&public.fee).is_some(),
            Constraint::FeeWithinInput => {
                match (policy.in_range(&public.fee), policy.in_range(old.value())) {
                    (Some(fee), Some(old_value)) => fee <= old_value,
                    _ => false,
                }
            }
            Constraint::Conservation => *old.value() == *new.value() + public.fee,
        }
    }
}

/// Evaluate the constraint set, stopping at the first violation
pub fn evaluate<S: CommitmentScheme + ?Sized>(
    scheme: &S,
    policy: &AmountPolicy,
    public: &PublicInputs,
    witness: &PrivateWitness,
) -> Result<(), FailureReason> {
    for constraint in Constraint::ORDER {
        if !constraint.holds(scheme, policy, public, witness) {
            debug!(
                "transfer rejected by {:?} (scheme={}, bits={})",
                constraint,
                scheme.name(),
                policy.bits()
            );
            return Err(constraint.failure());
        }
    }
    Ok(())
}

/// Every violated constraint, in evaluation order
pub fn violations<S: CommitmentScheme + ?Sized>(
    scheme: &S,
    policy: &AmountPolicy,
    public: &PublicInputs,
    witness: &PrivateWitness,
) -> Vec<Constraint> {
    Constraint::ORDER
        .into_iter()
        .filter(|c| !c.holds(scheme, policy, public, witness))
        .collect()
}
