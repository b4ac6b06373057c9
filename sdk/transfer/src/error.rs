use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two notes a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSide {
    Old,
    New,
}

impl fmt::Display for NoteSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteSide::Old => f.write_str("old"),
            NoteSide::New => f.write_str("new"),
        }
    }
}

/// Which range-checked quantity a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountKind {
    OldValue,
    NewValue,
    Fee,
}

impl fmt::Display for AmountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountKind::OldValue => f.write_str("old_value"),
            AmountKind::NewValue => f.write_str("new_value"),
            AmountKind::Fee => f.write_str("fee"),
        }
    }
}

/// Reason a transfer instance was rejected.
///
/// Failures are determinate: the same instance always yields the same reason.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("{which} note does not open its public commitment")]
    CommitmentMismatch { which: NoteSide },

    #[error("{which} is outside the permitted amount range")]
    ValueOutOfRange { which: AmountKind },

    #[error("old value does not equal new value plus fee")]
    ConservationViolated,
}

/// Errors decoding field elements and commitments from their wire form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("encoding is not a canonical field element")]
    NonCanonical,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("amount width must be between 1 and 64 bits, got {0}")]
    InvalidWidth(u32),
}
