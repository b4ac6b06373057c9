use ark_relations::r1cs::SynthesisError;
use ark_serialize::SerializationError;
use cloak_transfer::{FailureReason, TransferParams};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("transfer rejected: {0}")]
    Rejected(#[from] FailureReason),

    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("key or proof serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("verifying key expects {found} public inputs, transfer circuit has {expected}")]
    PublicInputCount { expected: usize, found: usize },

    #[error("proof or key was produced for {found:?}, backend is configured for {expected:?}")]
    ParamsMismatch {
        expected: TransferParams,
        found: TransferParams,
    },

    #[error("proving key has {found} variables, transfer circuit for {params:?} has {expected}")]
    KeyShape {
        params: TransferParams,
        expected: usize,
        found: usize,
    },

    #[error("not a Cloak transfer key: {0}")]
    KeyFormat(&'static str),
}
