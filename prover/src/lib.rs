//! Cloak Transfer Prover
//!
//! Compiles the transfer constraint set to R1CS over BN254 and proves it
//! with Groth16.
//!
//! ```text
//! TransferInstance ──► direct check ──► TransferCircuit ──► Groth16 ──► TransferProof
//!                      (FailureReason)   (R1CS, 3 public inputs)
//! ```

pub mod backend;
pub mod circuit;
pub mod error;

// Re-export key types for external usage
pub use backend::{
    Groth16Prover, Groth16Verifier, MockProver, TransferProof, TransferProver, TransferVerifier,
    prover_from_config, verifier_from_config,
};
pub use circuit::TransferCircuit;
pub use error::ProverError;
