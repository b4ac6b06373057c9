//! Direct verification entry points.
//!
//! Every call is independent and side-effect free; batches are spread over
//! the rayon pool with no ordering between instances.

use log::debug;
use rayon::prelude::*;

use crate::commitment::CommitmentScheme;
use crate::constraints::{self, PrivateWitness, PublicInputs, TransferInstance, TransferParams};
use crate::error::FailureReason;
use crate::field::AmountPolicy;

/// Verify one transfer against the configured scheme and amount policy
pub fn verify(
    params: &TransferParams,
    public: &PublicInputs,
    witness: &PrivateWitness,
) -> Result<(), FailureReason> {
    constraints::evaluate(&params.scheme, &params.policy, public, witness)
}

/// Verify one transfer with a caller-supplied commitment scheme
pub fn verify_with<S: CommitmentScheme + ?Sized>(
    scheme: &S,
    policy: &AmountPolicy,
    public: &PublicInputs,
    witness: &PrivateWitness,
) -> Result<(), FailureReason> {
    constraints::evaluate(scheme, policy, public, witness)
}

pub fn verify_instance(
    params: &TransferParams,
    instance: &TransferInstance,
) -> Result<(), FailureReason> {
    verify(params, &instance.public, &instance.witness)
}

/// Verify many transfers in parallel; results are returned in input order
pub fn verify_batch(
    params: &TransferParams,
    instances: &[TransferInstance],
) -> Vec<Result<(), FailureReason>> {
    let results: Vec<_> = instances
        .par_iter()
        .map(|instance| verify_instance(params, instance))
        .collect();

    let rejected = results.iter().filter(|r| r.is_err()).count();
    debug!(
        "verified batch of {} transfers ({} rejected)",
        instances.len(),
        rejected
    );
    results
}
