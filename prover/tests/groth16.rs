//! End-to-end Groth16 setup, prove and verify.

use ark_bn254::Fr;
use ark_std::rand::{SeedableRng, rngs::StdRng};
use cloak_prover::{
    Groth16Prover, Groth16Verifier, ProverError, TransferProof, TransferProver, TransferVerifier,
};
use cloak_transfer::{
    AmountPolicy, FailureReason, Note, SchemeKind, TransferInstance, TransferParams,
};

fn setup(params: TransferParams) -> Groth16Prover {
    let mut rng = StdRng::seed_from_u64(42);
    Groth16Prover::setup(params, &mut rng).unwrap()
}

fn transfer(old: u64, new: u64, fee: u64, scheme: SchemeKind) -> TransferInstance {
    let mut rng = StdRng::seed_from_u64(old ^ fee);
    TransferInstance::honest(
        Note::random(old, &mut rng),
        Note::random(new, &mut rng),
        fee,
        &scheme,
    )
}

#[test]
fn groth16_round_trip() {
    let params = TransferParams::default();
    let prover = setup(params);

    let proof = prover.prove(&transfer(100, 90, 10, params.scheme)).unwrap();
    assert!(prover.verify(&proof).unwrap());

    // proof files are JSON
    let json = serde_json::to_string(&proof).unwrap();
    let parsed: TransferProof = serde_json::from_str(&json).unwrap();
    assert!(prover.verify(&parsed).unwrap());

    // a verifier loaded from the serialized key agrees
    let vk_bytes = prover.verifying_key_bytes().unwrap();
    let verifier = Groth16Verifier::from_key_bytes(params, &vk_bytes).unwrap();
    assert!(verifier.verify(&proof).unwrap());
    assert_eq!(
        verifier.verification_key_hash(),
        prover.verification_key_hash()
    );

    // tampering with any public input breaks the proof
    let mut tampered = proof.clone();
    tampered.public_inputs.fee = Fr::from(11u64);
    assert!(!prover.verify(&tampered).unwrap());

    let mut tampered = proof.clone();
    tampered.public_inputs.new_commitment = proof.public_inputs.old_commitment;
    assert!(!prover.verify(&tampered).unwrap());

    // garbage proof bytes are rejected, not an error
    let mut garbage = proof;
    garbage.proof_bytes = vec![0xab; 12];
    assert!(!prover.verify(&garbage).unwrap());
}

#[test]
fn groth16_keys_reload() {
    let params = TransferParams::new(SchemeKind::Mimc, AmountPolicy::strictly_positive());
    let prover = setup(params);

    let pk_bytes = prover.proving_key_bytes().unwrap();
    let reloaded = Groth16Prover::from_key_bytes(params, &pk_bytes).unwrap();
    assert_eq!(
        reloaded.verification_key_hash(),
        prover.verification_key_hash()
    );

    let proof = reloaded.prove(&transfer(7, 5, 2, SchemeKind::Mimc)).unwrap();
    assert!(prover.verify(&proof).unwrap());
}

#[test]
fn groth16_reports_failure_reason() {
    let params = TransferParams::default();
    let prover = setup(params);

    let err = prover.prove(&transfer(100, 90, 11, params.scheme)).unwrap_err();
    assert!(matches!(
        err,
        ProverError::Rejected(FailureReason::ConservationViolated)
    ));
}

#[test]
fn groth16_params_bound_to_keys() {
    let prover = setup(TransferParams::default());
    let proof = prover
        .prove(&transfer(50, 50, 0, SchemeKind::Poseidon))
        .unwrap();

    let mut relabeled = proof;
    relabeled.params = TransferParams::new(SchemeKind::Mimc, AmountPolicy::DEFAULT);
    assert!(matches!(
        prover.verify(&relabeled),
        Err(ProverError::ParamsMismatch { .. })
    ));
}

#[test]
fn groth16_keys_refuse_other_params() {
    let mimc = TransferParams::new(SchemeKind::Mimc, AmountPolicy::DEFAULT);
    let prover = setup(mimc);
    let pk_bytes = prover.proving_key_bytes().unwrap();
    let vk_bytes = prover.verifying_key_bytes().unwrap();

    let poseidon = TransferParams::default();
    assert!(matches!(
        Groth16Prover::from_key_bytes(poseidon, &pk_bytes),
        Err(ProverError::ParamsMismatch { expected, found }) if expected == poseidon && found == mimc
    ));
    assert!(matches!(
        Groth16Verifier::from_key_bytes(poseidon, &vk_bytes),
        Err(ProverError::ParamsMismatch { .. })
    ));

    let strict = TransferParams::new(SchemeKind::Mimc, AmountPolicy::strictly_positive());
    assert!(matches!(
        Groth16Verifier::from_key_bytes(strict, &vk_bytes),
        Err(ProverError::ParamsMismatch { .. })
    ));

    // a headerless key is not accepted either
    let mut bare = Vec::new();
    ark_serialize::CanonicalSerialize::serialize_compressed(
        prover.verifier().verifying_key(),
        &mut bare,
    )
    .unwrap();
    assert!(matches!(
        Groth16Verifier::from_key_bytes(mimc, &bare),
        Err(ProverError::KeyFormat(_))
    ));
}
