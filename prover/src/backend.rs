//! Proving Backends
//!
//! ```text
//! ┌──────────────────┐    prove     ┌───────────────┐   verify   ┌──────────┐
//! │ TransferInstance │ ───────────► │ TransferProof │ ─────────► │   bool   │
//! └──────────────────┘              └───────────────┘            └──────────┘
//!          │                        params, public inputs,
//!          ▼                        proof bytes, timing
//!   direct constraint check
//!   (FailureReason on reject)
//! ```
//!
//! Both backends run the direct verifier before proving, so a bad witness
//! is reported by the constraint it violates.
//!
//! Groth16 key files start with a header naming the params they were
//! generated for; loading a key under other params fails with
//! [`ProverError::ParamsMismatch`].

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use cloak_config::{CloakConfig, ProverMode};
use cloak_transfer::{
    AmountPolicy, PublicInputs, SchemeKind, TransferInstance, TransferParams, field,
    verify_instance,
};

use crate::circuit::{NUM_PUBLIC_INPUTS, TransferCircuit};
use crate::error::ProverError;

// ============================================================================
// Proof Types
// ============================================================================

/// A generated transfer proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProof {
    /// Scheme and amount policy the circuit was built for
    pub params: TransferParams,
    pub public_inputs: PublicInputs,
    /// Backend-specific proof encoding
    #[serde(with = "hex::serde")]
    pub proof_bytes: Vec<u8>,
    /// Proving time in milliseconds
    pub proving_time_ms: u64,
}

// ============================================================================
// Prover Traits
// ============================================================================

/// Proof verification half of a backend
pub trait TransferVerifier: Send + Sync {
    /// Params this backend proves and verifies under
    fn params(&self) -> TransferParams;

    /// Verify a transfer proof.
    ///
    /// Returns `Ok(false)` for a well-formed request whose proof does not
    /// verify, and an error when the proof targets different params.
    fn verify(&self, proof: &TransferProof) -> Result<bool, ProverError>;

    /// Hash identifying the verification key
    fn verification_key_hash(&self) -> [u8; 32];
}

/// Trait for transfer proof generation
pub trait TransferProver: TransferVerifier {
    fn prove(&self, instance: &TransferInstance) -> Result<TransferProof, ProverError>;
}

fn check_params(expected: TransferParams, proof: &TransferProof) -> Result<(), ProverError> {
    if proof.params != expected {
        return Err(ProverError::ParamsMismatch {
            expected,
            found: proof.params,
        });
    }
    Ok(())
}

// ============================================================================
// Key Files
// ============================================================================

const KEY_MAGIC: &[u8; 8] = b"CLOAKKEY";
const KEY_HEADER_LEN: usize = KEY_MAGIC.len() + 1 + 4 + 1;

/// Header layout: magic | scheme (u8) | bits (u32 LE) | allow_zero (u8)
fn write_key_header(params: &TransferParams, out: &mut Vec<u8>) {
    out.extend_from_slice(KEY_MAGIC);
    out.push(match params.scheme {
        SchemeKind::Poseidon => 0,
        SchemeKind::Mimc => 1,
    });
    out.extend_from_slice(&params.policy.bits().to_le_bytes());
    out.push(params.policy.allow_zero() as u8);
}

/// Split a key file into the params it was generated for and the key bytes
fn read_key_header(bytes: &[u8]) -> Result<(TransferParams, &[u8]), ProverError> {
    if bytes.len() < KEY_HEADER_LEN || &bytes[..KEY_MAGIC.len()] != KEY_MAGIC {
        return Err(ProverError::KeyFormat("missing key header"));
    }
    let (header, key) = bytes.split_at(KEY_HEADER_LEN);
    let scheme = match header[8] {
        0 => SchemeKind::Poseidon,
        1 => SchemeKind::Mimc,
        _ => return Err(ProverError::KeyFormat("unknown commitment scheme")),
    };
    let bits = u32::from_le_bytes([header[9], header[10], header[11], header[12]]);
    let allow_zero = match header[13] {
        0 => false,
        1 => true,
        _ => return Err(ProverError::KeyFormat("invalid zero rule")),
    };
    let policy = AmountPolicy::new(bits, allow_zero)
        .map_err(|_| ProverError::KeyFormat("invalid amount width"))?;
    Ok((TransferParams::new(scheme, policy), key))
}

/// Strip the header from a key file, checking it names `expected`
fn key_for_params(expected: TransferParams, bytes: &[u8]) -> Result<&[u8], ProverError> {
    let (found, key) = read_key_header(bytes)?;
    if found != expected {
        return Err(ProverError::ParamsMismatch { expected, found });
    }
    Ok(key)
}

/// Variable count (instance plus witness) of the transfer circuit for `params`,
/// synthesized the way Groth16 setup does
fn circuit_variables(params: TransferParams) -> Result<usize, ProverError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    TransferCircuit::dummy(params).generate_constraints(cs.clone())?;
    cs.finalize();
    Ok(cs.num_instance_variables() + cs.num_witness_variables())
}

// ============================================================================
// Mock Prover
// ============================================================================

/// Mock prover for tests and local tooling.
///
/// Checks the witness directly and emits a blake3 transcript of the params
/// and public inputs. Verification only recomputes the transcript, so a mock
/// proof carries no zero-knowledge or soundness guarantee of its own.
pub struct MockProver {
    params: TransferParams,
    vk_hash: [u8; 32],
}

impl MockProver {
    pub fn new(params: TransferParams) -> Self {
        Self {
            params,
            vk_hash: *blake3::hash(b"cloak-mock-vk-v1").as_bytes(),
        }
    }

    fn transcript(params: &TransferParams, inputs: &PublicInputs) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"cloak-mock-proof-v1");
        hasher.update(params.scheme.to_string().as_bytes());
        hasher.update(&params.policy.bits().to_le_bytes());
        hasher.update(&[params.policy.allow_zero() as u8]);
        for input in inputs.to_field_elements() {
            hasher.update(&field::to_bytes(&input));
        }
        *hasher.finalize().as_bytes()
    }
}

impl Default for MockProver {
    fn default() -> Self {
        Self::new(TransferParams::default())
    }
}

impl TransferVerifier for MockProver {
    fn params(&self) -> TransferParams {
        self.params
    }

    fn verify(&self, proof: &TransferProof) -> Result<bool, ProverError> {
        check_params(self.params, proof)?;
        let expected = Self::transcript(&self.params, &proof.public_inputs);
        Ok(proof.proof_bytes.as_slice() == expected.as_slice())
    }

    fn verification_key_hash(&self) -> [u8; 32] {
        self.vk_hash
    }
}

impl TransferProver for MockProver {
    fn prove(&self, instance: &TransferInstance) -> Result<TransferProof, ProverError> {
        let start = Instant::now();
        verify_instance(&self.params, instance)?;

        let proof_bytes = Self::transcript(&self.params, &instance.public).to_vec();
        Ok(TransferProof {
            params: self.params,
            public_inputs: instance.public,
            proof_bytes,
            proving_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// ============================================================================
// Groth16 (Real ZK Proving)
// ============================================================================

/// Groth16 verifier holding only the prepared verifying key
pub struct Groth16Verifier {
    params: TransferParams,
    prepared_vk: PreparedVerifyingKey<Bn254>,
    vk_hash: [u8; 32],
}

impl Groth16Verifier {
    /// Wrap a verifying key generated for `params`.
    ///
    /// A bare verifying key does not record its params; prefer
    /// [`Groth16Verifier::from_key_bytes`], which checks the key file header.
    pub fn new(params: TransferParams, vk: VerifyingKey<Bn254>) -> Result<Self, ProverError> {
        // gamma_abc_g1 holds one base per public input plus the constant term
        let found = vk.gamma_abc_g1.len().saturating_sub(1);
        if found != NUM_PUBLIC_INPUTS {
            return Err(ProverError::PublicInputCount {
                expected: NUM_PUBLIC_INPUTS,
                found,
            });
        }

        let vk_hash = compute_vk_hash(&vk)?;
        Ok(Self {
            params,
            prepared_vk: ark_groth16::prepare_verifying_key(&vk),
            vk_hash,
        })
    }

    /// Load a verifier from a verifying key file written by
    /// [`Groth16Prover::verifying_key_bytes`]
    pub fn from_key_bytes(params: TransferParams, vk_bytes: &[u8]) -> Result<Self, ProverError> {
        let key = key_for_params(params, vk_bytes)?;
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(key)?;
        Self::new(params, vk)
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.prepared_vk.vk
    }
}

impl TransferVerifier for Groth16Verifier {
    fn params(&self) -> TransferParams {
        self.params
    }

    fn verify(&self, proof: &TransferProof) -> Result<bool, ProverError> {
        check_params(self.params, proof)?;

        let parsed = match Proof::<Bn254>::deserialize_compressed(proof.proof_bytes.as_slice()) {
            Ok(p) => p,
            Err(e) => {
                warn!("Rejecting malformed Groth16 proof: {}", e);
                return Ok(false);
            }
        };

        let start = Instant::now();
        let inputs = proof.public_inputs.to_field_elements();
        let valid = Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, &inputs, &parsed)?;
        info!(
            "Verified Groth16 transfer proof in {:?}: {}",
            start.elapsed(),
            if valid { "valid" } else { "invalid" }
        );
        Ok(valid)
    }

    fn verification_key_hash(&self) -> [u8; 32] {
        self.vk_hash
    }
}

/// Groth16 prover over BN254
pub struct Groth16Prover {
    proving_key: ProvingKey<Bn254>,
    verifier: Groth16Verifier,
}

impl Groth16Prover {
    /// Run circuit-specific setup for `params`.
    ///
    /// The resulting keys only verify proofs produced under the same params.
    pub fn setup<R: RngCore + CryptoRng>(
        params: TransferParams,
        rng: &mut R,
    ) -> Result<Self, ProverError> {
        let start = Instant::now();
        let (pk, _vk) =
            Groth16::<Bn254>::circuit_specific_setup(TransferCircuit::dummy(params), rng)?;
        info!(
            "Groth16 setup for {} / {} bits complete in {:?}",
            params.scheme,
            params.policy.bits(),
            start.elapsed()
        );
        Self::from_proving_key(params, pk)
    }

    /// Wrap a proving key, checking its shape against the circuit for `params`
    pub fn from_proving_key(
        params: TransferParams,
        proving_key: ProvingKey<Bn254>,
    ) -> Result<Self, ProverError> {
        // a_query has one entry per circuit variable
        let expected = circuit_variables(params)?;
        let found = proving_key.a_query.len();
        if found != expected {
            return Err(ProverError::KeyShape {
                params,
                expected,
                found,
            });
        }

        let verifier = Groth16Verifier::new(params, proving_key.vk.clone())?;
        Ok(Self {
            proving_key,
            verifier,
        })
    }

    /// Load a prover from a proving key file (the verifying key is embedded)
    pub fn from_key_bytes(params: TransferParams, pk_bytes: &[u8]) -> Result<Self, ProverError> {
        let key = key_for_params(params, pk_bytes)?;
        let pk = ProvingKey::<Bn254>::deserialize_compressed(key)?;
        Self::from_proving_key(params, pk)
    }

    /// Proving key file: params header followed by the compressed key
    pub fn proving_key_bytes(&self) -> Result<Vec<u8>, ProverError> {
        let mut bytes = Vec::new();
        write_key_header(&self.params(), &mut bytes);
        self.proving_key.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    /// Verifying key file: params header followed by the compressed key
    pub fn verifying_key_bytes(&self) -> Result<Vec<u8>, ProverError> {
        let mut bytes = Vec::new();
        write_key_header(&self.params(), &mut bytes);
        self.verifier.verifying_key().serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    pub fn verifier(&self) -> &Groth16Verifier {
        &self.verifier
    }
}

impl TransferVerifier for Groth16Prover {
    fn params(&self) -> TransferParams {
        self.verifier.params
    }

    fn verify(&self, proof: &TransferProof) -> Result<bool, ProverError> {
        self.verifier.verify(proof)
    }

    fn verification_key_hash(&self) -> [u8; 32] {
        self.verifier.vk_hash
    }
}

impl TransferProver for Groth16Prover {
    fn prove(&self, instance: &TransferInstance) -> Result<TransferProof, ProverError> {
        let params = self.params();
        let start = Instant::now();
        verify_instance(&params, instance)?;

        let circuit = TransferCircuit::from_instance(params, instance);
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, &mut rand::thread_rng())?;

        let mut proof_bytes = Vec::new();
        proof.serialize_compressed(&mut proof_bytes)?;

        let proving_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Generated Groth16 transfer proof: {} bytes in {} ms",
            proof_bytes.len(),
            proving_time_ms
        );

        Ok(TransferProof {
            params,
            public_inputs: instance.public,
            proof_bytes,
            proving_time_ms,
        })
    }
}

/// Hash of the compressed verifying key
fn compute_vk_hash(vk: &VerifyingKey<Bn254>) -> Result<[u8; 32], ProverError> {
    let mut vk_bytes = Vec::new();
    vk.serialize_compressed(&mut vk_bytes)?;
    Ok(*blake3::hash(&vk_bytes).as_bytes())
}

// ============================================================================
// Config Wiring
// ============================================================================

fn read_key(path: &str, what: &str) -> Result<Vec<u8>> {
    std::fs::read(Path::new(path)).with_context(|| format!("Failed to read {what} from {path}"))
}

/// Build the configured proving backend
pub fn prover_from_config(config: &CloakConfig) -> Result<Box<dyn TransferProver>> {
    let params = config.transfer_params()?;
    match config.prover.mode {
        ProverMode::Mock => {
            info!("Using mock transfer prover");
            Ok(Box::new(MockProver::new(params)))
        }
        ProverMode::Groth16 => {
            let path = config.proving_key_path();
            let bytes = read_key(path, "proving key")?;
            let prover = Groth16Prover::from_key_bytes(params, &bytes)
                .with_context(|| format!("Invalid proving key at {path}"))?;
            info!("Loaded Groth16 proving key from {}", path);
            Ok(Box::new(prover))
        }
    }
}

/// Build the configured verifier; Groth16 mode needs only the verifying key
pub fn verifier_from_config(config: &CloakConfig) -> Result<Box<dyn TransferVerifier>> {
    let params = config.transfer_params()?;
    match config.prover.mode {
        ProverMode::Mock => Ok(Box::new(MockProver::new(params))),
        ProverMode::Groth16 => {
            let path = config.verifying_key_path();
            let bytes = read_key(path, "verifying key")?;
            let verifier = Groth16Verifier::from_key_bytes(params, &bytes)
                .with_context(|| format!("Invalid verifying key at {path}"))?;
            Ok(Box::new(verifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use cloak_transfer::{AmountKind, AmountPolicy, FailureReason, Note, SchemeKind};

    fn instance(old: u64, new: u64, fee: u64) -> TransferInstance {
        TransferInstance::honest(
            Note::new(old, Fr::from(3u64)),
            Note::new(new, Fr::from(4u64)),
            fee,
            &SchemeKind::Poseidon,
        )
    }

    #[test]
    fn test_mock_prove_verify() {
        let prover = MockProver::default();
        let proof = prover.prove(&instance(100, 90, 10)).unwrap();
        assert_eq!(proof.proof_bytes.len(), 32);
        assert!(prover.verify(&proof).unwrap());
    }

    #[test]
    fn test_mock_rejects_bad_witness() {
        let prover = MockProver::default();
        let err = prover.prove(&instance(100, 90, 11)).unwrap_err();
        assert!(matches!(
            err,
            ProverError::Rejected(FailureReason::ConservationViolated)
        ));

        let err = prover.prove(&instance(5, 0, 6)).unwrap_err();
        assert!(matches!(
            err,
            ProverError::Rejected(FailureReason::ValueOutOfRange {
                which: AmountKind::Fee
            })
        ));
    }

    #[test]
    fn test_mock_tampered_inputs() {
        let prover = MockProver::default();
        let mut proof = prover.prove(&instance(100, 90, 10)).unwrap();
        proof.public_inputs.fee = Fr::from(9u64);
        assert!(!prover.verify(&proof).unwrap());
    }

    #[test]
    fn test_params_mismatch() {
        let prover = MockProver::default();
        let proof = prover.prove(&instance(100, 90, 10)).unwrap();

        let strict = TransferParams::new(SchemeKind::Poseidon, AmountPolicy::strictly_positive());
        let other = MockProver::new(strict);
        assert!(matches!(
            other.verify(&proof),
            Err(ProverError::ParamsMismatch { .. })
        ));
    }

    #[test]
    fn test_mock_from_config() {
        let config = CloakConfig::default();
        let prover = prover_from_config(&config).unwrap();
        assert_eq!(prover.params(), TransferParams::default());
        assert_eq!(
            prover.verification_key_hash(),
            *blake3::hash(b"cloak-mock-vk-v1").as_bytes()
        );
    }

    #[test]
    fn test_key_header_roundtrip() {
        let params = TransferParams::new(SchemeKind::Mimc, AmountPolicy::new(32, false).unwrap());
        let mut bytes = Vec::new();
        write_key_header(&params, &mut bytes);
        bytes.extend_from_slice(b"key");

        let (found, key) = read_key_header(&bytes).unwrap();
        assert_eq!(found, params);
        assert_eq!(key, b"key");

        assert!(matches!(
            key_for_params(TransferParams::default(), &bytes),
            Err(ProverError::ParamsMismatch { found, .. }) if found == params
        ));
    }

    #[test]
    fn test_key_header_rejects_bad_files() {
        assert!(matches!(
            read_key_header(b"short"),
            Err(ProverError::KeyFormat(_))
        ));

        let mut bytes = Vec::new();
        write_key_header(&TransferParams::default(), &mut bytes);
        let mut bad_scheme = bytes.clone();
        bad_scheme[8] = 7;
        assert!(matches!(
            read_key_header(&bad_scheme),
            Err(ProverError::KeyFormat(_))
        ));

        let mut zero_width = bytes;
        zero_width[9..13].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            read_key_header(&zero_width),
            Err(ProverError::KeyFormat(_))
        ));
    }

    #[test]
    fn test_circuit_variables_depend_on_params() {
        let base = circuit_variables(TransferParams::default()).unwrap();
        let mimc = TransferParams::new(SchemeKind::Mimc, AmountPolicy::DEFAULT);
        let narrow = TransferParams::new(SchemeKind::Poseidon, AmountPolicy::new(32, true).unwrap());
        let strict = TransferParams::new(SchemeKind::Poseidon, AmountPolicy::strictly_positive());

        assert_ne!(circuit_variables(mimc).unwrap(), base);
        assert_ne!(circuit_variables(narrow).unwrap(), base);
        assert_ne!(circuit_variables(strict).unwrap(), base);
    }

    #[test]
    fn test_proving_key_shape_checked() {
        use ark_std::rand::{SeedableRng, rngs::StdRng};

        let mimc = TransferParams::new(SchemeKind::Mimc, AmountPolicy::DEFAULT);
        let prover = Groth16Prover::setup(mimc, &mut StdRng::seed_from_u64(7)).unwrap();

        let err = Groth16Prover::from_proving_key(
            TransferParams::default(),
            prover.proving_key.clone(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProverError::KeyShape { .. }));

        assert!(Groth16Prover::from_proving_key(mimc, prover.proving_key.clone()).is_ok());
    }

    #[test]
    fn test_groth16_missing_key_file() {
        let mut config = CloakConfig::default();
        config.prover.mode = ProverMode::Groth16;
        config.prover.proving_key_path = Some("/nonexistent/cloak/transfer.pk".into());
        assert!(prover_from_config(&config).is_err());
    }
}
