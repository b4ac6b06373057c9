mod request;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use cloak_config::CloakConfig;
use cloak_prover::{TransferProof, prover_from_config, verifier_from_config};
use cloak_transfer::{
    FailureReason, Note, SchemeKind, TransferInstance, field, random_blinding, verify_instance,
};

use request::TransferRequest;

/// Cloak - confidential transfer verification tool
#[derive(Parser, Debug)]
#[command(name = "cloak", version)]
#[command(about = "Commit, verify and prove confidential transfers", long_about = None)]
struct Cli {
    /// Config file (overrides CLOAK_CONFIG and the default lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Commit to a note value
    Commit {
        #[arg(long)]
        value: u64,
        /// Hex blinding factor; random when omitted
        #[arg(long)]
        blinding: Option<String>,
        /// Commitment scheme (overrides config)
        #[arg(long)]
        scheme: Option<SchemeKind>,
    },
    /// Build an honest transfer request with fresh blinding factors
    Request {
        #[arg(long)]
        old: u64,
        #[arg(long)]
        new: u64,
        #[arg(long)]
        fee: u64,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a transfer request directly
    Verify {
        request: PathBuf,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prove a transfer request with the configured backend
    Prove {
        request: PathBuf,
        /// Write the proof here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Verify a proof file with the configured backend
    VerifyProof { proof: PathBuf },
    /// Print a sample config file
    SampleConfig,
}

#[derive(Serialize)]
struct VerifyOutcome {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<FailureReason>,
}

fn load_config(path: Option<&Path>) -> Result<CloakConfig> {
    match path {
        Some(path) => CloakConfig::load_from(path),
        None => Ok(CloakConfig::global().clone()),
    }
}

fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn commit(
    config: &CloakConfig,
    value: u64,
    blinding: Option<&str>,
    scheme: Option<SchemeKind>,
) -> Result<()> {
    let scheme = scheme.unwrap_or(config.commitment.scheme);
    let blinding = match blinding {
        Some(hex) => field::from_hex(hex).context("Invalid blinding factor")?,
        None => random_blinding(&mut rand::thread_rng()),
    };

    let commitment = Note::new(value, blinding).commitment(&scheme);
    println!("scheme:     {scheme}");
    println!("value:      {value}");
    println!("blinding:   {}", field::to_hex(&blinding));
    println!("commitment: {commitment}");
    Ok(())
}

fn build_request(config: &CloakConfig, old: u64, new: u64, fee: u64) -> TransferRequest {
    let mut rng = rand::thread_rng();
    let instance = TransferInstance::honest(
        Note::random(old, &mut rng),
        Note::random(new, &mut rng),
        fee,
        &config.commitment.scheme,
    );
    if old.checked_sub(fee) != Some(new) {
        log::warn!("Request does not balance: {} != {} + {}", old, new, fee);
    }
    TransferRequest::from_instance(&instance)
}

/// Returns whether the transfer verified
fn verify(config: &CloakConfig, path: &Path, json: bool) -> Result<bool> {
    let params = config.transfer_params()?;
    let instance = TransferRequest::load(path)?.to_instance();
    let result = verify_instance(&params, &instance);

    if json {
        let outcome = VerifyOutcome {
            valid: result.is_ok(),
            reason: result.err(),
        };
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        match result {
            Ok(()) => println!(
                "✅ Transfer verified ({}, {} bits)",
                params.scheme,
                params.policy.bits()
            ),
            Err(reason) => println!("❌ Transfer rejected: {reason}"),
        }
    }
    Ok(result.is_ok())
}

fn prove(config: &CloakConfig, path: &Path, out: Option<&Path>) -> Result<()> {
    let instance = TransferRequest::load(path)?.to_instance();
    let prover = prover_from_config(config)?;
    let proof = prover.prove(&instance).context("Proving failed")?;
    log::info!(
        "Proof generated in {} ms ({} bytes)",
        proof.proving_time_ms,
        proof.proof_bytes.len()
    );
    write_json(&proof, out)
}

fn verify_proof(config: &CloakConfig, path: &Path) -> Result<bool> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read proof file: {}", path.display()))?;
    let proof: TransferProof = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse proof file: {}", path.display()))?;

    let verifier = verifier_from_config(config)?;
    let valid = verifier.verify(&proof)?;
    if valid {
        println!("✅ Proof valid");
    } else {
        println!("❌ Proof invalid");
    }
    Ok(valid)
}

fn run(cli: Cli) -> Result<bool> {
    if let Commands::SampleConfig = cli.command {
        print!("{}", CloakConfig::generate_sample());
        return Ok(true);
    }

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Commit {
            value,
            blinding,
            scheme,
        } => commit(&config, value, blinding.as_deref(), scheme)?,
        Commands::Request { old, new, fee, out } => {
            write_json(&build_request(&config, old, new, fee), out.as_deref())?
        }
        Commands::Verify { request, json } => return verify(&config, &request, json),
        Commands::Prove { request, out } => prove(&config, &request, out.as_deref())?,
        Commands::VerifyProof { proof } => return verify_proof(&config, &proof),
        Commands::SampleConfig => {}
    }
    Ok(true)
}

fn main() {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloak_transfer::Fr;
    use std::io::Write;

    fn write_request(request: &TransferRequest) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(request).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn test_cli_parses() {
        let cli =
            Cli::try_parse_from(["cloak", "commit", "--value", "5", "--scheme", "mimc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Commit {
                value: 5,
                scheme: Some(SchemeKind::Mimc),
                ..
            }
        ));
        assert!(Cli::try_parse_from(["cloak", "commit", "--value", "-5"]).is_err());
    }

    #[test]
    fn test_verify_request_file() {
        let config = CloakConfig::default();
        let good = write_request(&build_request(&config, 100, 90, 10));
        assert!(verify(&config, good.path(), true).unwrap());

        let bad = write_request(&build_request(&config, 100, 90, 11));
        assert!(!verify(&config, bad.path(), false).unwrap());
    }

    #[test]
    fn test_mock_prove_and_verify_files() {
        let config = CloakConfig::default();
        let request = write_request(&build_request(&config, 40, 30, 10));
        let out = tempfile::NamedTempFile::new().unwrap();

        prove(&config, request.path(), Some(out.path())).unwrap();
        assert!(verify_proof(&config, out.path()).unwrap());
    }

    #[test]
    fn test_prove_rejects_invalid_request() {
        let config = CloakConfig::default();
        let request = write_request(&build_request(&config, 10, 10, 1));
        assert!(prove(&config, request.path(), None).is_err());
    }

    #[test]
    fn test_outcome_json() {
        let outcome = VerifyOutcome {
            valid: false,
            reason: Some(FailureReason::ConservationViolated),
        };
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"{"valid":false,"reason":{"kind":"conservation_violated"}}"#
        );
    }

    #[test]
    fn test_commit_with_fixed_blinding() {
        let config = CloakConfig::default();
        let blinding = field::to_hex(&Fr::from(9u64));
        commit(&config, 12, Some(&blinding), None).unwrap();
        assert!(commit(&config, 12, Some("0xzz"), None).is_err());
    }
}
