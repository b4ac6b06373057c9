//! Key Generation CLI for the Cloak transfer circuit
//!
//! Generates the Groth16 proving and verifying keys for `TransferCircuit`.
//! Keys are specific to the commitment scheme and amount policy they were
//! generated for; regenerate them whenever either changes.
//!
//! Usage:
//!   cargo run --package cloak-prover --bin keygen -- --pk-out ./keys/transfer.pk --vk-out ./keys/transfer.vk

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ark_std::rand::{SeedableRng, rngs::StdRng};
use clap::Parser;

use cloak_config::CloakConfig;
use cloak_prover::{Groth16Prover, TransferVerifier, circuit::NUM_PUBLIC_INPUTS};
use cloak_transfer::{AmountPolicy, SchemeKind, TransferParams};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "keygen")]
#[command(about = "Generate Groth16 keys for the Cloak transfer circuit", long_about = None)]
struct Args {
    /// Path for proving key output (defaults to the configured path)
    #[arg(long)]
    pk_out: Option<PathBuf>,

    /// Path for verifying key output (defaults to the configured path)
    #[arg(long)]
    vk_out: Option<PathBuf>,

    /// Overwrite existing keys
    #[arg(long, short)]
    force: bool,

    /// Commitment scheme (overrides config)
    #[arg(long)]
    scheme: Option<SchemeKind>,

    /// Amount bit width (overrides config)
    #[arg(long)]
    bits: Option<u32>,

    /// Reject zero-valued notes (overrides config)
    #[arg(long)]
    strict: bool,

    /// Deterministic setup seed; test keys only
    #[arg(long)]
    seed: Option<u64>,
}

fn resolve_params(args: &Args, config: &CloakConfig) -> Result<TransferParams> {
    let mut params = config.transfer_params()?;
    if let Some(scheme) = args.scheme {
        params.scheme = scheme;
    }
    let bits = args.bits.unwrap_or(params.policy.bits());
    let allow_zero = params.policy.allow_zero() && !args.strict;
    params.policy = AmountPolicy::new(bits, allow_zero)?;
    Ok(params)
}

/// Paths among `paths` that already exist
fn existing_keys<'a>(paths: &[&'a Path]) -> Vec<&'a Path> {
    paths.iter().copied().filter(|p| p.exists()).collect()
}

fn write_key(path: &Path, bytes: &[u8], what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {what} directory"))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {what}"))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = CloakConfig::global();

    let pk_path = args
        .pk_out
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.proving_key_path()));
    let vk_path = args
        .vk_out
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.verifying_key_path()));

    // Refuse to overwrite either key
    let existing = existing_keys(&[pk_path.as_path(), vk_path.as_path()]);
    if !args.force && !existing.is_empty() {
        println!("Keys already exist at:");
        for path in existing {
            println!("  {}", path.display());
        }
        println!("\nUse --force to regenerate keys.");
        return Ok(());
    }

    let params = resolve_params(&args, config)?;

    println!("Cloak Transfer Key Generation");
    println!("=============================");
    println!();
    println!("  Scheme:        {}", params.scheme);
    println!("  Amount bits:   {}", params.policy.bits());
    println!("  Zero values:   {}", params.policy.allow_zero());
    println!(
        "  Public inputs: {} (old_commitment, new_commitment, fee)",
        NUM_PUBLIC_INPUTS
    );
    println!();

    println!("Performing Groth16 circuit-specific setup...");
    let start = std::time::Instant::now();
    let prover = match args.seed {
        Some(seed) => {
            println!("  WARNING: deterministic seed, do not use these keys in production");
            Groth16Prover::setup(params, &mut StdRng::seed_from_u64(seed))
        }
        None => Groth16Prover::setup(params, &mut rand::thread_rng()),
    }
    .context("Failed to perform circuit setup")?;
    println!("Setup complete in {:?}", start.elapsed());
    println!();

    let pk_bytes = prover
        .proving_key_bytes()
        .context("Failed to serialize proving key")?;
    println!("Saving proving key to {}...", pk_path.display());
    write_key(&pk_path, &pk_bytes, "proving key")?;
    println!(
        "  Size: {} bytes ({:.2} MB)",
        pk_bytes.len(),
        pk_bytes.len() as f64 / 1024.0 / 1024.0
    );

    let vk_bytes = prover
        .verifying_key_bytes()
        .context("Failed to serialize verifying key")?;
    println!("Saving verifying key to {}...", vk_path.display());
    write_key(&vk_path, &vk_bytes, "verifying key")?;
    println!("  Size: {} bytes", vk_bytes.len());

    println!();
    println!("Verification key hash (blake3):");
    println!("  {}", hex::encode(prover.verification_key_hash()));

    println!();
    println!("Key generation complete!");
    println!();
    println!("To prove with these keys, set:");
    println!("  export CLOAK_PROVER_MODE=groth16");
    println!("  export CLOAK_PROVING_KEY={}", pk_path.display());
    println!("  export CLOAK_VERIFYING_KEY={}", vk_path.display());
    println!("  export CLOAK_COMMITMENT_SCHEME={}", params.scheme);
    println!("  export CLOAK_AMOUNT_BITS={}", params.policy.bits());
    println!("  export CLOAK_ALLOW_ZERO={}", params.policy.allow_zero());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_key_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/keys/transfer.vk");
        write_key(&path, b"vk", "verifying key").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"vk");
    }

    #[test]
    fn test_single_existing_key_blocks_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let pk = dir.path().join("transfer.pk");
        let vk = dir.path().join("transfer.vk");
        assert!(existing_keys(&[pk.as_path(), vk.as_path()]).is_empty());

        fs::write(&vk, b"old").unwrap();
        assert_eq!(existing_keys(&[pk.as_path(), vk.as_path()]), vec![vk.as_path()]);
    }

    #[test]
    fn test_resolve_params_overrides() {
        let config = CloakConfig::default();
        let args = Args::parse_from(["keygen", "--scheme", "mimc", "--bits", "32", "--strict"]);
        let params = resolve_params(&args, &config).unwrap();
        assert_eq!(params.scheme, SchemeKind::Mimc);
        assert_eq!(params.policy, AmountPolicy::new(32, false).unwrap());

        let args = Args::parse_from(["keygen", "--bits", "0"]);
        assert!(resolve_params(&args, &config).is_err());
    }
}
