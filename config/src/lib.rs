//! Cloak Configuration
//!
//! Shared configuration crate for the Cloak binaries.
//!
//! Handles loading configuration from:
//! 1. CLOAK_CONFIG env var (explicit path)
//! 2. ./cloak.toml (current directory)
//! 3. ~/.cloak/config.toml (user home)
//!
//! Environment variables take precedence over TOML config. The verification
//! core never reads this crate; binaries turn it into [`TransferParams`].

use anyhow::{Context, Result};
use cloak_transfer::{AMOUNT_BITS, AmountPolicy, SchemeKind, TransferParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<CloakConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "config.toml";
const LOCAL_CONFIG_FILE_NAME: &str = "cloak.toml";
const CONFIG_DIR_NAME: &str = ".cloak";

const DEFAULT_PROVING_KEY: &str = "./keys/transfer.pk";
const DEFAULT_VERIFYING_KEY: &str = "./keys/transfer.vk";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloakConfig {
    #[serde(default)]
    pub commitment: CommitmentConfig,
    #[serde(default)]
    pub amounts: AmountConfig,
    #[serde(default)]
    pub prover: ProverConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentConfig {
    #[serde(default)]
    pub scheme: SchemeKind,
}

/// Amount range policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountConfig {
    /// Bit width every amount must fit in (1..=64)
    #[serde(default = "default_bits")]
    pub bits: u32,
    /// Whether a note may carry a value of zero
    #[serde(default = "default_allow_zero")]
    pub allow_zero: bool,
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            bits: AMOUNT_BITS,
            allow_zero: true,
        }
    }
}

fn default_bits() -> u32 {
    AMOUNT_BITS
}

fn default_allow_zero() -> bool {
    true
}

/// Proving backend configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    #[serde(default)]
    pub mode: ProverMode,
    #[serde(default)]
    pub proving_key_path: Option<String>,
    #[serde(default)]
    pub verifying_key_path: Option<String>,
}

/// Prover mode for TOML config
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProverMode {
    #[default]
    Mock,
    Groth16,
}

impl FromStr for ProverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(ProverMode::Mock),
            "groth16" => Ok(ProverMode::Groth16),
            other => Err(format!("unknown prover mode: {other}")),
        }
    }
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl CloakConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check CLOAK_CONFIG env var
        if let Ok(path) = env::var("CLOAK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("CLOAK_CONFIG points to missing file: {}", path.display());
        }

        // 2. Check ./cloak.toml (current directory)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.cloak/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Commitment
        env_parse("CLOAK_COMMITMENT_SCHEME", &mut self.commitment.scheme);

        // Amounts
        env_parse("CLOAK_AMOUNT_BITS", &mut self.amounts.bits);
        if let Some(v) = env_bool("CLOAK_ALLOW_ZERO") {
            self.amounts.allow_zero = v;
        }

        // Prover
        env_parse("CLOAK_PROVER_MODE", &mut self.prover.mode);
        env_option_string("CLOAK_PROVING_KEY", &mut self.prover.proving_key_path);
        env_option_string("CLOAK_VERIFYING_KEY", &mut self.prover.verifying_key_path);
    }

    /// Scheme and amount policy for the verifier.
    ///
    /// Fails if the configured bit width is outside 1..=64.
    pub fn transfer_params(&self) -> Result<TransferParams> {
        let policy = AmountPolicy::new(self.amounts.bits, self.amounts.allow_zero)
            .context("Invalid [amounts] section")?;
        Ok(TransferParams::new(self.commitment.scheme, policy))
    }

    /// Proving key path, falling back to the default location
    pub fn proving_key_path(&self) -> &str {
        self.prover
            .proving_key_path
            .as_deref()
            .unwrap_or(DEFAULT_PROVING_KEY)
    }

    /// Verifying key path, falling back to the default location
    pub fn verifying_key_path(&self) -> &str {
        self.prover
            .verifying_key_path
            .as_deref()
            .unwrap_or(DEFAULT_VERIFYING_KEY)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.prover.proving_key_path = Some(DEFAULT_PROVING_KEY.into());
        sample.prover.verifying_key_path = Some(DEFAULT_VERIFYING_KEY.into());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static CloakConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static CloakConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: CloakConfig) -> Result<(), CloakConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `CloakConfig::global()`.
#[inline]
pub fn global_config() -> &'static CloakConfig {
    CloakConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
