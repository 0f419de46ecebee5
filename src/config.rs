//! Configuration management for DualChain

use crate::consensus::pow::{DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, MAX_DIFFICULTY, NONCE_BATCH_SIZE};
use crate::consensus::{Consensus, PowValidator};
use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Largest amount a single `Blockchain::stake` call accepts.
/// Weighted stakes are `f64`, exact up to 2^53.
pub const MAX_STAKE_AMOUNT: u64 = 1 << 53;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mining: MiningConfig,
    #[serde(default)]
    pub staking: StakingConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MiningConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakingConfig {
    #[serde(default = "default_max_stake")]
    pub max_stake: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "default_consensus")]
    pub default: String,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            timeout_secs: None,
        }
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            max_stake: default_max_stake(),
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            default: default_consensus(),
        }
    }
}

impl MiningConfig {
    pub fn pow_validator(&self) -> Result<PowValidator> {
        Ok(PowValidator::with_difficulty(self.difficulty)?
            .batch_size(self.batch_size)?
            .max_attempts(self.max_attempts)
            .timeout(self.timeout_secs.map(Duration::from_secs)))
    }
}

impl ConsensusConfig {
    pub fn consensus(&self) -> Result<Consensus> {
        self.default.parse()
    }
}

impl Config {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mining.difficulty == 0 || self.mining.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "mining.difficulty must be in 1..={}, got {}",
                MAX_DIFFICULTY, self.mining.difficulty
            )));
        }
        if self.mining.batch_size == 0 {
            return Err(ChainError::ConfigError(
                "mining.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.mining.max_attempts < self.mining.batch_size {
            return Err(ChainError::ConfigError(format!(
                "mining.max_attempts ({}) must be at least mining.batch_size ({})",
                self.mining.max_attempts, self.mining.batch_size
            )));
        }
        if self.staking.max_stake == 0 {
            return Err(ChainError::ConfigError(
                "staking.max_stake must be greater than zero".to_string(),
            ));
        }
        self.consensus
            .consensus()
            .map_err(|e| ChainError::ConfigError(format!("consensus.default: {}", e)))?;
        Ok(())
    }

    /// Replaces `mining.difficulty` when a command-line value was given and
    /// revalidates. `None` keeps whatever the file or defaults set.
    pub fn override_difficulty(&mut self, difficulty: Option<usize>) -> Result<()> {
        if let Some(difficulty) = difficulty {
            self.mining.difficulty = difficulty;
            self.validate()?;
        }
        Ok(())
    }
}

/// Loads `path`, falling back to defaults when the file is absent or empty.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Config::from_toml_str(&config_str)
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_batch_size() -> u64 {
    NONCE_BATCH_SIZE
}

fn default_max_attempts() -> u64 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_max_stake() -> u64 {
    MAX_STAKE_AMOUNT
}

fn default_consensus() -> String {
    "pow".to_string()
}
