//! Configuration management for HashLedger

use crate::blockchain::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    #[serde(default)]
    pub genesis: GenesisConfig,
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GenesisConfig {
    #[serde(default = "default_previous_hash")]
    pub previous_hash: String,
    #[serde(default = "default_proof")]
    pub proof: u64,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            previous_hash: default_previous_hash(),
            proof: default_proof(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_previous_hash() -> String {
    GENESIS_PREVIOUS_HASH.to_string()
}

fn default_proof() -> u64 {
    GENESIS_PROOF
}

fn default_threads() -> usize {
    1
}

fn default_filter() -> String {
    "info".to_string()
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: LedgerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.genesis.previous_hash.is_empty() {
            return Err(LedgerError::Config(
                "genesis.previous_hash must not be empty".to_string(),
            ));
        }
        if self.miner.threads == 0 {
            return Err(LedgerError::Config(
                "miner.threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LedgerConfig::default());
    }
    let config_str = fs::read_to_string(path)?;
    LedgerConfig::from_toml_str(&config_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.genesis.previous_hash, "1");
        assert_eq!(config.genesis.proof, 100);
        assert_eq!(config.miner.threads, 1);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nthreads = 4").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.miner.threads, 4);
        assert_eq!(config.genesis, GenesisConfig::default());
    }

    #[test]
    fn test_full_file() {
        let config = LedgerConfig::from_toml_str(
            r#"
            [genesis]
            previous_hash = "genesis"
            proof = 7

            [logging]
            filter = "hashledger=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.genesis.previous_hash, "genesis");
        assert_eq!(config.genesis.proof, 7);
        assert_eq!(config.logging.filter, "hashledger=debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            LedgerConfig::from_toml_str("[genesis]\nprevious_hash = \"\""),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("[miner]\nthreads = 0"),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            LedgerConfig::from_toml_str("not toml ["),
            Err(LedgerError::Config(_))
        ));
    }
}
