//! Error types for HashLedger

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// An operation was attempted before the state it depends on exists.
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error("Chain is empty; seed a genesis block first")]
    EmptyChain,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
    #[error("Proof-of-work search was cancelled")]
    Cancelled,
    /// The background search ended without delivering a proof.
    #[error("Mining error: {0}")]
    Mining(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LedgerError::Precondition("no last block".to_string()).to_string(),
            "Precondition failed: no last block"
        );
        assert_eq!(
            LedgerError::EmptyChain.to_string(),
            "Chain is empty; seed a genesis block first"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LedgerError = io.into();
        assert!(matches!(err, LedgerError::Io(msg) if msg.contains("missing")));
    }
}
