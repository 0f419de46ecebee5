//! Error types for DualChain

/// Every rejected ledger operation surfaces as one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Unsupported consensus mechanism: {0}")]
    UnsupportedConsensus(String),

    #[error("Validator registry is empty")]
    EmptyRegistry,

    #[error("Failed to select a validator")]
    SelectionFailed,

    #[error("Validator not found: {0}")]
    ValidatorNotFound(String),

    #[error("Stake amount {amount} exceeds remaining allowance {max}")]
    OverflowGuard { amount: u64, max: u64 },

    #[error("No valid nonce found after {attempts} attempts")]
    NonceNotFound { attempts: u64 },

    #[error("Block not found at index {0}")]
    BlockNotFound(u64),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ChainError {
    fn from(err: tokio::task::JoinError) -> Self {
        ChainError::TaskFailed(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
