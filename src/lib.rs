//! DualChain - a minimal ledger with interchangeable proof-of-work and
//! proof-of-stake consensus
//!
//! # Architecture
//!
//! ## Ledger
//! - [`transaction`] - Signed transfer records
//! - [`blockchain`] - Blocks, the chain and its append protocol, metrics
//!
//! ## Consensus
//! - [`consensus`] - The `Consensus` selector, PoW nonce search, PoS registry
//!
//! ## Cryptography
//! - [`crypto`] - secp256k1 signatures and the verification capability
//!
//! ## Configuration & Utilities
//! - [`config`] - TOML configuration
//! - [`clock`] - Injectable time sources
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod consensus;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod clock;
pub mod config;
pub mod error;

pub use blockchain::{Block, Blockchain, ChainMetrics, Sha256Hash};
pub use consensus::{Consensus, NonceStrategy, PosValidator, PowValidator};
pub use error::{ChainError, Result};
pub use transaction::Transaction;
