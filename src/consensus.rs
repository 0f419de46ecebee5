//! Consensus strategies
//!
//! A block's nonce is settled either by a proof-of-work search
//! ([`pow::PowValidator`]) or by a stake-weighted validator draw
//! ([`pos::PosValidator`]). Callers pick one through the closed
//! [`Consensus`] enum; free-form selector strings are parsed once at the
//! boundary.

pub mod pos;
pub mod pow;

pub use pos::PosValidator;
pub use pow::PowValidator;

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consensus {
    ProofOfWork,
    ProofOfStake,
}

impl FromStr for Consensus {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pow" => Ok(Consensus::ProofOfWork),
            "pos" => Ok(Consensus::ProofOfStake),
            _ => Err(ChainError::UnsupportedConsensus(s.to_string())),
        }
    }
}

impl fmt::Display for Consensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consensus::ProofOfWork => write!(f, "pow"),
            Consensus::ProofOfStake => write!(f, "pos"),
        }
    }
}

/// Settles a candidate block's nonce, returning the updated block.
pub trait NonceStrategy {
    fn determine_nonce(&self, block: Block, rng: &mut dyn RngCore) -> Result<Block>;
}
