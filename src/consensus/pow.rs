//! Proof-of-work nonce search

use super::NonceStrategy;
use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use rand::{Rng, RngCore};
use std::time::{Duration, Instant};
use tracing::debug;

/// Leading zero bytes required by default.
pub const DEFAULT_DIFFICULTY: usize = 4;
/// Consecutive nonces tried from each random starting point.
pub const NONCE_BATCH_SIZE: u64 = 1000;
/// Total nonce trials before giving up; about 16x the expected work at the
/// default difficulty.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1 << 36;
/// A hash has 32 bytes; more leading zeros than that is unsatisfiable.
pub const MAX_DIFFICULTY: usize = 32;
/// Nonces tried between deadline checks, whatever the batch size.
pub const DEADLINE_CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone)]
pub struct PowValidator {
    difficulty: usize,
    batch_size: u64,
    max_attempts: u64,
    timeout: Option<Duration>,
}

impl Default for PowValidator {
    fn default() -> Self {
        PowValidator {
            difficulty: DEFAULT_DIFFICULTY,
            batch_size: NONCE_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: None,
        }
    }
}

impl PowValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_difficulty(difficulty: usize) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidArgument(format!(
                "Difficulty must be at most {} leading zero bytes, got {}",
                MAX_DIFFICULTY, difficulty
            )));
        }
        Ok(PowValidator {
            difficulty,
            ..Self::default()
        })
    }

    pub fn batch_size(mut self, batch_size: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(ChainError::InvalidArgument(
                "Nonce batch size must be greater than zero".to_string(),
            ));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Wall-clock budget for a single `mine` call, checked every
    /// [`DEADLINE_CHECK_INTERVAL`] nonces and at the end of each batch.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// True iff the first `difficulty` bytes of the block hash are zero.
    pub fn validate(&self, block: &Block) -> bool {
        block.hash()[..self.difficulty].iter().all(|b| *b == 0)
    }

    /// Searches batches of consecutive nonces from random starting points
    /// until the block hash satisfies the difficulty.
    ///
    /// Gives up with [`ChainError::NonceNotFound`] once `max_attempts`
    /// nonces have been tried or the timeout has elapsed.
    pub fn mine<R: Rng + ?Sized>(&self, mut block: Block, rng: &mut R) -> Result<Block> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut attempts = 0u64;

        while attempts < self.max_attempts {
            let start: u64 = rng.gen();
            let batch = self.batch_size.min(self.max_attempts - attempts);

            for offset in 0..batch {
                block.set_nonce(start.wrapping_add(offset));
                if self.validate(&block) {
                    debug!(
                        index = block.index(),
                        nonce = block.nonce(),
                        attempts = attempts + offset + 1,
                        "proof of work found"
                    );
                    return Ok(block);
                }
                if (offset + 1) % DEADLINE_CHECK_INTERVAL == 0 && Self::past(deadline) {
                    let attempts = attempts + offset + 1;
                    debug!(index = block.index(), attempts, "mining timed out");
                    return Err(ChainError::NonceNotFound { attempts });
                }
            }
            attempts += batch;

            if Self::past(deadline) {
                debug!(index = block.index(), attempts, "mining timed out");
                break;
            }
        }

        Err(ChainError::NonceNotFound { attempts })
    }

    fn past(deadline: Option<Instant>) -> bool {
        deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl NonceStrategy for PowValidator {
    fn determine_nonce(&self, block: Block, rng: &mut dyn RngCore) -> Result<Block> {
        self.mine(block, rng)
    }
}
