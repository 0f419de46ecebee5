use super::block::Block;
use super::metrics::ChainMetrics;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, MAX_STAKE_AMOUNT};
use crate::consensus::{Consensus, NonceStrategy, PosValidator, PowValidator};
use crate::error::{ChainError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// The in-process ledger.
///
/// `chain[i].index() == i` and `chain[i].prev_hash() == chain[i - 1].hash()`
/// hold after every successful append. Blocks are addressed by position, so
/// lookups need no cache.
pub struct Blockchain {
    chain: Vec<Block>,
    pow_validator: PowValidator,
    pos_validator: PosValidator,
    metrics: ChainMetrics,
    max_stake: u64,
    default_consensus: Consensus,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl Blockchain {
    /// A chain on the system clock with OS-seeded randomness.
    pub fn new() -> Result<Self> {
        Self::assemble(
            PowValidator::new(),
            MAX_STAKE_AMOUNT,
            Arc::new(SystemClock),
            StdRng::from_entropy(),
        )
    }

    /// A reproducible chain: fixed clock source and RNG seed.
    pub fn with_clock_and_seed(clock: Arc<dyn Clock>, seed: u64) -> Result<Self> {
        Self::assemble(
            PowValidator::new(),
            MAX_STAKE_AMOUNT,
            clock,
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with(config, Arc::new(SystemClock), StdRng::from_entropy())
    }

    pub fn from_config_with(config: &Config, clock: Arc<dyn Clock>, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let mut chain = Self::assemble(
            config.mining.pow_validator()?,
            config.staking.max_stake,
            clock,
            rng,
        )?;
        chain.default_consensus = config.consensus.consensus()?;
        Ok(chain)
    }

    /// Replaces the proof-of-work settings.
    pub fn with_pow_validator(mut self, pow_validator: PowValidator) -> Self {
        self.pow_validator = pow_validator;
        self
    }

    fn assemble(
        pow_validator: PowValidator,
        max_stake: u64,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Result<Self> {
        let genesis = Self::create_genesis_block(clock.as_ref())?;
        Ok(Blockchain {
            chain: vec![genesis],
            pow_validator,
            pos_validator: PosValidator::new(clock.clone()),
            metrics: ChainMetrics::new(),
            max_stake,
            default_consensus: Consensus::ProofOfWork,
            clock,
            rng,
        })
    }

    pub fn create_genesis_block(clock: &dyn Clock) -> Result<Block> {
        Block::genesis(clock.now())
    }

    /// Validates, settles the nonce and appends `block`.
    ///
    /// The candidate's `prev_hash` is provisional: it is overwritten with the
    /// current tip hash before the nonce is settled, so a proof-of-work hash
    /// always commits to the real parent. On any error the chain is left
    /// untouched.
    pub async fn add_block(&mut self, mut block: Block, consensus: Consensus) -> Result<()> {
        let started = Instant::now();

        let expected_index = self.chain.len() as u64;
        if block.index() != expected_index {
            return Err(ChainError::InvalidBlock(format!(
                "Invalid block index. Expected {}, but got {}.",
                expected_index,
                block.index()
            )));
        }

        for (i, tx) in block.transactions().iter().enumerate() {
            if !tx.validate() {
                warn!(index = block.index(), tx = %tx.hash_str(), "rejecting block with invalid transaction");
                return Err(ChainError::InvalidTransaction(format!(
                    "Transaction {} ({}) has an invalid signature",
                    i,
                    tx.hash_str()
                )));
            }
        }

        let tip_hash = self.tip().hash();
        if block.prev_hash() != tip_hash {
            warn!(
                index = block.index(),
                supplied = %hex::encode(block.prev_hash()),
                tip = %hex::encode(tip_hash),
                "relinking stale candidate to current tip"
            );
        }
        block.set_prev_hash(tip_hash);

        let block = match consensus {
            Consensus::ProofOfWork => {
                // Mining is CPU bound: run it off the async workers on a block
                // nobody else holds.
                let pow = self.pow_validator.clone();
                let mut rng = StdRng::seed_from_u64(self.rng.gen());
                tokio::task::spawn_blocking(move || pow.determine_nonce(block, &mut rng)).await??
            }
            Consensus::ProofOfStake => self.pos_validator.determine_nonce(block, &mut self.rng)?,
        };

        let tx_count = block.transactions().len();
        info!(
            index = block.index(),
            hash = %block.hash_hex(),
            nonce = block.nonce(),
            txs = tx_count,
            %consensus,
            "block appended"
        );
        self.chain.push(block);
        self.metrics.record(started.elapsed(), tx_count);
        Ok(())
    }

    /// Appends with the configured default consensus.
    pub async fn append(&mut self, block: Block) -> Result<()> {
        let consensus = self.default_consensus;
        self.add_block(block, consensus).await
    }

    /// Parses `selector` (`"pow"` or `"pos"`) and appends via [`Blockchain::add_block`].
    pub async fn submit_block(&mut self, block: Block, selector: &str) -> Result<()> {
        let consensus: Consensus = selector.parse()?;
        self.add_block(block, consensus).await
    }

    pub fn get_block(&self, index: u64) -> Result<&Block> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.chain.get(i))
            .ok_or(ChainError::BlockNotFound(index))
    }

    /// Stakes `amount` for `validator`. The validator's cumulative stake
    /// may not exceed the ceiling; `max` in the error is the remaining room.
    pub fn stake(&mut self, validator: &[u8], amount: u64) -> Result<()> {
        let current = self.get_stake(validator);
        if current.saturating_add(amount) > self.max_stake {
            return Err(ChainError::OverflowGuard {
                amount,
                max: self.max_stake.saturating_sub(current),
            });
        }
        self.pos_validator.add_stake(validator, amount)
    }

    /// Staked amount, 0 for unknown validators.
    pub fn get_stake(&self, validator: &[u8]) -> u64 {
        self.pos_validator.stake_of(validator)
    }

    /// Re-checks indices, linkage, stored hashes and every transaction.
    pub fn is_valid_chain(&self) -> bool {
        self.chain.iter().enumerate().all(|(i, block)| {
            let linked = match i {
                0 => block.prev_hash() == super::block::ZERO_HASH,
                _ => block.prev_hash() == self.chain[i - 1].hash(),
            };
            linked
                && block.index() == i as u64
                && block.hash() == block.calculate_hash()
                && block.transactions().iter().all(|tx| tx.validate())
        })
    }

    pub fn tip(&self) -> &Block {
        // The genesis block is pushed at construction and never removed.
        &self.chain[self.chain.len() - 1]
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: a chain starts with its genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    pub fn default_consensus(&self) -> Consensus {
        self.default_consensus
    }

    pub fn pow_validator(&self) -> &PowValidator {
        &self.pow_validator
    }

    pub fn pos_validator(&self) -> &PosValidator {
        &self.pos_validator
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
