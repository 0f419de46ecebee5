//! Proof-of-stake validator registry and weighted selection

use super::NonceStrategy;
use crate::blockchain::Block;
use crate::clock::{Clock, SECONDS_PER_DAY};
use crate::crypto::sha256;
use crate::error::{ChainError, Result};
use rand::{Rng, RngCore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
struct StakeEntry {
    validator: Vec<u8>,
    amount: u64,
    /// Time of the most recent stake change, not the first.
    staked_at: f64,
}

/// Registry of validator stakes.
///
/// Amount and stake date live in one entry per validator, so a validator
/// can never have one without the other. Entries keep registration order.
pub struct PosValidator {
    entries: Vec<StakeEntry>,
    positions: HashMap<Vec<u8>, usize>,
    clock: Arc<dyn Clock>,
}

impl PosValidator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        PosValidator {
            entries: Vec::new(),
            positions: HashMap::new(),
            clock,
        }
    }

    /// Adds `amount` to the validator's stake and restarts its stake age.
    pub fn add_stake(&mut self, validator: &[u8], amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(ChainError::InvalidArgument(
                "Stake amount must be greater than zero".to_string(),
            ));
        }
        let now = self.clock.now();

        match self.positions.get(validator) {
            Some(&pos) => {
                let entry = &mut self.entries[pos];
                entry.amount =
                    entry
                        .amount
                        .checked_add(amount)
                        .ok_or(ChainError::OverflowGuard {
                            amount,
                            max: u64::MAX - entry.amount,
                        })?;
                entry.staked_at = now;
            }
            None => {
                self.positions.insert(validator.to_vec(), self.entries.len());
                self.entries.push(StakeEntry {
                    validator: validator.to_vec(),
                    amount,
                    staked_at: now,
                });
            }
        }

        debug!(validator = %hex::encode(validator), amount, "stake added");
        Ok(())
    }

    /// Staked amount, or 0 for an unknown validator.
    pub fn stake_of(&self, validator: &[u8]) -> u64 {
        self.entry(validator).map_or(0, |e| e.amount)
    }

    /// `stake * (1 + age_seconds / 86400)`.
    pub fn get_weighted_stake(&self, validator: &[u8]) -> Result<f64> {
        let entry = self
            .entry(validator)
            .ok_or_else(|| ChainError::ValidatorNotFound(hex::encode(validator)))?;
        Ok(Self::weight(entry, self.clock.now()))
    }

    pub fn total_weighted_stake(&self) -> f64 {
        let now = self.clock.now();
        self.entries.iter().map(|e| Self::weight(e, now)).sum()
    }

    /// Validators in registration order.
    pub fn validators(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|e| e.validator.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws a validator with probability proportional to weighted stake.
    ///
    /// Ties at the boundary go to the first validator, in registration
    /// order, whose running total reaches the draw.
    pub fn select_validator<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<u8>> {
        if self.entries.is_empty() {
            return Err(ChainError::EmptyRegistry);
        }

        // One reading of the clock for the whole draw.
        let now = self.clock.now();
        let weights: Vec<f64> = self.entries.iter().map(|e| Self::weight(e, now)).collect();
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ChainError::SelectionFailed);
        }

        let draw = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (entry, weight) in self.entries.iter().zip(&weights) {
            cumulative += weight;
            if cumulative >= draw {
                debug!(validator = %hex::encode(&entry.validator), draw, total, "validator selected");
                return Ok(entry.validator.clone());
            }
        }

        Err(ChainError::SelectionFailed)
    }

    fn entry(&self, validator: &[u8]) -> Option<&StakeEntry> {
        self.positions.get(validator).map(|&pos| &self.entries[pos])
    }

    fn weight(entry: &StakeEntry, now: f64) -> f64 {
        let age = (now - entry.staked_at).max(0.0);
        entry.amount as f64 * (1.0 + age / SECONDS_PER_DAY)
    }
}

/// Nonce attesting a block to `validator`: the first 8 bytes (little endian)
/// of SHA-256 over the validator address.
pub fn attestation_nonce(validator: &[u8]) -> u64 {
    let digest = sha256(validator);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(prefix)
}

impl NonceStrategy for PosValidator {
    fn determine_nonce(&self, mut block: Block, rng: &mut dyn RngCore) -> Result<Block> {
        let validator = self.select_validator(rng)?;
        block.set_nonce(attestation_nonce(&validator));
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ZERO_HASH;
    use crate::clock::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const START: f64 = 1_700_000_000.0;

    fn registry() -> (Arc<ManualClock>, PosValidator) {
        let clock = Arc::new(ManualClock::new(START));
        let pos = PosValidator::new(clock.clone());
        (clock, pos)
    }

    #[test]
    fn test_add_stake_is_additive() {
        let (_, mut pos) = registry();
        pos.add_stake(b"v1", 100).unwrap();
        pos.add_stake(b"v1", 50).unwrap();
        assert_eq!(pos.stake_of(b"v1"), 150);
        assert_eq!(pos.len(), 1);
    }

    #[test]
    fn test_zero_stake_rejected() {
        let (_, mut pos) = registry();
        let err = pos.add_stake(b"v1", 0).unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(_)));
        assert!(pos.is_empty());
    }

    #[test]
    fn test_stake_overflow_rejected() {
        let (_, mut pos) = registry();
        pos.add_stake(b"v1", u64::MAX - 1).unwrap();
        let err = pos.add_stake(b"v1", 2).unwrap_err();
        assert_eq!(err, ChainError::OverflowGuard { amount: 2, max: 1 });
        assert_eq!(pos.stake_of(b"v1"), u64::MAX - 1);
    }

    #[test]
    fn test_unknown_validator_lookup_fails() {
        let (_, pos) = registry();
        let err = pos.get_weighted_stake(b"ghost").unwrap_err();
        assert_eq!(err, ChainError::ValidatorNotFound(hex::encode(b"ghost")));
        assert_eq!(pos.stake_of(b"ghost"), 0);
    }

    #[test]
    fn test_weight_grows_one_stake_per_day() {
        let (clock, mut pos) = registry();
        pos.add_stake(b"v1", 100).unwrap();
        assert_eq!(pos.get_weighted_stake(b"v1").unwrap(), 100.0);

        clock.advance(SECONDS_PER_DAY);
        assert_eq!(pos.get_weighted_stake(b"v1").unwrap(), 200.0);

        clock.advance(SECONDS_PER_DAY / 2.0);
        assert_eq!(pos.get_weighted_stake(b"v1").unwrap(), 250.0);
    }

    #[test]
    fn test_additional_stake_resets_age() {
        let (clock, mut pos) = registry();
        pos.add_stake(b"v1", 100).unwrap();
        clock.advance(SECONDS_PER_DAY);
        pos.add_stake(b"v1", 100).unwrap();
        assert_eq!(pos.get_weighted_stake(b"v1").unwrap(), 200.0);
    }

    #[test]
    fn test_clock_going_backwards_does_not_shrink_stake() {
        let (clock, mut pos) = registry();
        pos.add_stake(b"v1", 100).unwrap();
        clock.set(START - 10_000.0);
        assert_eq!(pos.get_weighted_stake(b"v1").unwrap(), 100.0);
    }

    #[test]
    fn test_empty_registry_selection_fails() {
        let (_, pos) = registry();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            pos.select_validator(&mut rng).unwrap_err(),
            ChainError::EmptyRegistry
        );
    }

    #[test]
    fn test_single_validator_always_selected() {
        let (_, mut pos) = registry();
        pos.add_stake(b"only", 10).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(pos.select_validator(&mut rng).unwrap(), b"only".to_vec());
        }
    }

    #[test]
    fn test_selection_proportional_to_stake() {
        let (_, mut pos) = registry();
        pos.add_stake(b"validator_1", 100).unwrap();
        pos.add_stake(b"validator_2", 200).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let trials = 30_000;
        let picked_b = (0..trials)
            .filter(|_| pos.select_validator(&mut rng).unwrap() == b"validator_2".to_vec())
            .count();

        let ratio = picked_b as f64 / trials as f64;
        assert!((ratio - 2.0 / 3.0).abs() < 0.02, "ratio was {}", ratio);
    }

    #[test]
    fn test_stake_age_shifts_selection() {
        let (clock, mut pos) = registry();
        pos.add_stake(b"old", 100).unwrap();
        clock.advance(3.0 * SECONDS_PER_DAY);
        pos.add_stake(b"new", 100).unwrap();

        // old weighs 400, new weighs 100.
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 20_000;
        let picked_old = (0..trials)
            .filter(|_| pos.select_validator(&mut rng).unwrap() == b"old".to_vec())
            .count();
        let ratio = picked_old as f64 / trials as f64;
        assert!((ratio - 0.8).abs() < 0.02, "ratio was {}", ratio);
    }

    #[test]
    fn test_registration_order_preserved() {
        let (_, mut pos) = registry();
        for name in [&b"c"[..], b"a", b"b"] {
            pos.add_stake(name, 1).unwrap();
        }
        pos.add_stake(b"a", 1).unwrap();
        let order: Vec<&[u8]> = pos.validators().collect();
        assert_eq!(order, vec![&b"c"[..], b"a", b"b"]);
    }

    #[test]
    fn test_total_weighted_stake() {
        let (clock, mut pos) = registry();
        pos.add_stake(b"a", 100).unwrap();
        pos.add_stake(b"b", 200).unwrap();
        clock.advance(SECONDS_PER_DAY);
        assert_eq!(pos.total_weighted_stake(), 600.0);
    }

    #[test]
    fn test_determine_nonce_attests_selected_validator() {
        let (_, mut pos) = registry();
        pos.add_stake(b"validator_1", 1000).unwrap();
        let block = Block::new(1, START, Vec::new(), ZERO_HASH, 0).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let block = pos.determine_nonce(block, &mut rng).unwrap();
        assert_eq!(block.nonce(), attestation_nonce(b"validator_1"));
        assert_eq!(block.hash(), block.calculate_hash());
    }

    #[test]
    fn test_attestation_nonce_is_deterministic() {
        assert_eq!(attestation_nonce(b"v"), attestation_nonce(b"v"));
        assert_ne!(attestation_nonce(b"v"), attestation_nonce(b"w"));
    }
}
