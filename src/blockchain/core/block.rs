use crate::crypto::sha256;
use crate::error::ChainError;
use crate::transaction::Transaction;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

/// Parent hash of the genesis block.
pub const ZERO_HASH: Sha256Hash = [0u8; 32];

/// A block of transactions plus its chaining metadata.
///
/// The transaction list is frozen at construction. `nonce` and `prev_hash`
/// change only through setters, each of which recomputes `hash` before
/// returning. Deserialization goes through [`Block::new`] and rejects a
/// stored hash that does not match the recomputed one.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "StoredBlock")]
pub struct Block {
    index: u64,
    timestamp: f64,
    transactions: Box<[Transaction]>,
    prev_hash: Sha256Hash,
    nonce: u64,
    hash: Sha256Hash,
    /// Digest of `(index, timestamp, prev_hash)`, written at most once per
    /// value of `prev_hash`.
    #[serde(skip)]
    static_digest: OnceCell<Sha256Hash>,
}

#[derive(serde::Deserialize)]
struct StoredBlock {
    index: u64,
    timestamp: f64,
    transactions: Vec<Transaction>,
    prev_hash: Sha256Hash,
    nonce: u64,
    hash: Sha256Hash,
}

impl TryFrom<StoredBlock> for Block {
    type Error = ChainError;

    fn try_from(stored: StoredBlock) -> Result<Self, ChainError> {
        let block = Block::new(
            stored.index,
            stored.timestamp,
            stored.transactions,
            stored.prev_hash,
            stored.nonce,
        )?;
        if block.hash != stored.hash {
            return Err(ChainError::InvalidBlock(format!(
                "Stored hash {} does not match computed hash {}.",
                hex::encode(stored.hash),
                block.hash_hex()
            )));
        }
        Ok(block)
    }
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        prev_hash: Sha256Hash,
        nonce: u64,
    ) -> Result<Self, ChainError> {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(ChainError::InvalidArgument(format!(
                "Block timestamp must be a finite, non-negative number of seconds, got {}",
                timestamp
            )));
        }

        let mut block = Block {
            index,
            timestamp,
            transactions: transactions.into_boxed_slice(),
            prev_hash,
            nonce,
            hash: ZERO_HASH,
            static_digest: OnceCell::new(),
        };
        block.hash = block.calculate_hash();
        Ok(block)
    }

    /// Index 0, no transactions, zero parent hash.
    pub fn genesis(timestamp: f64) -> Result<Self, ChainError> {
        Block::new(0, timestamp, Vec::new(), ZERO_HASH, 0)
    }

    /// `SHA256(static_digest || "{nonce}{tx_count}")`.
    ///
    /// The static digest is computed on first use and reused afterwards, so
    /// mining attempts only hash the short dynamic suffix.
    pub fn calculate_hash(&self) -> Sha256Hash {
        let static_digest = self.static_digest.get_or_init(|| {
            let base = format!(
                "{}{}{}",
                self.index,
                self.timestamp,
                hex::encode(self.prev_hash)
            );
            sha256(base.as_bytes())
        });

        let dynamic = format!("{}{}", self.nonce, self.transactions.len());
        let mut hasher = Sha256::new();
        hasher.update(static_digest);
        hasher.update(dynamic.as_bytes());
        hasher.finalize().into()
    }

    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.hash = self.calculate_hash();
    }

    /// Relinks the block to a new parent. Drops the cached static digest.
    pub fn set_prev_hash(&mut self, prev_hash: Sha256Hash) {
        if self.prev_hash == prev_hash {
            return;
        }
        self.prev_hash = prev_hash;
        self.static_digest = OnceCell::new();
        self.hash = self.calculate_hash();
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn prev_hash(&self) -> Sha256Hash {
        self.prev_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> Sha256Hash {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Block(index={}, hash={}...)",
            self.index,
            &self.hash_hex()[..8]
        )
    }
}
