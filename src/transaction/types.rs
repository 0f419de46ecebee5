/// Transaction types for DualChain
use crate::crypto::KeyPair;
use sha2::{Digest, Sha256};

/// A signed transfer record.
///
/// Fields are private: a transaction cannot change after construction, so its
/// signature stays bound to exactly what was signed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    sender: Vec<u8>,
    receiver: Vec<u8>,
    amount: u64,
    signature: Vec<u8>,
    timestamp: f64,
}

impl Transaction {
    pub fn new(
        sender: Vec<u8>,
        receiver: Vec<u8>,
        amount: u64,
        signature: Vec<u8>,
        timestamp: f64,
    ) -> Self {
        Transaction {
            sender,
            receiver,
            amount,
            signature,
            timestamp,
        }
    }

    /// Builds a transaction signed by `keypair` over [`Transaction::signable_message`].
    pub fn new_signed(keypair: &KeyPair, receiver: Vec<u8>, amount: u64, timestamp: f64) -> Self {
        let signature = keypair.sign(&Self::signable_message(&receiver, amount));
        Transaction::new(
            keypair.public_key_bytes().to_vec(),
            receiver,
            amount,
            signature.to_vec(),
            timestamp,
        )
    }

    /// `receiver || amount`, with the amount in base-10 text.
    pub fn signable_message(receiver: &[u8], amount: u64) -> Vec<u8> {
        let mut message = Vec::with_capacity(receiver.len() + 20);
        message.extend_from_slice(receiver);
        message.extend_from_slice(amount.to_string().as_bytes());
        message
    }

    pub fn sender(&self) -> &[u8] {
        &self.sender
    }

    pub fn receiver(&self) -> &[u8] {
        &self.receiver
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Calculate the hash of this transaction
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.sender);
        hasher.update(&self.receiver);
        hasher.update(self.amount.to_le_bytes());
        hasher.update(&self.signature);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }
}
