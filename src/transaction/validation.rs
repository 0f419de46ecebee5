use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use tracing::debug;

use super::types::Transaction;

impl Transaction {
    /// Checks the signature against `receiver || amount` under the sender key.
    ///
    /// Malformed keys and signatures yield `false`; nothing is propagated.
    pub fn validate(&self) -> bool {
        self.validate_with(&Secp256k1Verifier)
    }

    /// Same as [`Transaction::validate`] with a caller-supplied verifier.
    pub fn validate_with(&self, verifier: &dyn SignatureVerifier) -> bool {
        let message = Transaction::signable_message(self.receiver(), self.amount());
        let valid = verifier.verify(self.sender(), &message, self.signature());
        if !valid {
            debug!(tx = %self.hash_str(), "transaction signature did not verify");
        }
        valid
    }
}
