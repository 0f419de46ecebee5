//! Transaction module split into types and validation

pub mod types;
pub mod validation;

pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyPair, SignatureVerifier};

    const RECEIVER: &[u8] = b"receiver_address";

    fn signed_tx(amount: u64) -> (KeyPair, Transaction) {
        let keypair = KeyPair::generate();
        let tx = Transaction::new_signed(&keypair, RECEIVER.to_vec(), amount, 1_700_000_000.0);
        (keypair, tx)
    }

    #[test]
    fn test_signed_transaction_validates() {
        let (_, tx) = signed_tx(100);
        assert!(tx.validate());
    }

    #[test]
    fn test_signable_message_is_receiver_then_decimal_amount() {
        assert_eq!(
            Transaction::signable_message(RECEIVER, 100),
            b"receiver_address100".to_vec()
        );
    }

    #[test]
    fn test_manually_signed_message_validates() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"receiver_address100");
        let tx = Transaction::new(
            keypair.public_key_bytes().to_vec(),
            RECEIVER.to_vec(),
            100,
            signature.to_vec(),
            0.0,
        );
        assert!(tx.validate());
    }

    #[test]
    fn test_every_signature_bit_flip_invalidates() {
        let (_, tx) = signed_tx(42);
        for byte in 0..tx.signature().len() {
            for bit in 0..8 {
                let mut signature = tx.signature().to_vec();
                signature[byte] ^= 1 << bit;
                let tampered = Transaction::new(
                    tx.sender().to_vec(),
                    tx.receiver().to_vec(),
                    tx.amount(),
                    signature,
                    tx.timestamp(),
                );
                assert!(!tampered.validate(), "flip at byte {} bit {}", byte, bit);
            }
        }
    }

    #[test]
    fn test_changed_amount_invalidates() {
        let (_, tx) = signed_tx(100);
        let forged = Transaction::new(
            tx.sender().to_vec(),
            tx.receiver().to_vec(),
            1_000,
            tx.signature().to_vec(),
            tx.timestamp(),
        );
        assert!(!forged.validate());
    }

    #[test]
    fn test_malformed_sender_key_is_invalid_not_fatal() {
        let (_, tx) = signed_tx(7);
        let garbage_key = Transaction::new(
            vec![0xde, 0xad],
            tx.receiver().to_vec(),
            tx.amount(),
            tx.signature().to_vec(),
            tx.timestamp(),
        );
        assert!(!garbage_key.validate());

        let empty_sig = Transaction::new(
            tx.sender().to_vec(),
            tx.receiver().to_vec(),
            tx.amount(),
            Vec::new(),
            tx.timestamp(),
        );
        assert!(!empty_sig.validate());
    }

    #[test]
    fn test_validate_with_custom_verifier() {
        struct AcceptAll;
        impl SignatureVerifier for AcceptAll {
            fn verify(&self, _: &[u8], _: &[u8], _: &[u8]) -> bool {
                true
            }
        }

        let tx = Transaction::new(vec![1], RECEIVER.to_vec(), 5, vec![2], 0.0);
        assert!(!tx.validate());
        assert!(tx.validate_with(&AcceptAll));
    }

    #[test]
    fn test_hash_depends_on_content() {
        let (keypair, tx) = signed_tx(100);
        let other = Transaction::new_signed(&keypair, RECEIVER.to_vec(), 101, tx.timestamp());
        assert_ne!(tx.hash(), other.hash());
        assert_eq!(tx.hash(), tx.clone().hash());
        assert_eq!(tx.hash_str().len(), 64);
    }
}
