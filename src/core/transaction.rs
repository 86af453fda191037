// A transaction is an immutable value-transfer record between two addresses.
// The id is a hash of the unsigned content, and the signature covers that
// same content, so neither survives tampering with any field.

use crate::core::consensus::COINBASE_FROM;
use crate::error::Result;
use crate::utils::{current_timestamp, ecdsa_p256_sha256_verify, hex_decode, hex_encode, sha256_hex};
use crate::wallet::KeyProvider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    from: String,
    to: String,
    amount: i64,
    timestamp: i64,
    signature: Option<String>,
    id: String,
}

impl Transaction {
    /// Create and sign a transaction from the wallet's key pair. The sender
    /// address is the signer's hex-encoded SPKI public key.
    pub fn new_signed(keys: &dyn KeyProvider, to: &str, amount: i64) -> Result<Transaction> {
        let from = keys.public_key_hex();
        let timestamp = current_timestamp()?;
        let content = unsigned_content(&from, to, amount, timestamp);
        let signature = keys.sign(content.as_bytes())?;

        Ok(Transaction {
            id: sha256_hex(content.as_bytes()),
            from,
            to: to.to_string(),
            amount,
            timestamp,
            signature: Some(hex_encode(&signature)),
        })
    }

    /// Create a coinbase transaction issuing the block reward to the miner.
    pub fn new_coinbase(to: &str, amount: i64) -> Result<Transaction> {
        let timestamp = current_timestamp()?;
        Ok(Self::from_parts(
            COINBASE_FROM,
            to,
            amount,
            timestamp,
            None,
        ))
    }

    /// Assemble a transaction from raw fields, computing the id. The genesis
    /// transaction and tests are built through this.
    pub fn from_parts(
        from: &str,
        to: &str,
        amount: i64,
        timestamp: i64,
        signature: Option<String>,
    ) -> Transaction {
        let content = unsigned_content(from, to, amount, timestamp);
        Transaction {
            id: sha256_hex(content.as_bytes()),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp,
            signature,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.from == COINBASE_FROM
    }

    /// Check the transaction's cryptographic integrity: the id must match the
    /// unsigned content, and for user transactions the signature must verify
    /// against the public key encoded in `from`. Coinbases carry no signature
    /// and are bounded later by the block-level reward check.
    pub fn validate_signature(&self) -> bool {
        let content = self.unsigned_content();
        if self.id != sha256_hex(content.as_bytes()) {
            return false;
        }

        if self.is_coinbase() {
            return self.amount >= 0;
        }

        if self.amount <= 0 {
            return false;
        }

        let signature_hex = match &self.signature {
            Some(signature) => signature,
            None => return false,
        };
        let signature = match hex_decode(signature_hex) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        ecdsa_p256_sha256_verify(&self.from, content.as_bytes(), &signature)
    }

    pub fn unsigned_content(&self) -> String {
        unsigned_content(&self.from, &self.to, self.amount, self.timestamp)
    }

    pub fn from_addr(&self) -> &str {
        &self.from
    }

    pub fn to_addr(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

fn unsigned_content(from: &str, to: &str, amount: i64, timestamp: i64) -> String {
    format!("{from}{to}{amount}{timestamp}")
}
