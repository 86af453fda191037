use crate::core::consensus::COINBASE_FROM;
use crate::core::{merkle, Transaction};
use crate::error::{NodeError, Result};
use crate::utils::sha256_hex;
use serde::{Deserialize, Serialize};

/// Previous-hash sentinel of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A block is an immutable header plus an ordered transaction list. The hash
/// is never stored: it is recomputed from the header fields on every read,
/// which removes any possibility of a stored/recomputed mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    timestamp: i64,
    previous_hash: String,
    transactions: Vec<Transaction>,
    merkle_root: String,
    nonce: u64,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: i64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        nonce: u64,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(NodeError::InvalidBlock(
                "Block must contain at least one transaction".to_string(),
            ));
        }

        let merkle_root = Self::merkle_root_of(&transactions);

        Ok(Block {
            index,
            timestamp,
            previous_hash,
            transactions,
            merkle_root,
            nonce,
        })
    }

    /// The deterministic genesis block shared by every node. Anything about
    /// it changes and the node forks off the network.
    pub fn genesis() -> Block {
        let transaction = Transaction::from_parts(COINBASE_FROM, "genesis", 0, 0, None);
        let merkle_root = merkle::compute_root(&[transaction.id().to_string()]);
        Block {
            index: 0,
            timestamp: 0,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            transactions: vec![transaction],
            merkle_root,
            nonce: 0,
        }
    }

    /// The canonical header string: UTF-8 concatenation of the fields in
    /// consensus order. Both hashing and mining go through this layout.
    pub fn header_string(
        index: u64,
        timestamp: i64,
        previous_hash: &str,
        merkle_root: &str,
        nonce: u64,
    ) -> String {
        format!("{index}{timestamp}{previous_hash}{merkle_root}{nonce}")
    }

    /// Recompute this block's hash from its header fields.
    pub fn hash(&self) -> String {
        let header = Self::header_string(
            self.index,
            self.timestamp,
            &self.previous_hash,
            &self.merkle_root,
            self.nonce,
        );
        sha256_hex(header.as_bytes())
    }

    pub fn merkle_root_of(transactions: &[Transaction]) -> String {
        let ids: Vec<String> = transactions
            .iter()
            .map(|tx| tx.id().to_string())
            .collect();
        merkle::compute_root(&ids)
    }

    /// Check that the stored merkle root matches the transaction list.
    pub fn verify_merkle_root(&self) -> bool {
        Self::merkle_root_of(&self.transactions) == self.merkle_root
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}
