//! Test utilities shared by the unit tests

use crate::core::consensus::{digest_meets_difficulty, required_difficulty, COINBASE_FROM};
use crate::core::{Block, Chain, Miner, Transaction};
use crate::error::Result;
use crate::network::Transport;
use crate::node::NodeCoordinator;
use crate::storage::{ChainStore, MemoryPool, MemoryStore};
use crate::utils::sha256_digest;
use crate::wallet::Wallet;
use std::sync::{Arc, Mutex};

/// Fixed timestamp so test blocks are deterministic for fixed inputs.
const TEST_TIMESTAMP: i64 = 1_700_000_000;

pub fn test_wallet() -> Wallet {
    Wallet::new().expect("test wallet generation should succeed")
}

pub fn test_coinbase(to: &str, amount: i64) -> Transaction {
    Transaction::from_parts(COINBASE_FROM, to, amount, 0, None)
}

/// Mine a block on top of `previous` at the configured difficulty.
pub fn mine_next_block(previous: &Block, transactions: Vec<Transaction>) -> Block {
    mine_block_at(previous.index() + 1, previous.hash(), transactions)
}

/// Mine a block with explicit header inputs. The nonce search is the same
/// one the miner runs, without the cooperative machinery.
pub fn mine_block_at(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Block {
    let merkle_root = Block::merkle_root_of(&transactions);
    let difficulty = required_difficulty();

    let mut nonce = 0u64;
    loop {
        let header =
            Block::header_string(index, TEST_TIMESTAMP, &previous_hash, &merkle_root, nonce);
        if digest_meets_difficulty(&sha256_digest(header.as_bytes()), difficulty) {
            break;
        }
        nonce += 1;
    }

    Block::new(index, TEST_TIMESTAMP, previous_hash, transactions, nonce)
        .expect("test block assembly should succeed")
}

/// Transport stub that records what would have been gossiped.
#[derive(Default)]
pub struct RecordingTransport {
    blocks: Mutex<Vec<String>>,
    transactions: Mutex<Vec<String>>,
    chain_requests: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> RecordingTransport {
        RecordingTransport::default()
    }

    pub fn broadcast_blocks(&self) -> Vec<String> {
        self.blocks.lock().unwrap().clone()
    }

    pub fn broadcast_transactions(&self) -> Vec<String> {
        self.transactions.lock().unwrap().clone()
    }

    pub fn chain_requests(&self) -> Vec<String> {
        self.chain_requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn broadcast_block(&self, block: &Block) -> Result<()> {
        self.blocks.lock().unwrap().push(block.hash());
        Ok(())
    }

    fn broadcast_transaction(&self, tx: &Transaction) -> Result<()> {
        self.transactions.lock().unwrap().push(tx.id().to_string());
        Ok(())
    }

    fn request_chain(&self, peer: &str) -> Result<()> {
        self.chain_requests.lock().unwrap().push(peer.to_string());
        Ok(())
    }
}

/// A coordinator over an in-memory store and a recording transport.
pub fn test_coordinator(reward_address: &str) -> (Arc<NodeCoordinator>, Arc<RecordingTransport>) {
    test_coordinator_with_store(reward_address, Arc::new(MemoryStore::new()))
}

pub fn test_coordinator_with_store(
    reward_address: &str,
    store: Arc<dyn ChainStore>,
) -> (Arc<NodeCoordinator>, Arc<RecordingTransport>) {
    let chain = Arc::new(Mutex::new(Chain::new()));
    let mempool = Arc::new(MemoryPool::new());
    let miner = Arc::new(Miner::new(
        Arc::clone(&chain),
        Arc::clone(&mempool),
        reward_address,
    ));
    let transport = Arc::new(RecordingTransport::new());

    let coordinator = Arc::new(NodeCoordinator::new(
        chain,
        mempool,
        miner,
        store,
        Arc::clone(&transport) as Arc<dyn Transport>,
    ));

    (coordinator, transport)
}
