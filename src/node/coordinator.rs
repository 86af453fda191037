// The coordinator is the only component that mutates the chain or persists
// it. Every chain mutation runs under one exclusive lock; persistence and
// broadcasts happen after the lock is released so no I/O is ever done while
// holding it. The memory pool lock is never taken while the chain lock is
// held, which keeps the lock ordering acyclic.

use crate::core::{Block, CancelToken, Chain, Miner, Transaction};
use crate::error::Result;
use crate::network::Transport;
use crate::storage::{ChainStore, MemoryPool};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};

pub struct NodeCoordinator {
    chain: Arc<Mutex<Chain>>,
    mempool: Arc<MemoryPool>,
    miner: Arc<Miner>,
    store: Arc<dyn ChainStore>,
    transport: Arc<dyn Transport>,
}

impl NodeCoordinator {
    pub fn new(
        chain: Arc<Mutex<Chain>>,
        mempool: Arc<MemoryPool>,
        miner: Arc<Miner>,
        store: Arc<dyn ChainStore>,
        transport: Arc<dyn Transport>,
    ) -> NodeCoordinator {
        NodeCoordinator {
            chain,
            mempool,
            miner,
            store,
            transport,
        }
    }

    /// Snapshot of the full chain.
    pub fn get_chain(&self) -> Vec<Block> {
        self.lock_chain().blocks().to_vec()
    }

    /// Snapshot of the tip block.
    pub fn get_latest(&self) -> Block {
        self.lock_chain().latest().clone()
    }

    /// Confirmed balance, replayed over the chain under the lock.
    pub fn get_balance(&self, address: &str) -> i64 {
        self.lock_chain().balance_of(address)
    }

    /// Admit a client transaction into the mempool and gossip it on
    /// success. The balance pre-check sees the chain through a closure so
    /// the pool itself stays chain-free.
    pub fn submit_transaction(&self, tx: Transaction) -> bool {
        let admitted = self
            .mempool
            .add(tx.clone(), |address| self.get_balance(address));
        if admitted {
            info!("Admitted transaction {} into mempool", tx.id());
            self.broadcast_transaction(&tx);
        }
        admitted
    }

    /// Mine one block, then persist and announce it.
    pub fn mine_block(&self, cancel: &CancelToken) -> Result<Block> {
        let block = self.miner.mine_one(cancel)?;
        info!(
            "Appended mined block {} at height {} with {} transactions",
            block.hash(),
            block.index(),
            block.transactions().len()
        );
        self.persist();
        self.broadcast_block(&block);
        Ok(block)
    }

    /// Try to append a block received from a peer. On success the block's
    /// transactions leave the mempool and the chain is persisted. On
    /// failure the caller may ask the sender for its full chain, since a
    /// rejection can mean we are behind.
    pub fn try_accept_block(&self, block: Block) -> bool {
        let accepted = self.lock_chain().append(block.clone());
        if accepted {
            info!("Accepted block {} at height {}", block.hash(), block.index());
            self.mempool.remove_confirmed(block.transactions());
            self.persist();
        }
        accepted
    }

    /// Longest-chain rule: adopt a remote chain only if it validates and is
    /// strictly longer than ours. Ties go to the local chain so two nodes
    /// never oscillate. Tolerates unordered input.
    pub fn try_replace_chain(&self, mut remote: Vec<Block>) -> bool {
        remote.sort_by_key(|b| b.index());

        if remote.is_empty() || !Chain::is_valid_chain(&remote) {
            warn!("Rejected remote chain: failed validation");
            return false;
        }

        let replaced = {
            let mut chain = self.lock_chain();
            if remote.len() > chain.len() {
                chain.replace(remote);
                true
            } else {
                false
            }
        };

        if replaced {
            info!(
                "Replaced local chain; new height is {}",
                self.get_latest().index()
            );
            self.persist();
        }
        replaced
    }

    /// Adopt the persisted chain at startup, if there is one and it still
    /// validates. Anything unusable is ignored and the node starts from
    /// genesis.
    pub fn initialize_from_store(&self) {
        match self.store.load() {
            Ok(blocks) if !blocks.is_empty() && Chain::is_valid_chain(&blocks) => {
                info!("Loaded persisted chain of {} blocks", blocks.len());
                self.lock_chain().replace(blocks);
            }
            Ok(blocks) if !blocks.is_empty() => {
                warn!("Ignoring persisted chain: failed validation");
            }
            Ok(_) => {
                info!("No persisted chain; starting from genesis");
            }
            Err(e) => {
                warn!("Failed to load persisted chain: {e}");
            }
        }
    }

    pub fn broadcast_block(&self, block: &Block) {
        if let Err(e) = self.transport.broadcast_block(block) {
            error!("Failed to broadcast block {}: {e}", block.hash());
        }
    }

    pub fn broadcast_transaction(&self, tx: &Transaction) {
        if let Err(e) = self.transport.broadcast_transaction(tx) {
            error!("Failed to broadcast transaction {}: {e}", tx.id());
        }
    }

    pub fn request_chain_from(&self, peer: &str) -> Result<()> {
        self.transport.request_chain(peer)
    }

    /// Inbound hook: a peer announced a block. A rejected announcement
    /// triggers a chain request back to the sender; the reply flows into
    /// `handle_chain`.
    pub fn handle_block(&self, peer: &str, block: Block) {
        if !self.try_accept_block(block) {
            info!("Rejected block from {peer}; requesting their chain");
            if let Err(e) = self.request_chain_from(peer) {
                error!("Failed to request chain from {peer}: {e}");
            }
        }
    }

    /// Inbound hook: a transaction arrived, from a client or relayed by a
    /// peer. Fresh admissions are re-gossiped; the duplicate check stops
    /// the flood.
    pub fn handle_transaction(&self, tx: Transaction) -> bool {
        self.submit_transaction(tx)
    }

    /// Inbound hook: a peer sent its full chain.
    pub fn handle_chain(&self, blocks: Vec<Block>) -> bool {
        self.try_replace_chain(blocks)
    }

    /// Inbound hook: a peer asked for our chain.
    pub fn handle_chain_request(&self) -> Vec<Block> {
        self.get_chain()
    }

    /// Start the continuous mining loop. Idempotent.
    pub fn start_mining(self: Arc<Self>) {
        Miner::start(Arc::clone(&self.miner), self);
    }

    /// Signal the mining loop to stop without waiting for it.
    pub fn stop_mining(&self) {
        self.miner.stop();
    }

    /// Signal cancellation and wait for the mining task to exit.
    pub fn shutdown(&self) {
        self.miner.shutdown();
    }

    fn lock_chain(&self) -> std::sync::MutexGuard<'_, Chain> {
        self.chain
            .lock()
            .expect("Failed to acquire chain lock - this should never happen")
    }

    /// Persist a snapshot taken under the lock; the write itself happens
    /// outside it. Failures are logged and the in-memory chain remains
    /// authoritative; the next mutation retries.
    fn persist(&self) {
        let snapshot = self.get_chain();
        if let Err(e) = self.store.save(&snapshot) {
            error!("Failed to persist chain: {e}");
        }
    }
}
