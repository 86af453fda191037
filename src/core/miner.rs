// The miner assembles a block template from the chain tip and the mempool,
// searches nonces until the difficulty target is met, and hands the result
// back through the chain's own validation. The nonce loop is the node's hot
// path: it reuses one header buffer and checks the target on raw digest
// bytes, so nothing allocates per attempt.

use crate::core::{consensus, Block, Chain, Transaction};
use crate::error::{NodeError, Result};
use crate::node::NodeCoordinator;
use crate::storage::MemoryPool;
use crate::utils::{current_timestamp, sha256_digest};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on mempool transactions taken into one block template.
pub const MAX_TEMPLATE_TRANSACTIONS: usize = 100;

/// Nonce attempts between cooperative yields and cancellation checks.
const YIELD_INTERVAL: u64 = 10_000;

/// Pause before retrying after a failed mining attempt.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Cloneable cooperative cancellation signal. Every clone observes the same
/// flag; the mining loop checks it at each yield point.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }
}

pub struct Miner {
    chain: Arc<Mutex<Chain>>,
    mempool: Arc<MemoryPool>,
    reward_address: String,
    cancel: CancelToken,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Miner {
    pub fn new(chain: Arc<Mutex<Chain>>, mempool: Arc<MemoryPool>, reward_address: &str) -> Miner {
        Miner {
            chain,
            mempool,
            reward_address: reward_address.to_string(),
            cancel: CancelToken::new(),
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    /// Produce one block: template from the current tip and mempool, PoW
    /// search, then append through the chain's validators.
    ///
    /// Fails with `StaleTemplate` when another block won the tip while we
    /// were searching, `AppendRejected` when the re-validated append fails,
    /// and `Cancelled` when the token fires at a yield point. A token fired
    /// after the nonce is found does not abort the append: a solved block is
    /// never half-applied.
    pub fn mine_one(&self, cancel: &CancelToken) -> Result<Block> {
        let pending = self.mempool.snapshot(MAX_TEMPLATE_TRANSACTIONS);

        let (index, previous_hash, mut balances) = {
            let chain = self
                .chain
                .lock()
                .expect("Failed to acquire chain lock - this should never happen");
            let tip = chain.latest();

            // Confirmed balances for every sender in the snapshot, read
            // under the same lock as the tip so the template is consistent.
            let mut balances: HashMap<String, i64> = HashMap::new();
            for tx in &pending {
                balances
                    .entry(tx.from_addr().to_string())
                    .or_insert_with(|| chain.balance_of(tx.from_addr()));
            }

            (tip.index() + 1, tip.hash(), balances)
        };

        let coinbase =
            Transaction::new_coinbase(&self.reward_address, consensus::reward_for(index))?;
        if let Some(balance) = balances.get_mut(coinbase.to_addr()) {
            *balance += coinbase.amount();
        }

        // Drop snapshot entries the chain would reject anyway, replaying the
        // same in-block credit rule the block validators apply. An admitted
        // transaction can have gone stale here, e.g. after a chain
        // replacement shrank its sender's balance.
        let mut transactions = Vec::with_capacity(pending.len() + 1);
        transactions.push(coinbase);
        for tx in pending {
            match balances.get_mut(tx.from_addr()) {
                Some(available) if tx.amount() <= *available => {
                    *available -= tx.amount();
                    if let Some(recipient) = balances.get_mut(tx.to_addr()) {
                        *recipient += tx.amount();
                    }
                    transactions.push(tx);
                }
                _ => {
                    debug!("Leaving transaction {} out of template: overdraft", tx.id());
                }
            }
        }

        let merkle_root = Block::merkle_root_of(&transactions);
        let timestamp = current_timestamp()?;
        let difficulty = consensus::required_difficulty();

        // Header prefix is fixed for the whole search; only the trailing
        // nonce digits change between attempts.
        let mut header = String::with_capacity(previous_hash.len() + merkle_root.len() + 64);
        let _ = write!(header, "{index}{timestamp}{previous_hash}{merkle_root}");
        let prefix_len = header.len();

        let mut nonce: u64 = 0;
        loop {
            header.truncate(prefix_len);
            let _ = write!(header, "{nonce}");

            let digest = sha256_digest(header.as_bytes());
            if consensus::digest_meets_difficulty(&digest, difficulty) {
                break;
            }

            nonce += 1;
            if nonce % YIELD_INTERVAL == 0 {
                if cancel.is_cancelled() {
                    return Err(NodeError::Cancelled);
                }
                thread::yield_now();
            }
        }

        let block = Block::new(index, timestamp, previous_hash.clone(), transactions, nonce)?;

        {
            let mut chain = self
                .chain
                .lock()
                .expect("Failed to acquire chain lock - this should never happen");
            if chain.latest().hash() != previous_hash {
                return Err(NodeError::StaleTemplate);
            }
            if !chain.append(block.clone()) {
                return Err(NodeError::AppendRejected);
            }
        }

        // Best-effort: a transaction that slipped back in is filtered again
        // at the next template.
        self.mempool.remove_confirmed(block.transactions());

        Ok(block)
    }

    /// Spawn the continuous mining loop. Idempotent: a second call while the
    /// loop is alive does nothing.
    pub fn start(miner: Arc<Miner>, coordinator: Arc<NodeCoordinator>) {
        if miner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        miner.cancel.reset();

        let worker_miner = Arc::clone(&miner);
        let handle = thread::spawn(move || {
            info!("Mining loop started for {}", worker_miner.reward_address);
            loop {
                if worker_miner.cancel.is_cancelled() {
                    break;
                }
                match coordinator.mine_block(&worker_miner.cancel) {
                    Ok(block) => {
                        info!("Mined block {} at height {}", block.hash(), block.index());
                    }
                    Err(NodeError::Cancelled) => break,
                    Err(NodeError::StaleTemplate) => {
                        // Someone else extended the tip first; take a breath
                        // and build on the new tip.
                        thread::sleep(RETRY_DELAY);
                    }
                    Err(e) => {
                        warn!("Mining attempt failed: {e}");
                        thread::sleep(RETRY_DELAY);
                    }
                }
            }
            info!("Mining loop stopped");
            worker_miner.running.store(false, Ordering::SeqCst);
        });

        *miner
            .worker
            .lock()
            .expect("Failed to acquire miner worker lock - this should never happen") =
            Some(handle);
    }

    /// Signal cancellation and detach; the loop exits at its next check.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Signal cancellation and wait for the mining thread to exit.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .worker
            .lock()
            .expect("Failed to acquire miner worker lock - this should never happen")
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Mining thread panicked before shutdown");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
