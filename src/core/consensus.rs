// Pure consensus rules. Every function here is deterministic and
// side-effect free; any node that disagrees on one of them forks off the
// network. The constants are fixed at compile time for the same reason.

use crate::core::Block;
use std::collections::HashMap;

/// Block reward at height 0, halved every `HALVING_INTERVAL` blocks.
pub const INITIAL_BLOCK_REWARD: i64 = 50;

/// Number of blocks between reward halvings.
pub const HALVING_INTERVAL: u64 = 210_000;

/// Number of leading `'0'` hex characters a block hash must carry.
pub const DIFFICULTY: usize = 3;

/// Sender address of coinbase transactions.
pub const COINBASE_FROM: &str = "system";

/// Reward for the block at the given height. Saturates to zero once the
/// shift would exceed the word width.
pub fn reward_for(height: u64) -> i64 {
    let halvings = height / HALVING_INTERVAL;
    if halvings >= 64 {
        return 0;
    }
    INITIAL_BLOCK_REWARD >> halvings
}

/// The difficulty in force. Release builds always use the consensus
/// constant; debug builds honour the local-testing override so a private
/// test network can mine faster or slower.
pub fn required_difficulty() -> usize {
    if cfg!(debug_assertions) {
        if let Some(difficulty) = crate::config::GLOBAL_CONFIG.difficulty_override() {
            return difficulty;
        }
    }
    DIFFICULTY
}

/// The first transaction must be a coinbase within the reward schedule.
pub fn validate_coinbase(block: &Block) -> bool {
    match block.transactions().first() {
        Some(tx) => tx.from_addr() == COINBASE_FROM && tx.amount() <= reward_for(block.index()),
        None => false,
    }
}

/// Every transaction must pass its own integrity check: the id must match
/// the unsigned content, and a user transaction's signature must verify
/// against the key encoded in its sender address. Blocks arrive from
/// untrusted peers, so this runs on every append and chain validation; a
/// transfer nobody signed must never clear, however the balances work out.
pub fn validate_signatures(block: &Block) -> bool {
    block.transactions().iter().all(|tx| tx.validate_signature())
}

/// The block hash must start with the required number of `'0'` characters.
pub fn validate_difficulty(block: &Block) -> bool {
    let difficulty = required_difficulty();
    let hash = block.hash();
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Difficulty check on the raw digest, one nibble per hex character. The
/// mining loop uses this so it never hex-encodes a candidate that misses.
pub fn digest_meets_difficulty(digest: &[u8; 32], difficulty: usize) -> bool {
    if difficulty > 64 {
        return false;
    }
    let full_bytes = difficulty / 2;
    if digest[..full_bytes].iter().any(|&b| b != 0) {
        return false;
    }
    if difficulty % 2 == 1 && digest[full_bytes] >> 4 != 0 {
        return false;
    }
    true
}

/// Replay every transaction of `preceding` into a balance map, then apply
/// the block's transactions in order. Each user transaction must be covered
/// by the sender's running balance at the moment it is applied; earlier
/// transactions in the same block are visible to later ones.
///
/// Arithmetic is signed and never clamped. A replayed balance can go
/// negative mid-history; the rule only bites at a user transaction's debit.
pub fn validate_balances(preceding: &[Block], block: &Block) -> bool {
    let mut balances = replay_balances(preceding);

    for tx in block.transactions() {
        if tx.from_addr() == COINBASE_FROM {
            *balances.entry(tx.to_addr().to_string()).or_insert(0) += tx.amount();
            continue;
        }

        let available = balances.get(tx.from_addr()).copied().unwrap_or(0);
        if tx.amount() > available {
            return false;
        }

        *balances.entry(tx.from_addr().to_string()).or_insert(0) -= tx.amount();
        *balances.entry(tx.to_addr().to_string()).or_insert(0) += tx.amount();
    }

    true
}

/// Balance map after replaying a chain prefix: coinbases credit the
/// recipient, user transactions debit the sender and credit the recipient.
pub fn replay_balances(blocks: &[Block]) -> HashMap<String, i64> {
    let mut balances: HashMap<String, i64> = HashMap::new();
    for block in blocks {
        for tx in block.transactions() {
            if tx.from_addr() != COINBASE_FROM {
                *balances.entry(tx.from_addr().to_string()).or_insert(0) -= tx.amount();
            }
            *balances.entry(tx.to_addr().to_string()).or_insert(0) += tx.amount();
        }
    }
    balances
}
