// The chain is an ordered block list rooted at the deterministic genesis.
// All validators answer with booleans; a rejected block leaves the chain
// untouched. Locking is the coordinator's job, not this type's.

use crate::core::{consensus, Block};

pub struct Chain {
    blocks: Vec<Block>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    pub fn new() -> Chain {
        Chain {
            blocks: vec![Block::genesis()],
        }
    }

    /// The tip block. The chain always contains at least genesis.
    pub fn latest(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Append a block if it extends the tip and passes every consensus rule.
    /// Returns false without touching the chain otherwise.
    pub fn append(&mut self, block: Block) -> bool {
        let (tip_hash, tip_index) = {
            let tip = self.latest();
            (tip.hash(), tip.index())
        };

        if block.previous_hash() != tip_hash {
            return false;
        }
        if block.index() != tip_index + 1 {
            return false;
        }

        if block.index() > 0
            && !(consensus::validate_coinbase(&block)
                && consensus::validate_difficulty(&block)
                && consensus::validate_signatures(&block)
                && consensus::validate_balances(&self.blocks, &block))
        {
            return false;
        }

        self.blocks.push(block);
        true
    }

    /// Unconditional full replacement. The caller has already validated the
    /// new chain; this runs under the coordinator's lock.
    pub fn replace(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }

    /// Validate a full chain: the first block must equal the fixed genesis,
    /// and every later block must link to its predecessor and satisfy the
    /// consensus rules against its prefix.
    pub fn is_valid_chain(blocks: &[Block]) -> bool {
        match blocks.first() {
            Some(genesis) if *genesis == Block::genesis() => {}
            _ => return false,
        }

        for i in 1..blocks.len() {
            let block = &blocks[i];
            let previous = &blocks[i - 1];
            if block.previous_hash() != previous.hash() {
                return false;
            }
            if block.index() != previous.index() + 1 {
                return false;
            }
            if !(consensus::validate_coinbase(block)
                && consensus::validate_difficulty(block)
                && consensus::validate_signatures(block)
                && consensus::validate_balances(&blocks[..i], block))
            {
                return false;
            }
        }

        true
    }

    /// Confirmed balance of an address, replayed over the whole chain.
    pub fn balance_of(&self, address: &str) -> i64 {
        let mut balance = 0i64;
        for block in &self.blocks {
            for tx in block.transactions() {
                if !tx.is_coinbase() && tx.from_addr() == address {
                    balance -= tx.amount();
                }
                if tx.to_addr() == address {
                    balance += tx.amount();
                }
            }
        }
        balance
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
