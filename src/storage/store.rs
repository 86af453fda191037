use crate::core::Block;
use crate::error::{NodeError, Result};
use sled::Db;
use std::path::Path;
use std::sync::RwLock;

const CHAIN_TREE: &str = "chain";
const CHAIN_KEY: &str = "blocks";

/// Best-effort chain persistence: load whatever was saved last, overwrite on
/// save, last writer wins. The in-memory chain stays authoritative; a failed
/// save is retried at the next mutation.
pub trait ChainStore: Send + Sync {
    fn load(&self) -> Result<Vec<Block>>;
    fn save(&self, blocks: &[Block]) -> Result<()>;
}

/// Sled-backed store keeping the chain as one JSON array of blocks. Block
/// hashes are never persisted: they are recomputed from the header fields
/// when the chain is loaded.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<SledStore> {
        let db = sled::open(path)
            .map_err(|e| NodeError::Store(format!("Failed to open database: {e}")))?;
        Ok(SledStore { db })
    }
}

impl ChainStore for SledStore {
    fn load(&self) -> Result<Vec<Block>> {
        let tree = self
            .db
            .open_tree(CHAIN_TREE)
            .map_err(|e| NodeError::Store(format!("Failed to open chain tree: {e}")))?;
        match tree
            .get(CHAIN_KEY)
            .map_err(|e| NodeError::Store(format!("Failed to read chain: {e}")))?
        {
            Some(bytes) => {
                let blocks = serde_json::from_slice(&bytes)
                    .map_err(|e| NodeError::Serialization(format!("Corrupt chain data: {e}")))?;
                Ok(blocks)
            }
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        let bytes = serde_json::to_vec(blocks)
            .map_err(|e| NodeError::Serialization(format!("Failed to encode chain: {e}")))?;
        let tree = self
            .db
            .open_tree(CHAIN_TREE)
            .map_err(|e| NodeError::Store(format!("Failed to open chain tree: {e}")))?;
        tree.insert(CHAIN_KEY, bytes)
            .map_err(|e| NodeError::Store(format!("Failed to write chain: {e}")))?;
        tree.flush()
            .map_err(|e| NodeError::Store(format!("Failed to flush chain: {e}")))?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral nodes.
pub struct MemoryStore {
    inner: RwLock<Vec<Block>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            inner: RwLock::new(Vec::new()),
        }
    }
}

impl ChainStore for MemoryStore {
    fn load(&self) -> Result<Vec<Block>> {
        self.inner
            .read()
            .map(|blocks| blocks.clone())
            .map_err(|_| NodeError::Store("Memory store lock poisoned".to_string()))
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| NodeError::Store("Memory store lock poisoned".to_string()))?;
        *inner = blocks.to_vec();
        Ok(())
    }
}
