use crate::core::Transaction;
use std::collections::HashMap;
use std::sync::RwLock;

/// Pool of admitted but unconfirmed transactions, keyed by id.
///
/// Admission is atomic per id under the inner lock. The balance pre-check is
/// advisory only: it filters obvious overdrafts cheaply, while the
/// authoritative check runs at block validation under the chain lock. The
/// confirmed balance is injected by the caller so the pool never touches the
/// chain (and never takes the chain lock while holding its own).
pub struct MemoryPool {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Admit a transaction. Rejects invalid signatures, coinbases (only the
    /// miner mints those), duplicates, and amounts beyond the sender's
    /// confirmed balance minus what they already have pending.
    pub fn add<F>(&self, tx: Transaction, confirmed_balance: F) -> bool
    where
        F: Fn(&str) -> i64,
    {
        if !tx.validate_signature() {
            log::warn!("Rejected transaction {} with invalid signature", tx.id());
            return false;
        }
        if tx.is_coinbase() {
            log::warn!("Rejected coinbase transaction {} from a client", tx.id());
            return false;
        }

        // Evaluated before the pool lock; see the lock-ordering note above.
        let confirmed = confirmed_balance(tx.from_addr());

        match self.inner.write() {
            Ok(mut pool) => {
                let pending: i64 = pool
                    .values()
                    .filter(|p| p.from_addr() == tx.from_addr())
                    .map(|p| p.amount())
                    .sum();
                if tx.amount() > confirmed - pending {
                    log::warn!(
                        "Rejected transaction {}: amount {} exceeds available {}",
                        tx.id(),
                        tx.amount(),
                        confirmed - pending
                    );
                    return false;
                }
                if pool.contains_key(tx.id()) {
                    return false;
                }
                pool.insert(tx.id().to_string(), tx);
                true
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
                false
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.contains_key(id),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                false
            }
        }
    }

    pub fn remove(&self, id: &str) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.remove(id);
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
            }
        }
    }

    /// Drop every transaction that was confirmed in a block. Best-effort;
    /// ids not present are ignored.
    pub fn remove_confirmed(&self, transactions: &[Transaction]) {
        match self.inner.write() {
            Ok(mut pool) => {
                for tx in transactions {
                    pool.remove(tx.id());
                }
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
            }
        }
    }

    /// Up to `limit` current entries. The order is not meaningful but is
    /// stable within the returned snapshot; nothing guarantees the entries
    /// are still pooled when the caller acts on them.
    pub fn snapshot(&self, limit: usize) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.values().take(limit).cloned().collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                Vec::new()
            }
        }
    }

    pub fn count(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                0
            }
        }
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.clear();
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_utils::test_wallet;
    use crate::wallet::KeyProvider;

    fn signed(keys: &dyn KeyProvider, to: &str, amount: i64) -> Transaction {
        Transaction::new_signed(keys, to, amount).unwrap()
    }

    #[test]
    fn test_add_and_snapshot() {
        let pool = MemoryPool::new();
        let alice = test_wallet();
        let tx = signed(&alice, "bob", 10);

        assert!(pool.add(tx.clone(), |_| 50));
        assert_eq!(pool.count(), 1);
        assert!(pool.contains(tx.id()));

        let snapshot = pool.snapshot(10);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), tx.id());

        pool.remove(tx.id());
        assert!(!pool.contains(tx.id()));
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let pool = MemoryPool::new();
        let alice = test_wallet();
        let tx = signed(&alice, "bob", 10);

        assert!(pool.add(tx.clone(), |_| 100));
        assert!(!pool.add(tx, |_| 100));
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn test_invalid_signature_is_rejected() {
        let pool = MemoryPool::new();
        let alice = test_wallet();
        let tx = signed(&alice, "bob", 10);
        let tampered = Transaction::from_parts(
            tx.from_addr(),
            tx.to_addr(),
            999,
            tx.timestamp(),
            tx.signature().map(str::to_string),
        );

        assert!(!pool.add(tampered, |_| i64::MAX));
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn test_coinbase_is_rejected() {
        let pool = MemoryPool::new();
        let coinbase = Transaction::new_coinbase("miner", 50).unwrap();
        assert!(!pool.add(coinbase, |_| 0));
    }

    #[test]
    fn test_pending_amounts_reduce_available_balance() {
        let pool = MemoryPool::new();
        let alice = test_wallet();

        assert!(pool.add(signed(&alice, "bob", 30), |_| 50));
        // 30 already pending, so another 30 overshoots the 50 confirmed.
        assert!(!pool.add(signed(&alice, "carol", 30), |_| 50));
        // 20 still fits.
        assert!(pool.add(signed(&alice, "carol", 20), |_| 50));
        assert_eq!(pool.count(), 2);
    }

    #[test]
    fn test_snapshot_respects_limit() {
        let pool = MemoryPool::new();
        let alice = test_wallet();
        for i in 1..=5 {
            assert!(pool.add(signed(&alice, "bob", i), |_| 1_000));
        }

        assert_eq!(pool.snapshot(3).len(), 3);
        assert_eq!(pool.snapshot(10).len(), 5);
    }

    #[test]
    fn test_remove_confirmed_is_best_effort() {
        let pool = MemoryPool::new();
        let alice = test_wallet();
        let kept = signed(&alice, "bob", 1);
        let mined = signed(&alice, "carol", 2);
        let unknown = signed(&alice, "dave", 3);

        assert!(pool.add(kept.clone(), |_| 100));
        assert!(pool.add(mined.clone(), |_| 100));

        pool.remove_confirmed(&[mined.clone(), unknown]);
        assert!(pool.contains(kept.id()));
        assert!(!pool.contains(mined.id()));
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn test_clear_empties_pool() {
        let pool = MemoryPool::new();
        let alice = test_wallet();
        assert!(pool.add(signed(&alice, "bob", 1), |_| 10));

        pool.clear();
        assert_eq!(pool.count(), 0);
    }
}
