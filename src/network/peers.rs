use std::sync::RwLock;

/// A known peer, addressed by its listening socket address.
#[derive(Clone)]
pub struct Peer {
    addr: String,
}

impl Peer {
    fn new(addr: String) -> Peer {
        Peer { addr }
    }

    pub fn get_addr(&self) -> String {
        self.addr.clone()
    }
}

/// Shared registry of known peers.
pub struct Peers {
    inner: RwLock<Vec<Peer>>,
}

impl Default for Peers {
    fn default() -> Self {
        Self::new()
    }
}

impl Peers {
    pub fn new() -> Peers {
        Peers {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn add_peer(&self, addr: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peers - this should never happen");
        if !inner.iter().any(|x| x.get_addr().eq(addr.as_str())) {
            inner.push(Peer::new(addr));
        }
    }

    pub fn evict_peer(&self, addr: &str) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peers - this should never happen");
        if let Some(idx) = inner.iter().position(|x| x.get_addr().eq(addr)) {
            inner.remove(idx);
        }
    }

    pub fn get_peers(&self) -> Vec<Peer> {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peers - this should never happen")
            .to_vec()
    }

    pub fn peer_is_known(&self, addr: &str) -> bool {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peers - this should never happen")
            .iter()
            .any(|x| x.get_addr().eq(addr))
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peers - this should never happen")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peers - this should never happen")
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_deduplicated() {
        let peers = Peers::new();
        peers.add_peer("127.0.0.1:2002".to_string());
        peers.add_peer("127.0.0.1:2002".to_string());
        peers.add_peer("127.0.0.1:2003".to_string());

        assert_eq!(peers.len(), 2);
        assert!(peers.peer_is_known("127.0.0.1:2002"));
    }

    #[test]
    fn test_evict() {
        let peers = Peers::new();
        peers.add_peer("127.0.0.1:2002".to_string());
        peers.evict_peer("127.0.0.1:2002");

        assert!(peers.is_empty());
        assert!(!peers.peer_is_known("127.0.0.1:2002"));
    }
}
