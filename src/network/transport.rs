use crate::core::{Block, Transaction};
use crate::error::{NodeError, Result};
use crate::network::Peers;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

const TCP_WRITE_TIMEOUT: u64 = 5000;

/// P2P message types. The chain wire format is JSON throughout; block
/// hashes are never on the wire, every receiver recomputes them.
#[derive(Debug, Serialize, Deserialize)]
pub enum Package {
    Block {
        addr_from: String,
        block: Block,
    },
    Tx {
        addr_from: String,
        transaction: Transaction,
    },
    Chain {
        addr_from: String,
        blocks: Vec<Block>,
    },
    GetChain {
        addr_from: String,
    },
}

/// Outbound side of the gossip protocol. Delivery is never assumed:
/// receivers tolerate duplicates and reordering through validation.
pub trait Transport: Send + Sync {
    /// Fire-and-forget block announcement to every known peer.
    fn broadcast_block(&self, block: &Block) -> Result<()>;

    /// Fire-and-forget transaction announcement to every known peer.
    fn broadcast_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Ask one peer for its full chain.
    fn request_chain(&self, peer: &str) -> Result<()>;
}

/// JSON-over-TCP transport: one connection per message, matching the
/// short-lived handler threads on the receiving side.
pub struct TcpTransport {
    peers: Arc<Peers>,
    node_addr: String,
}

impl TcpTransport {
    pub fn new(peers: Arc<Peers>, node_addr: String) -> TcpTransport {
        TcpTransport { peers, node_addr }
    }

    /// Send one package to one address. Used for broadcasts and for direct
    /// replies from the server.
    pub fn send(addr: &str, pkg: &Package) -> Result<()> {
        let socket_addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| NodeError::Network(format!("Invalid address {addr}: {e}")))?;

        let mut stream =
            TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_WRITE_TIMEOUT))
                .map_err(|e| NodeError::Network(format!("Failed to connect to {addr}: {e}")))?;

        stream
            .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT)))
            .map_err(|e| NodeError::Network(format!("Failed to set write timeout: {e}")))?;

        serde_json::to_writer(&stream, pkg)
            .map_err(|e| NodeError::Network(format!("Failed to send data: {e}")))?;

        let _ = stream.flush();
        Ok(())
    }

    /// Deliver to every known peer except ourselves; per-peer failures are
    /// logged and the remaining peers still get the message.
    fn broadcast(&self, pkg: &Package) {
        for peer in self.peers.get_peers() {
            let addr = peer.get_addr();
            if addr == self.node_addr {
                continue;
            }
            if let Err(e) = Self::send(&addr, pkg) {
                error!("Failed to send to peer {addr}: {e}");
            }
        }
    }
}

impl Transport for TcpTransport {
    fn broadcast_block(&self, block: &Block) -> Result<()> {
        info!("Broadcasting block {} to {} peers", block.hash(), self.peers.len());
        self.broadcast(&Package::Block {
            addr_from: self.node_addr.clone(),
            block: block.clone(),
        });
        Ok(())
    }

    fn broadcast_transaction(&self, tx: &Transaction) -> Result<()> {
        self.broadcast(&Package::Tx {
            addr_from: self.node_addr.clone(),
            transaction: tx.clone(),
        });
        Ok(())
    }

    fn request_chain(&self, peer: &str) -> Result<()> {
        info!("Requesting chain from {peer}");
        Self::send(
            peer,
            &Package::GetChain {
                addr_from: self.node_addr.clone(),
            },
        )
    }
}

/// Transport that drops everything. For single-node runs and tests.
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn broadcast_block(&self, _block: &Block) -> Result<()> {
        Ok(())
    }

    fn broadcast_transaction(&self, _tx: &Transaction) -> Result<()> {
        Ok(())
    }

    fn request_chain(&self, _peer: &str) -> Result<()> {
        Ok(())
    }
}
