use crate::config::GLOBAL_CONFIG;
use crate::error::{NodeError, Result};
use crate::network::{Package, Peers, TcpTransport};
use crate::node::NodeCoordinator;
use log::{error, info};
use serde_json::Deserializer;
use std::io::BufReader;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Inbound side of the gossip protocol. Accepts connections, decodes JSON
/// packages and hands them to the coordinator; each connection gets its own
/// short-lived handler thread.
pub struct Server {
    coordinator: Arc<NodeCoordinator>,
    peers: Arc<Peers>,
}

impl Server {
    pub fn new(coordinator: Arc<NodeCoordinator>, peers: Arc<Peers>) -> Server {
        Server { coordinator, peers }
    }

    /// Bind and serve forever. Seed peers are registered and asked for
    /// their chain first, so a restarted node catches up before it mines.
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| NodeError::Network(format!("Failed to bind to {addr}: {e}")))?;

        info!("Server listening on {addr}");

        for seed in GLOBAL_CONFIG.seed_peers() {
            if seed != addr {
                self.peers.add_peer(seed.clone());
                if let Err(e) = self.coordinator.request_chain_from(&seed) {
                    error!("Failed to reach seed peer {seed}: {e}");
                }
            }
        }

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let coordinator = Arc::clone(&self.coordinator);
                    let peers = Arc::clone(&self.peers);

                    thread::spawn(move || {
                        if let Err(e) =
                            Self::handle_connection(coordinator, peers, stream, peer_addr)
                        {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }

    fn handle_connection(
        coordinator: Arc<NodeCoordinator>,
        peers: Arc<Peers>,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<()> {
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| NodeError::Network(format!("Failed to set read timeout: {e}")))?;

        let reader = BufReader::new(&stream);
        let pkg_reader = Deserializer::from_reader(reader).into_iter::<Package>();

        for pkg in pkg_reader {
            let pkg = pkg
                .map_err(|e| NodeError::Network(format!("Failed to deserialize package: {e}")))?;

            if let Err(e) = Self::process_package(&coordinator, &peers, pkg) {
                error!("Error processing message from {peer_addr}: {e}");
            }
        }

        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    fn process_package(
        coordinator: &Arc<NodeCoordinator>,
        peers: &Arc<Peers>,
        pkg: Package,
    ) -> Result<()> {
        match pkg {
            Package::Block { addr_from, block } => {
                info!("Received block {} from {addr_from}", block.hash());
                peers.add_peer(addr_from.clone());
                coordinator.handle_block(&addr_from, block);
            }
            Package::Tx {
                addr_from,
                transaction,
            } => {
                peers.add_peer(addr_from);
                coordinator.handle_transaction(transaction);
            }
            Package::Chain { addr_from, blocks } => {
                info!("Received chain of {} blocks from {addr_from}", blocks.len());
                peers.add_peer(addr_from);
                coordinator.handle_chain(blocks);
            }
            Package::GetChain { addr_from } => {
                peers.add_peer(addr_from.clone());
                let blocks = coordinator.handle_chain_request();
                let reply = Package::Chain {
                    addr_from: GLOBAL_CONFIG.get_node_addr(),
                    blocks,
                };
                TcpTransport::send(&addr_from, &reply)?;
            }
        }
        Ok(())
    }
}
