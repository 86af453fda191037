//! Peer-to-peer networking
//!
//! This module carries the gossip protocol between nodes: the outbound
//! transport abstraction, the inbound message server, and the registry of
//! known peers.

pub mod peers;
pub mod server;
pub mod transport;

pub use peers::{Peer, Peers};
pub use server::Server;
pub use transport::{NoopTransport, Package, TcpTransport, Transport};
