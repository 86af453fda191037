//! Configuration management
//!
//! Environment-backed settings for the node: listen address, reward
//! address, data directory, and seed peers.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
