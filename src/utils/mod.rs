//! Utility functions and helpers
//!
//! This module contains cryptographic utilities, encoding functions,
//! and other helper functions used throughout the node.

pub mod crypto;

pub use crypto::{
    current_timestamp, ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify, hex_decode, hex_encode,
    new_key_pair, sha256_digest, sha256_hex, spki_unwrap, spki_wrap,
};
