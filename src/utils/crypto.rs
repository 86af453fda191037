use data_encoding::HEXLOWER;
use ring::digest::{digest, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING};

use crate::error::{NodeError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

// DER header of a P-256 SubjectPublicKeyInfo: SEQUENCE { AlgorithmIdentifier
// { ecPublicKey, prime256v1 }, BIT STRING }. The 65-byte uncompressed point
// follows directly after it.
const SPKI_P256_HEADER: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
    0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

const P256_POINT_LEN: usize = 65;

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| NodeError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    if duration > i64::MAX as u64 {
        return Err(NodeError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

/// SHA-256 digest returned on the stack; the mining loop calls this once per
/// nonce, so it must not touch the heap.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let d = digest(&SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    out
}

pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha256_digest(data))
}

pub fn hex_encode(data: &[u8]) -> String {
    HEXLOWER.encode(data)
}

pub fn hex_decode(data: &str) -> Result<Vec<u8>> {
    HEXLOWER
        .decode(data.as_bytes())
        .map_err(|e| NodeError::Crypto(format!("Invalid hex encoding: {e}")))
}

/// Wrap a raw uncompressed P-256 point into SPKI DER form. Addresses are the
/// lowercase hex of this document.
pub fn spki_wrap(point: &[u8]) -> Vec<u8> {
    let mut spki = Vec::with_capacity(SPKI_P256_HEADER.len() + point.len());
    spki.extend_from_slice(&SPKI_P256_HEADER);
    spki.extend_from_slice(point);
    spki
}

/// Extract the raw uncompressed point from a P-256 SPKI document. Returns
/// `None` for anything that is not a well-formed P-256 SPKI.
pub fn spki_unwrap(spki: &[u8]) -> Option<&[u8]> {
    if spki.len() != SPKI_P256_HEADER.len() + P256_POINT_LEN {
        return None;
    }
    if spki[..SPKI_P256_HEADER.len()] != SPKI_P256_HEADER {
        return None;
    }
    Some(&spki[SPKI_P256_HEADER.len()..])
}

pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| NodeError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    Ok(pkcs8)
}

pub fn ecdsa_p256_sha256_sign(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| NodeError::Crypto(format!("Failed to create key pair from PKCS8: {e}")))?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| NodeError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

/// Verify a signature against a hex-encoded SPKI public key. Any malformed
/// input verifies as false; this never panics across the boundary.
pub fn ecdsa_p256_sha256_verify(public_key_hex: &str, message: &[u8], signature: &[u8]) -> bool {
    let spki = match hex_decode(public_key_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let point = match spki_unwrap(&spki) {
        Some(point) => point,
        None => return false,
    };
    let peer_public_key = ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, point);
    peer_public_key.verify(message, signature).is_ok()
}
