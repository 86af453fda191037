use crate::error::{NodeError, Result};
use crate::utils::{
    ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify, hex_encode, new_key_pair, spki_wrap,
};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde::{Deserialize, Serialize};

/// The key capabilities the core depends on. Signing needs key material and
/// lives behind this trait; verification is stateless and works from the
/// public key embedded in an address.
pub trait KeyProvider: Send + Sync {
    /// Hex-encoded SPKI public key. This doubles as the address.
    fn public_key_hex(&self) -> String;

    /// Private key material in the DER document form it was generated in.
    fn export_private(&self) -> &[u8];

    fn sign(&self, content: &[u8]) -> Result<Vec<u8>>;

    /// False on any malformed key, signature, or content. Never panics.
    fn verify(&self, public_key_hex: &str, content: &[u8], signature: &[u8]) -> bool;
}

/// An ECDSA P-256 key pair. The public key is held as the raw uncompressed
/// point and wrapped into SPKI form on demand.
#[derive(Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        Self::from_pkcs8(pkcs8)
    }

    /// Import a previously exported private key document.
    pub fn from_pkcs8(pkcs8: Vec<u8>) -> Result<Wallet> {
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| {
                    NodeError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
                })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Wallet { pkcs8, public_key })
    }

    /// The wallet's address: lowercase hex of the SPKI public key.
    pub fn get_address(&self) -> String {
        self.public_key_hex()
    }
}

impl KeyProvider for Wallet {
    fn public_key_hex(&self) -> String {
        hex_encode(&spki_wrap(&self.public_key))
    }

    fn export_private(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    fn sign(&self, content: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign(&self.pkcs8, content)
    }

    fn verify(&self, public_key_hex: &str, content: &[u8], signature: &[u8]) -> bool {
        ecdsa_p256_sha256_verify(public_key_hex, content, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_spki_hex() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address();
        // 26-byte SPKI header + 65-byte point, hex doubles the length.
        assert_eq!(address.len(), 182);
        assert_eq!(address, address.to_lowercase());
        assert_eq!(address, wallet.public_key_hex());
    }

    #[test]
    fn test_sign_verify_through_provider() {
        let wallet = Wallet::new().unwrap();
        let signature = wallet.sign(b"content").unwrap();

        assert!(wallet.verify(&wallet.public_key_hex(), b"content", &signature));
        assert!(!wallet.verify(&wallet.public_key_hex(), b"other", &signature));

        let stranger = Wallet::new().unwrap();
        assert!(!wallet.verify(&stranger.public_key_hex(), b"content", &signature));
    }

    #[test]
    fn test_private_key_round_trip() {
        let wallet = Wallet::new().unwrap();
        let restored = Wallet::from_pkcs8(wallet.export_private().to_vec()).unwrap();

        assert_eq!(wallet.get_address(), restored.get_address());

        let signature = restored.sign(b"content").unwrap();
        assert!(wallet.verify(&wallet.public_key_hex(), b"content", &signature));
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(Wallet::from_pkcs8(vec![0x30, 0x00]).is_err());
        assert!(Wallet::from_pkcs8(Vec::new()).is_err());
    }
}
