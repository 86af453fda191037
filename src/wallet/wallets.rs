use crate::config::GLOBAL_CONFIG;
use crate::error::{NodeError, Result};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

pub const WALLET_FILE: &str = "wallet.dat";

/// Wallet collection keyed by address, persisted to the data directory. A
/// missing file means an empty set; a file that cannot be read or decoded is
/// an error, because signing with half a wallet set is worse than failing.
pub struct Wallets {
    wallets: HashMap<String, Wallet>,
}

impl Wallets {
    pub fn load() -> Result<Wallets> {
        let path = Self::wallet_file_path();
        if !path.exists() {
            return Ok(Wallets {
                wallets: HashMap::new(),
            });
        }

        let mut file = File::open(&path)
            .map_err(|e| NodeError::Wallet(format!("Failed to open wallet file: {e}")))?;
        let metadata = file
            .metadata()
            .map_err(|e| NodeError::Wallet(format!("Failed to stat wallet file: {e}")))?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)
            .map_err(|e| NodeError::Wallet(format!("Failed to read wallet file: {e}")))?;
        let (wallets, _): (HashMap<String, Wallet>, usize) =
            bincode::decode_from_slice(&buf, bincode::config::standard())
                .map_err(|e| NodeError::Wallet(format!("Corrupt wallet file: {e}")))?;

        Ok(Wallets { wallets })
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    fn wallet_file_path() -> PathBuf {
        GLOBAL_CONFIG.data_dir().join(WALLET_FILE)
    }

    fn save_to_file(&self) -> Result<()> {
        let path = Self::wallet_file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| NodeError::Wallet(format!("Failed to create data dir: {e}")))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(|e| NodeError::Wallet(format!("Failed to open wallet file: {e}")))?;
        let mut writer = BufWriter::new(file);
        let wallets_bytes = bincode::encode_to_vec(&self.wallets, bincode::config::standard())
            .map_err(|e| NodeError::Wallet(format!("Failed to encode wallet file: {e}")))?;
        writer
            .write_all(wallets_bytes.as_slice())
            .map_err(|e| NodeError::Wallet(format!("Failed to write wallet file: {e}")))?;
        writer
            .flush()
            .map_err(|e| NodeError::Wallet(format!("Failed to flush wallet file: {e}")))?;
        Ok(())
    }
}
