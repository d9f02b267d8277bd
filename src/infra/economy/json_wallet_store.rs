use crate::core::economy::{EconomyError, Wallet, WalletStore};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// JSON-backed wallet store. All wallets live in one file as a map:
/// { guild_id: { user_id: Wallet } }
///
/// Every update rewrites the whole file; concurrent writers are
/// last-writer-wins.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct WalletFile {
    wallets: HashMap<u64, HashMap<u64, Wallet>>,
}

pub struct JsonWalletStore {
    path: PathBuf,
    cache: RwLock<WalletFile>,
}

impl JsonWalletStore {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let cache: WalletFile = if path.exists() {
            let file = File::open(&path).context("Failed to open economy JSON file")?;
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            WalletFile::default()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self) -> Result<(), EconomyError> {
        let cache = self.cache.read().await;
        let file = File::create(&self.path).map_err(|e| EconomyError::Storage(e.to_string()))?;
        serde_json::to_writer_pretty(file, &*cache)
            .map_err(|e| EconomyError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl WalletStore for JsonWalletStore {
    async fn get_wallet(&self, user_id: u64, guild_id: u64) -> Result<Wallet, EconomyError> {
        let cache = self.cache.read().await;
        Ok(cache
            .wallets
            .get(&guild_id)
            .and_then(|g| g.get(&user_id).cloned())
            .unwrap_or_else(|| Wallet::empty(user_id, guild_id)))
    }

    async fn save_wallet(&self, wallet: Wallet) -> Result<(), EconomyError> {
        let mut cache = self.cache.write().await;
        cache
            .wallets
            .entry(wallet.guild_id)
            .or_default()
            .insert(wallet.user_id, wallet);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn guild_wallets(&self, guild_id: u64) -> Result<Vec<Wallet>, EconomyError> {
        let cache = self.cache.read().await;
        Ok(cache
            .wallets
            .get(&guild_id)
            .map(|g| g.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn wallets_survive_a_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonWalletStore::new(path.clone()).unwrap();
        let mut wallet = Wallet::empty(5, 7);
        wallet.balance = 123;
        store.save_wallet(wallet).await.unwrap();

        // Reload from file
        let store2 = JsonWalletStore::new(path).unwrap();
        let wallet = store2.get_wallet(5, 7).await.unwrap();
        assert_eq!(wallet.balance, 123);
    }

    #[tokio::test]
    async fn unknown_wallets_are_empty() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonWalletStore::new(path).unwrap();
        let wallet = store.get_wallet(1, 2).await.unwrap();
        assert_eq!(wallet.balance, 0);
        assert!(wallet.last_work.is_none());
    }
}
