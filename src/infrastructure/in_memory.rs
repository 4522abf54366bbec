use crate::domain::account::{AccountId, Wallet};
use crate::domain::ports::AccountStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for wallets.
///
/// Uses `Arc<RwLock<HashMap<AccountId, Wallet>>>` so clones share the same
/// accounts. Nothing survives the process.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    wallets: Arc<RwLock<HashMap<AccountId, Wallet>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        wallets.insert(wallet.account, wallet);
        Ok(())
    }

    async fn get(&self, account: AccountId) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(&account).cloned())
    }

    async fn all_accounts(&self) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.values().cloned().collect())
    }
}
