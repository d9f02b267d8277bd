// Economy system core - wallet bookkeeping for the work/balance/leaderboard
// commands. Platform-agnostic: no Discord types, only primitive ids.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A user's wallet in a specific guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: u64,
    pub guild_id: u64,
    pub balance: i64,
    /// When the user last ran `work`, for cooldown arbitration.
    pub last_work: Option<DateTime<Utc>>,
}

impl Wallet {
    pub fn empty(user_id: u64, guild_id: u64) -> Self {
        Self {
            user_id,
            guild_id,
            balance: 0,
            last_work: None,
        }
    }
}

/// Outcome of a successful `work` invocation.
#[derive(Debug, Clone)]
pub struct WorkOutcome {
    pub earned: i64,
    pub new_balance: i64,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("You already worked recently. Try again in {0} minutes.")]
    OnCooldown(i64),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Persistence for wallets. The production implementation is a whole-file
/// JSON document; tests use an in-memory map.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Fetch a wallet, returning an empty one for unknown users.
    async fn get_wallet(&self, user_id: u64, guild_id: u64) -> Result<Wallet, EconomyError>;

    async fn save_wallet(&self, wallet: Wallet) -> Result<(), EconomyError>;

    /// All wallets in a guild, unordered.
    async fn guild_wallets(&self, guild_id: u64) -> Result<Vec<Wallet>, EconomyError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// Inclusive payout range for `work`.
    pub work_min: i64,
    pub work_max: i64,
    /// Cooldown between `work` invocations.
    pub work_cooldown: Duration,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            work_min: 50,
            work_max: 200,
            work_cooldown: Duration::hours(1),
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Generic over S: WalletStore so the store can be swapped in tests.
pub struct EconomyService<S: WalletStore> {
    store: S,
    config: EconomyConfig,
}

impl<S: WalletStore> EconomyService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: EconomyConfig::default(),
        }
    }

    #[allow(dead_code)]
    pub fn with_config(store: S, config: EconomyConfig) -> Self {
        Self { store, config }
    }

    /// Earn a random payout, refusing while the cooldown is running.
    pub async fn work(&self, user_id: u64, guild_id: u64) -> Result<WorkOutcome, EconomyError> {
        let mut wallet = self.store.get_wallet(user_id, guild_id).await?;
        let now = Utc::now();

        if let Some(last) = wallet.last_work {
            let next = last + self.config.work_cooldown;
            if now < next {
                let minutes = (next - now).num_minutes().max(1);
                return Err(EconomyError::OnCooldown(minutes));
            }
        }

        let earned = Self::roll(self.config.work_min, self.config.work_max);
        wallet.balance = wallet.balance.saturating_add(earned);
        wallet.last_work = Some(now);
        let new_balance = wallet.balance;
        self.store.save_wallet(wallet).await?;

        Ok(WorkOutcome { earned, new_balance })
    }

    /// Current balance; zero for users who never earned anything.
    pub async fn balance(&self, user_id: u64, guild_id: u64) -> Result<i64, EconomyError> {
        Ok(self.store.get_wallet(user_id, guild_id).await?.balance)
    }

    /// Wallets sorted by balance descending, truncated to `limit`.
    pub async fn leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Wallet>, EconomyError> {
        let mut wallets = self.store.guild_wallets(guild_id).await?;
        wallets.sort_by(|a, b| b.balance.cmp(&a.balance));
        wallets.truncate(limit);
        Ok(wallets)
    }

    fn roll(min: i64, max: i64) -> i64 {
        // Send-safe rng, same approach as the XP roll.
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::time::SystemTime;

        let seed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        StdRng::seed_from_u64(seed).gen_range(min..=max)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        wallets: Mutex<HashMap<(u64, u64), Wallet>>,
    }

    #[async_trait]
    impl WalletStore for MemoryStore {
        async fn get_wallet(&self, user_id: u64, guild_id: u64) -> Result<Wallet, EconomyError> {
            Ok(self
                .wallets
                .lock()
                .await
                .get(&(guild_id, user_id))
                .cloned()
                .unwrap_or_else(|| Wallet::empty(user_id, guild_id)))
        }

        async fn save_wallet(&self, wallet: Wallet) -> Result<(), EconomyError> {
            self.wallets
                .lock()
                .await
                .insert((wallet.guild_id, wallet.user_id), wallet);
            Ok(())
        }

        async fn guild_wallets(&self, guild_id: u64) -> Result<Vec<Wallet>, EconomyError> {
            Ok(self
                .wallets
                .lock()
                .await
                .values()
                .filter(|w| w.guild_id == guild_id)
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn work_pays_within_range_and_stamps_cooldown() {
        let service = EconomyService::new(MemoryStore::default());

        let outcome = service.work(1, 10).await.unwrap();
        assert!((50..=200).contains(&outcome.earned));
        assert_eq!(outcome.new_balance, outcome.earned);

        let wallet = service.store.get_wallet(1, 10).await.unwrap();
        assert!(wallet.last_work.is_some());
    }

    #[tokio::test]
    async fn work_is_refused_during_cooldown() {
        let service = EconomyService::new(MemoryStore::default());

        service.work(1, 10).await.unwrap();
        let second = service.work(1, 10).await;
        assert!(matches!(second, Err(EconomyError::OnCooldown(m)) if m >= 1));

        // Balance unchanged by the refused attempt.
        let first_balance = service.balance(1, 10).await.unwrap();
        let _ = service.work(1, 10).await;
        assert_eq!(service.balance(1, 10).await.unwrap(), first_balance);
    }

    #[tokio::test]
    async fn expired_cooldown_allows_working_again() {
        let service = EconomyService::new(MemoryStore::default());

        let mut wallet = Wallet::empty(1, 10);
        wallet.balance = 30;
        wallet.last_work = Some(Utc::now() - Duration::hours(2));
        service.store.save_wallet(wallet).await.unwrap();

        let outcome = service.work(1, 10).await.unwrap();
        assert_eq!(outcome.new_balance, 30 + outcome.earned);
    }

    #[tokio::test]
    async fn unknown_users_have_zero_balance() {
        let service = EconomyService::new(MemoryStore::default());
        assert_eq!(service.balance(42, 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn leaderboard_sorts_by_balance_and_truncates() {
        let service = EconomyService::new(MemoryStore::default());

        for (user, balance) in [(1, 50), (2, 300), (3, 120)] {
            let mut wallet = Wallet::empty(user, 10);
            wallet.balance = balance;
            service.store.save_wallet(wallet).await.unwrap();
        }
        // Another guild's wallet stays out of the listing.
        let mut other = Wallet::empty(9, 11);
        other.balance = 999;
        service.store.save_wallet(other).await.unwrap();

        let top = service.leaderboard(10, 2).await.unwrap();
        let ids: Vec<u64> = top.iter().map(|w| w.user_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
