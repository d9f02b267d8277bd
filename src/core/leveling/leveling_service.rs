// Leveling system core - XP accrual and level thresholds.
// No Discord-specific code here; the command and event adapters translate
// between gateway types and the primitive ids this module works with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Roles granted automatically when a member reaches a level.
const ROLE_REWARDS: &[(u32, &str)] = &[
    (5, "Active Member"),
    (10, "Veteran"),
    (20, "Elite"),
];

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A user's XP progress within one guild.
///
/// XP counts toward the next level only: it resets to zero on level-up,
/// so `xp` is always below the current threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: u64,
    pub guild_id: u64,
    pub xp: u64,
    pub level: u32,
}

impl UserProfile {
    pub fn fresh(user_id: u64, guild_id: u64) -> Self {
        Self {
            user_id,
            guild_id,
            xp: 0,
            level: 1,
        }
    }
}

/// Returned when a message pushes a user over the threshold, so the
/// adapter can announce it and hand out the reward role if one applies.
#[derive(Debug, Clone)]
pub struct LevelUpEvent {
    pub user_id: u64,
    pub guild_id: u64,
    pub new_level: u32,
    pub reward_role: Option<&'static str>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait XpStore: Send + Sync {
    /// Fetch a profile, returning a fresh one for unknown users.
    async fn get_profile(&self, user_id: u64, guild_id: u64)
        -> Result<UserProfile, LevelingError>;

    async fn save_profile(&self, profile: UserProfile) -> Result<(), LevelingError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// XP required to finish the given level.
///
/// Pure math, no side effects.
pub fn xp_needed(level: u32) -> u64 {
    level as u64 * 100
}

pub struct LevelingService<S: XpStore> {
    store: S,
    /// Inclusive XP range rolled per message.
    xp_min: u64,
    xp_max: u64,
}

impl<S: XpStore> LevelingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            xp_min: 15,
            xp_max: 25,
        }
    }

    /// Award message XP and report a level-up if one happened.
    pub async fn process_message(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<LevelUpEvent>, LevelingError> {
        let mut profile = self.store.get_profile(user_id, guild_id).await?;

        profile.xp += Self::roll(self.xp_min, self.xp_max);

        let leveled_up = profile.xp >= xp_needed(profile.level);
        if leveled_up {
            profile.level += 1;
            profile.xp = 0;
        }

        let event = leveled_up.then(|| LevelUpEvent {
            user_id,
            guild_id,
            new_level: profile.level,
            reward_role: ROLE_REWARDS
                .iter()
                .find(|(level, _)| *level == profile.level)
                .map(|(_, role)| *role),
        });

        self.store.save_profile(profile).await?;
        Ok(event)
    }

    pub async fn profile(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<UserProfile, LevelingError> {
        self.store.get_profile(user_id, guild_id).await
    }

    fn roll(min: u64, max: u64) -> u64 {
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
        profiles: Mutex<HashMap<(u64, u64), UserProfile>>,
    }

    #[async_trait]
    impl XpStore for MemoryStore {
        async fn get_profile(
            &self,
            user_id: u64,
            guild_id: u64,
        ) -> Result<UserProfile, LevelingError> {
            Ok(self
                .profiles
                .lock()
                .await
                .get(&(guild_id, user_id))
                .cloned()
                .unwrap_or_else(|| UserProfile::fresh(user_id, guild_id)))
        }

        async fn save_profile(&self, profile: UserProfile) -> Result<(), LevelingError> {
            self.profiles
                .lock()
                .await
                .insert((profile.guild_id, profile.user_id), profile);
            Ok(())
        }
    }

    #[test]
    fn thresholds_scale_with_level() {
        assert_eq!(xp_needed(1), 100);
        assert_eq!(xp_needed(4), 400);
    }

    #[tokio::test]
    async fn messages_accrue_xp() {
        let service = LevelingService::new(MemoryStore::default());

        service.process_message(1, 10).await.unwrap();
        let profile = service.profile(1, 10).await.unwrap();
        assert!((15..=25).contains(&profile.xp));
        assert_eq!(profile.level, 1);
    }

    #[tokio::test]
    async fn crossing_the_threshold_levels_up_and_resets_xp() {
        let service = LevelingService::new(MemoryStore::default());

        let mut profile = UserProfile::fresh(1, 10);
        profile.xp = 95;
        service.store.save_profile(profile).await.unwrap();

        let event = service
            .process_message(1, 10)
            .await
            .unwrap()
            .expect("level-up event");
        assert_eq!(event.new_level, 2);
        assert_eq!(event.reward_role, None);

        let profile = service.profile(1, 10).await.unwrap();
        assert_eq!(profile.level, 2);
        assert_eq!(profile.xp, 0);
    }

    #[tokio::test]
    async fn reward_roles_fire_on_their_levels() {
        let service = LevelingService::new(MemoryStore::default());

        let mut profile = UserProfile::fresh(1, 10);
        profile.level = 4;
        profile.xp = 399;
        service.store.save_profile(profile).await.unwrap();

        let event = service
            .process_message(1, 10)
            .await
            .unwrap()
            .expect("level-up event");
        assert_eq!(event.new_level, 5);
        assert_eq!(event.reward_role, Some("Active Member"));
    }

    #[tokio::test]
    async fn below_threshold_reports_no_event() {
        let service = LevelingService::new(MemoryStore::default());

        let event = service.process_message(1, 10).await.unwrap();
        assert!(event.is_none());
    }
}
