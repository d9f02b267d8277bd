use crate::core::leveling::{LevelingError, UserProfile, XpStore};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// JSON-backed XP store. Persist all profiles in a single file as a map:
/// { guild_id: { user_id: UserProfile } }
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct ProfileFile {
    profiles: HashMap<u64, HashMap<u64, UserProfile>>,
}

pub struct JsonXpStore {
    path: PathBuf,
    cache: RwLock<ProfileFile>,
}

impl JsonXpStore {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let cache: ProfileFile = if path.exists() {
            let file = File::open(&path).context("Failed to open XP JSON file")?;
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            ProfileFile::default()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self) -> Result<(), LevelingError> {
        let cache = self.cache.read().await;
        let file = File::create(&self.path).map_err(|e| LevelingError::Storage(e.to_string()))?;
        serde_json::to_writer_pretty(file, &*cache)
            .map_err(|e| LevelingError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl XpStore for JsonXpStore {
    async fn get_profile(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<UserProfile, LevelingError> {
        let cache = self.cache.read().await;
        Ok(cache
            .profiles
            .get(&guild_id)
            .and_then(|g| g.get(&user_id).cloned())
            .unwrap_or_else(|| UserProfile::fresh(user_id, guild_id)))
    }

    async fn save_profile(&self, profile: UserProfile) -> Result<(), LevelingError> {
        let mut cache = self.cache.write().await;
        cache
            .profiles
            .entry(profile.guild_id)
            .or_default()
            .insert(profile.user_id, profile);
        drop(cache);
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn profiles_survive_a_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonXpStore::new(path.clone()).unwrap();
        let mut profile = UserProfile::fresh(5, 7);
        profile.xp = 42;
        profile.level = 3;
        store.save_profile(profile).await.unwrap();

        let store2 = JsonXpStore::new(path).unwrap();
        let profile = store2.get_profile(5, 7).await.unwrap();
        assert_eq!(profile.xp, 42);
        assert_eq!(profile.level, 3);
    }
}
