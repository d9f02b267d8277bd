// In-memory per-guild settings for the onboarding and jail features.
//
// Same lifetime contract as the voice configuration: set by an admin
// command, held for the process lifetime, not persisted.

use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
pub struct JailConfig {
    pub role: u64,
    pub channel: u64,
}

#[derive(Default)]
pub struct GuildSettings {
    welcome_channel: DashMap<u64, u64>,
    verify_role: DashMap<u64, u64>,
    jail: DashMap<u64, JailConfig>,
}

impl GuildSettings {
    pub fn set_welcome_channel(&self, guild_id: u64, channel_id: u64) {
        self.welcome_channel.insert(guild_id, channel_id);
    }

    pub fn welcome_channel(&self, guild_id: u64) -> Option<u64> {
        self.welcome_channel.get(&guild_id).map(|c| *c)
    }

    pub fn set_verify_role(&self, guild_id: u64, role_id: u64) {
        self.verify_role.insert(guild_id, role_id);
    }

    pub fn verify_role(&self, guild_id: u64) -> Option<u64> {
        self.verify_role.get(&guild_id).map(|r| *r)
    }

    pub fn set_jail(&self, guild_id: u64, role: u64, channel: u64) {
        self.jail.insert(guild_id, JailConfig { role, channel });
    }

    pub fn jail(&self, guild_id: u64) -> Option<JailConfig> {
        self.jail.get(&guild_id).map(|j| *j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_are_per_guild() {
        let settings = GuildSettings::default();
        settings.set_welcome_channel(1, 100);
        settings.set_jail(1, 7, 8);

        assert_eq!(settings.welcome_channel(1), Some(100));
        assert_eq!(settings.welcome_channel(2), None);
        assert_eq!(settings.jail(1).map(|j| (j.role, j.channel)), Some((7, 8)));
        assert!(settings.verify_role(1).is_none());
    }
}
