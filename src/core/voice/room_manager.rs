// Temporary voice room management - the core of the voice feature.
// Like the other core modules this is platform-agnostic: it works with
// primitive ids and delegates every Discord side effect to the
// VoicePlatform trait, so the whole lifecycle is testable in isolation.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

/// Name prefix applied to every room this subsystem creates.
///
/// Room recognition on the deletion path goes through this prefix, so
/// `rename` must always re-apply it.
pub const ROOM_PREFIX: &str = "☁️";

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Per-guild configuration for the temporary voice system.
///
/// Set once by an administrator and held for the process lifetime.
/// Not persisted: a restart requires reconfiguration.
#[derive(Debug, Clone, Copy)]
pub struct VoiceConfig {
    /// The "join to create" channel. Entering it spawns a new room.
    pub create_channel: u64,
    /// Category new rooms are placed in. `None` puts them at the top level.
    pub category: Option<u64>,
}

/// Snapshot of the channel a member just left, taken from the gateway
/// cache by the event adapter. The name is needed because managed rooms
/// are recognized by their prefix.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
}

// ============================================================================
// ERRORS
// ============================================================================
// Display strings double as the user-facing refusal messages, so they are
// written for the member invoking the command, not for a log file.

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("The temporary voice system is not set up on this server.")]
    NotConfigured,

    #[error("You are not in a temporary voice room.")]
    NotInRoom,

    #[error("You are not the owner of this room.")]
    NotOwner,

    #[error("The owner is still in the room.")]
    OwnerStillPresent,

    #[error("That member is not in your room.")]
    TargetNotInRoom,

    #[error("Discord call failed: {0}")]
    Platform(String),
}

// ============================================================================
// PLATFORM TRAIT (PORT)
// ============================================================================

/// Everything the room manager needs from Discord, and nothing more.
///
/// The production implementation wraps the serenity HTTP client and cache;
/// tests script occupancy and record calls. `occupants` is a live
/// observation owned by the platform, never tracked here.
#[async_trait]
pub trait VoicePlatform: Send + Sync {
    /// Create a voice channel and return its id.
    async fn create_room(
        &self,
        guild_id: u64,
        name: &str,
        category: Option<u64>,
    ) -> Result<u64, VoiceError>;

    async fn delete_room(&self, room_id: u64) -> Result<(), VoiceError>;

    async fn rename_room(&self, room_id: u64, name: &str) -> Result<(), VoiceError>;

    /// Move a connected member into the given room.
    async fn move_member(
        &self,
        guild_id: u64,
        member_id: u64,
        room_id: u64,
    ) -> Result<(), VoiceError>;

    /// Drop a member from voice entirely.
    async fn disconnect_member(&self, guild_id: u64, member_id: u64) -> Result<(), VoiceError>;

    /// Allow or deny the guild-wide membership role to connect to a room.
    async fn set_everyone_connect(
        &self,
        guild_id: u64,
        room_id: u64,
        allow: bool,
    ) -> Result<(), VoiceError>;

    /// Allow or deny a single member to connect to a room.
    async fn set_member_connect(
        &self,
        room_id: u64,
        member_id: u64,
        allow: bool,
    ) -> Result<(), VoiceError>;

    /// Post the owner-addressed control message into a freshly created room.
    async fn post_control_panel(&self, room_id: u64, owner_id: u64) -> Result<(), VoiceError>;

    /// Members currently connected to the room.
    async fn occupants(&self, guild_id: u64, room_id: u64) -> Result<Vec<u64>, VoiceError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Owns the `room_id -> owner_id` registry and the per-guild configuration,
/// creates rooms on demand, tears them down when empty, and arbitrates the
/// ownership-gated operations.
///
/// Invariants:
/// - a room is in `ownership` iff this manager created it and has not yet
///   deleted it;
/// - a room is deleted exactly when its occupancy reaches zero;
/// - while the owner occupies the room, only the owner may lock, unlock,
///   reject, permit, or rename it;
/// - ownership transfers only when the recorded owner is absent.
pub struct VoiceRoomManager<P: VoicePlatform> {
    platform: P,
    configs: DashMap<u64, VoiceConfig>,
    ownership: DashMap<u64, u64>,
}

impl<P: VoicePlatform> VoiceRoomManager<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            configs: DashMap::new(),
            ownership: DashMap::new(),
        }
    }

    /// Set the designated create channel and target category for a guild.
    /// The adapter resolves "no category given" to the create channel's own
    /// category before calling this, so `category` is already final.
    pub fn configure(&self, guild_id: u64, create_channel: u64, category: Option<u64>) {
        self.configs.insert(
            guild_id,
            VoiceConfig {
                create_channel,
                category,
            },
        );
    }

    pub fn config(&self, guild_id: u64) -> Option<VoiceConfig> {
        self.configs.get(&guild_id).map(|c| *c)
    }

    /// Recorded owner of a room, if the room is managed.
    pub fn owner_of(&self, room_id: u64) -> Option<u64> {
        self.ownership.get(&room_id).map(|o| *o)
    }

    /// True if a channel name marks a room managed by this subsystem.
    pub fn is_managed_name(name: &str) -> bool {
        name.starts_with(ROOM_PREFIX)
    }

    /// React to a member's voice transition.
    ///
    /// Entering the designated create channel spawns a room; the creation
    /// branch is exclusive with the deletion check on the same event.
    /// Leaving a managed room that is now empty tears it down. This is the
    /// only destruction path.
    pub async fn handle_voice_state(
        &self,
        guild_id: u64,
        member_id: u64,
        member_name: &str,
        before: Option<ChannelInfo>,
        after: Option<u64>,
    ) -> Result<(), VoiceError> {
        let config = self.config(guild_id);

        if let (Some(config), Some(joined)) = (config, after) {
            if joined == config.create_channel {
                return self
                    .create_room_for(guild_id, member_id, member_name, config)
                    .await;
            }
        }

        if let Some(left) = before {
            if Self::is_managed_name(&left.name) {
                let occupants = self.platform.occupants(guild_id, left.id).await?;
                if occupants.is_empty() {
                    self.platform.delete_room(left.id).await?;
                    self.ownership.remove(&left.id);
                }
            }
        }

        Ok(())
    }

    /// Create a room for a member who just entered the create channel.
    ///
    /// Side effects run in a fixed order: create, record ownership, move
    /// the member, post the control panel. A failed create commits nothing.
    async fn create_room_for(
        &self,
        guild_id: u64,
        member_id: u64,
        member_name: &str,
        config: VoiceConfig,
    ) -> Result<(), VoiceError> {
        let name = format!("{ROOM_PREFIX} {member_name}'s Room");
        let room_id = self
            .platform
            .create_room(guild_id, &name, config.category)
            .await?;

        self.ownership.insert(room_id, member_id);
        tracing::info!(guild_id, room_id, owner_id = member_id, "voice room created");

        self.platform.move_member(guild_id, member_id, room_id).await?;
        self.platform.post_control_panel(room_id, member_id).await?;
        Ok(())
    }

    /// The single authorization guard shared by every gated operation.
    ///
    /// Resolves the actor's current voice channel to a managed room, or
    /// refuses. `require_owner` is false only for `claim`.
    fn gated_room(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
        require_owner: bool,
    ) -> Result<u64, VoiceError> {
        if !self.configs.contains_key(&guild_id) {
            return Err(VoiceError::NotConfigured);
        }

        let room_id = actor_channel.ok_or(VoiceError::NotInRoom)?;
        let owner_id = self.owner_of(room_id).ok_or(VoiceError::NotInRoom)?;

        if require_owner && owner_id != actor_id {
            return Err(VoiceError::NotOwner);
        }

        Ok(room_id)
    }

    /// Deny the general membership role from connecting to the actor's room.
    pub async fn lock(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
    ) -> Result<(), VoiceError> {
        let room_id = self.gated_room(guild_id, actor_id, actor_channel, true)?;
        self.platform
            .set_everyone_connect(guild_id, room_id, false)
            .await
    }

    /// Allow the general membership role to connect again.
    pub async fn unlock(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
    ) -> Result<(), VoiceError> {
        let room_id = self.gated_room(guild_id, actor_id, actor_channel, true)?;
        self.platform
            .set_everyone_connect(guild_id, room_id, true)
            .await
    }

    /// Disconnect a present member and deny them future connects.
    pub async fn reject(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
        target_id: u64,
    ) -> Result<(), VoiceError> {
        let room_id = self.gated_room(guild_id, actor_id, actor_channel, true)?;

        let occupants = self.platform.occupants(guild_id, room_id).await?;
        if !occupants.contains(&target_id) {
            return Err(VoiceError::TargetNotInRoom);
        }

        self.platform.disconnect_member(guild_id, target_id).await?;
        self.platform
            .set_member_connect(room_id, target_id, false)
            .await
    }

    /// Grant a member connect permission, overriding a lock or prior reject.
    pub async fn permit(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
        target_id: u64,
    ) -> Result<(), VoiceError> {
        let room_id = self.gated_room(guild_id, actor_id, actor_channel, true)?;
        self.platform
            .set_member_connect(room_id, target_id, true)
            .await
    }

    /// Transfer ownership to the actor if the recorded owner is absent.
    ///
    /// A claim by the current owner is a no-op rather than a refusal, so
    /// repeating the command never reports an error.
    pub async fn claim(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
    ) -> Result<(), VoiceError> {
        let room_id = self.gated_room(guild_id, actor_id, actor_channel, false)?;

        // gated_room just proved the entry exists.
        let owner_id = self.owner_of(room_id).ok_or(VoiceError::NotInRoom)?;
        if owner_id == actor_id {
            return Ok(());
        }

        let occupants = self.platform.occupants(guild_id, room_id).await?;
        if occupants.contains(&owner_id) {
            return Err(VoiceError::OwnerStillPresent);
        }

        self.ownership.insert(room_id, actor_id);
        tracing::info!(guild_id, room_id, new_owner = actor_id, "voice room claimed");
        Ok(())
    }

    /// Rename the actor's room, re-applying the managed prefix so the
    /// deletion path keeps recognizing it.
    pub async fn rename(
        &self,
        guild_id: u64,
        actor_id: u64,
        actor_channel: Option<u64>,
        new_name: &str,
    ) -> Result<(), VoiceError> {
        let room_id = self.gated_room(guild_id, actor_id, actor_channel, true)?;
        self.platform
            .rename_room(room_id, &format!("{ROOM_PREFIX} {new_name}"))
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    const GUILD: u64 = 10;
    const CREATE_CHANNEL: u64 = 100;
    const CATEGORY: u64 = 200;

    /// Records every platform call and serves scripted occupancy.
    #[derive(Default)]
    struct MockPlatform {
        calls: Mutex<Vec<String>>,
        occupants: Mutex<HashMap<u64, Vec<u64>>>,
        fail_create: AtomicBool,
        next_room_id: AtomicU64,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                next_room_id: AtomicU64::new(1000),
                ..Default::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn set_occupants(&self, room_id: u64, members: &[u64]) {
            self.occupants
                .lock()
                .unwrap()
                .insert(room_id, members.to_vec());
        }
    }

    #[async_trait]
    impl VoicePlatform for MockPlatform {
        async fn create_room(
            &self,
            guild_id: u64,
            name: &str,
            category: Option<u64>,
        ) -> Result<u64, VoiceError> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(VoiceError::Platform("create refused".to_string()));
            }
            let id = self.next_room_id.fetch_add(1, Ordering::SeqCst);
            self.record(format!("create({guild_id}, {name:?}, {category:?}) -> {id}"));
            Ok(id)
        }

        async fn delete_room(&self, room_id: u64) -> Result<(), VoiceError> {
            self.record(format!("delete({room_id})"));
            Ok(())
        }

        async fn rename_room(&self, room_id: u64, name: &str) -> Result<(), VoiceError> {
            self.record(format!("rename({room_id}, {name:?})"));
            Ok(())
        }

        async fn move_member(
            &self,
            _guild_id: u64,
            member_id: u64,
            room_id: u64,
        ) -> Result<(), VoiceError> {
            self.record(format!("move({member_id} -> {room_id})"));
            Ok(())
        }

        async fn disconnect_member(
            &self,
            _guild_id: u64,
            member_id: u64,
        ) -> Result<(), VoiceError> {
            self.record(format!("disconnect({member_id})"));
            Ok(())
        }

        async fn set_everyone_connect(
            &self,
            _guild_id: u64,
            room_id: u64,
            allow: bool,
        ) -> Result<(), VoiceError> {
            self.record(format!("everyone_connect({room_id}, {allow})"));
            Ok(())
        }

        async fn set_member_connect(
            &self,
            room_id: u64,
            member_id: u64,
            allow: bool,
        ) -> Result<(), VoiceError> {
            self.record(format!("member_connect({room_id}, {member_id}, {allow})"));
            Ok(())
        }

        async fn post_control_panel(&self, room_id: u64, owner_id: u64) -> Result<(), VoiceError> {
            self.record(format!("panel({room_id}, {owner_id})"));
            Ok(())
        }

        async fn occupants(&self, _guild_id: u64, room_id: u64) -> Result<Vec<u64>, VoiceError> {
            Ok(self
                .occupants
                .lock()
                .unwrap()
                .get(&room_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn configured_manager() -> VoiceRoomManager<MockPlatform> {
        let manager = VoiceRoomManager::new(MockPlatform::new());
        manager.configure(GUILD, CREATE_CHANNEL, Some(CATEGORY));
        manager
    }

    /// Spawn a room for `member` and return its id.
    async fn create_room(manager: &VoiceRoomManager<MockPlatform>, member: u64) -> u64 {
        manager
            .handle_voice_state(GUILD, member, "Tester", None, Some(CREATE_CHANNEL))
            .await
            .unwrap();
        let room_id = manager
            .platform
            .calls()
            .iter()
            .find_map(|c| c.rsplit_once("-> ").map(|(_, id)| id.parse().unwrap()))
            .expect("create call recorded");
        manager.platform.clear_calls();
        room_id
    }

    #[tokio::test]
    async fn joining_create_channel_spawns_owned_room() {
        let manager = configured_manager();

        manager
            .handle_voice_state(GUILD, 1, "Alice", None, Some(CREATE_CHANNEL))
            .await
            .unwrap();

        let calls = manager.platform.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("create("));
        assert!(calls[0].contains("☁️ Alice's Room"));
        assert!(calls[1].starts_with("move(1 -> "));
        assert!(calls[2].starts_with("panel("));

        let room_id: u64 = calls[0].rsplit_once("-> ").unwrap().1.parse().unwrap();
        assert_eq!(manager.owner_of(room_id), Some(1));
    }

    #[tokio::test]
    async fn failed_create_commits_nothing() {
        let manager = configured_manager();
        manager.platform.fail_create.store(true, Ordering::SeqCst);

        let result = manager
            .handle_voice_state(GUILD, 1, "Alice", None, Some(CREATE_CHANNEL))
            .await;

        assert!(matches!(result, Err(VoiceError::Platform(_))));
        assert!(manager.ownership.is_empty());
        // No move or panel was attempted.
        assert!(manager.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_guild_ignores_channel_joins() {
        let manager = VoiceRoomManager::new(MockPlatform::new());

        manager
            .handle_voice_state(GUILD, 1, "Alice", None, Some(CREATE_CHANNEL))
            .await
            .unwrap();

        assert!(manager.platform.calls().is_empty());
        assert!(manager.ownership.is_empty());
    }

    #[tokio::test]
    async fn empty_room_is_deleted_and_forgotten() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;
        manager.platform.set_occupants(room_id, &[]);

        manager
            .handle_voice_state(
                GUILD,
                1,
                "Alice",
                Some(ChannelInfo {
                    id: room_id,
                    name: "☁️ Alice's Room".to_string(),
                }),
                None,
            )
            .await
            .unwrap();

        assert_eq!(manager.platform.calls(), vec![format!("delete({room_id})")]);
        assert_eq!(manager.owner_of(room_id), None);
    }

    #[tokio::test]
    async fn occupied_room_survives_a_departure() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;
        manager.platform.set_occupants(room_id, &[2]);

        manager
            .handle_voice_state(
                GUILD,
                1,
                "Alice",
                Some(ChannelInfo {
                    id: room_id,
                    name: "☁️ Alice's Room".to_string(),
                }),
                None,
            )
            .await
            .unwrap();

        assert!(manager.platform.calls().is_empty());
        assert_eq!(manager.owner_of(room_id), Some(1));
    }

    #[tokio::test]
    async fn unmanaged_channel_is_never_deleted() {
        let manager = configured_manager();
        manager.platform.set_occupants(500, &[]);

        manager
            .handle_voice_state(
                GUILD,
                1,
                "Alice",
                Some(ChannelInfo {
                    id: 500,
                    name: "General".to_string(),
                }),
                None,
            )
            .await
            .unwrap();

        assert!(manager.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn lock_and_unlock_are_owner_only() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;

        manager.lock(GUILD, 1, Some(room_id)).await.unwrap();
        manager.unlock(GUILD, 1, Some(room_id)).await.unwrap();
        assert_eq!(
            manager.platform.calls(),
            vec![
                format!("everyone_connect({room_id}, false)"),
                format!("everyone_connect({room_id}, true)"),
            ]
        );

        manager.platform.clear_calls();
        let denied = manager.lock(GUILD, 2, Some(room_id)).await;
        assert!(matches!(denied, Err(VoiceError::NotOwner)));
        assert!(manager.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn gated_operations_require_a_managed_room() {
        let manager = configured_manager();

        assert!(matches!(
            manager.lock(GUILD, 1, None).await,
            Err(VoiceError::NotInRoom)
        ));
        assert!(matches!(
            manager.lock(GUILD, 1, Some(999)).await,
            Err(VoiceError::NotInRoom)
        ));
    }

    #[tokio::test]
    async fn unconfigured_guild_is_reported_distinctly() {
        let manager = VoiceRoomManager::new(MockPlatform::new());

        assert!(matches!(
            manager.lock(GUILD, 1, Some(123)).await,
            Err(VoiceError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn claim_requires_absent_owner() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;

        // Owner still inside: refused.
        manager.platform.set_occupants(room_id, &[1, 2]);
        assert!(matches!(
            manager.claim(GUILD, 2, Some(room_id)).await,
            Err(VoiceError::OwnerStillPresent)
        ));
        assert_eq!(manager.owner_of(room_id), Some(1));

        // Owner left, others remain: the claim succeeds.
        manager.platform.set_occupants(room_id, &[2, 3]);
        manager.claim(GUILD, 2, Some(room_id)).await.unwrap();
        assert_eq!(manager.owner_of(room_id), Some(2));

        // Repeating the claim as the new owner is a quiet no-op.
        manager.claim(GUILD, 2, Some(room_id)).await.unwrap();
        assert_eq!(manager.owner_of(room_id), Some(2));

        // A third occupant is refused while the new owner is present.
        assert!(matches!(
            manager.claim(GUILD, 3, Some(room_id)).await,
            Err(VoiceError::OwnerStillPresent)
        ));
        assert_eq!(manager.owner_of(room_id), Some(2));
    }

    #[tokio::test]
    async fn reject_disconnects_and_denies_then_permit_restores() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;
        manager.platform.set_occupants(room_id, &[1, 7]);

        manager.reject(GUILD, 1, Some(room_id), 7).await.unwrap();
        assert_eq!(
            manager.platform.calls(),
            vec![
                "disconnect(7)".to_string(),
                format!("member_connect({room_id}, 7, false)"),
            ]
        );

        manager.platform.clear_calls();
        manager.permit(GUILD, 1, Some(room_id), 7).await.unwrap();
        assert_eq!(
            manager.platform.calls(),
            vec![format!("member_connect({room_id}, 7, true)")]
        );
        // Ownership never moved.
        assert_eq!(manager.owner_of(room_id), Some(1));
    }

    #[tokio::test]
    async fn reject_requires_target_presence() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;
        manager.platform.set_occupants(room_id, &[1]);

        let result = manager.reject(GUILD, 1, Some(room_id), 7).await;
        assert!(matches!(result, Err(VoiceError::TargetNotInRoom)));
        assert!(manager.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn rename_reapplies_the_managed_prefix() {
        let manager = configured_manager();
        let room_id = create_room(&manager, 1).await;

        manager
            .rename(GUILD, 1, Some(room_id), "late night lounge")
            .await
            .unwrap();

        assert_eq!(
            manager.platform.calls(),
            vec![format!("rename({room_id}, \"☁️ late night lounge\")")]
        );
    }

    #[tokio::test]
    async fn full_lifecycle_create_then_leave_then_delete() {
        let manager = configured_manager();

        manager
            .handle_voice_state(GUILD, 5, "Mona", None, Some(CREATE_CHANNEL))
            .await
            .unwrap();
        let calls = manager.platform.calls();
        let room_id: u64 = calls[0].rsplit_once("-> ").unwrap().1.parse().unwrap();
        assert_eq!(manager.owner_of(room_id), Some(5));
        manager.platform.clear_calls();

        // Mona leaves as the last occupant.
        manager.platform.set_occupants(room_id, &[]);
        manager
            .handle_voice_state(
                GUILD,
                5,
                "Mona",
                Some(ChannelInfo {
                    id: room_id,
                    name: "☁️ Mona's Room".to_string(),
                }),
                None,
            )
            .await
            .unwrap();

        assert_eq!(manager.platform.calls(), vec![format!("delete({room_id})")]);
        assert_eq!(manager.owner_of(room_id), None);
    }
}
