//! Capture and spawn transitions
//!
//! Both entry points normalize what they know into an [`InteractionRequest`]
//! and call [`CaptureSpawnEngine::handle`], which decides between:
//! - capture: a creature is targeted; snapshot it into the held item
//! - spawn: nothing is targeted; release the creature a filled item holds
//!
//! Must run on the world's own queue, since it reads and writes entity and
//! inventory state through [`World`].

use crate::error::{Error, Result};
use crate::host::{CreatureView, InteractionType, PlayerView, Pose, Vector3, World};
use crate::icon::resolve_filled_icon;
use crate::tracker::{CaptureIntent, CaptureTracker};
use std::sync::Arc;
use tamework_core::{
    decode_attachments, encode_attachments, keys, AttachmentMap, CreatureId, EntityHandle,
    FeatureConfig, FeatureRegistry, ItemStack, NetworkId, PlayerId, RoleIndex, SlotIndex,
};
use tamework_store::OwnershipStore;
use tracing::{info, warn};

/// Distance in front of the player a released creature appears
pub const SPAWN_FORWARD_DISTANCE: f64 = 1.5;

/// Height above the player's feet a released creature appears
pub const SPAWN_OFFSET_Y: f64 = 0.5;

/// Marked-target slot creature behaviors use for their owner
pub const BONDED_TARGET_SLOT: &str = "MasterTarget";

/// What an interaction is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// A live entity handed over by the host
    Entity(EntityHandle),
    /// A network id reported by the client
    Network(NetworkId),
}

/// An interaction, normalized from either entry point
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRequest {
    pub player: PlayerId,
    pub action: InteractionType,
    /// The item being used
    pub item: ItemStack,
    /// Hotbar slot holding the item; `None` means the active slot
    pub slot: Option<SlotIndex>,
    pub target: Option<CaptureTarget>,
}

/// Why an interaction did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The item has no feature config
    NoConfig,
    /// The item's config doesn't enable the spawner
    SpawnerDisabled,
    /// Only primary and use actions capture or spawn
    UnsupportedAction,
    /// No item, or no item in the reported slot
    EmptySlot,
    /// The reported slot isn't a hotbar slot
    InvalidSlot,
    /// The item holds no creature to release
    NotFilled,
}

/// What an interaction did
#[derive(Debug)]
pub enum InteractionOutcome {
    Ignored(IgnoreReason),
    /// Capture refused because someone else owns the creature
    Denied { creature: CreatureId, owner: PlayerId },
    Captured {
        creature: CreatureId,
        slot: SlotIndex,
        owner: Option<PlayerId>,
        /// Whether the immediate write to the slot landed
        written: bool,
    },
    Spawned {
        creature: CreatureId,
        handle: EntityHandle,
        owner: Option<PlayerId>,
    },
    Failed(Error),
}

impl InteractionOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, InteractionOutcome::Ignored(_))
    }
}

/// Presentation state copied off a creature before it can disappear
#[derive(Debug, Clone, Default, PartialEq)]
struct CaptureSnapshot {
    attachments: Option<AttachmentMap>,
    attachments_json: Option<String>,
    role_index: Option<RoleIndex>,
    name_key: Option<String>,
    icon_path: Option<String>,
}

impl CaptureSnapshot {
    fn take(world: &dyn World, creature: &CreatureView) -> Self {
        let attachments_json = creature
            .attachments
            .as_ref()
            .and_then(|attachments| match encode_attachments(attachments) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!(entity = %creature.handle, error = %e, "failed to encode attachments");
                    None
                }
            });
        let name_key = creature
            .role_index
            .and_then(|role| world.role_name_key(role))
            .filter(|key| !key.trim().is_empty());
        Self {
            attachments: creature.attachments.clone(),
            attachments_json,
            role_index: creature.role_index,
            name_key,
            icon_path: creature.icon_path.clone(),
        }
    }
}

/// Runs capture and spawn against a world
#[derive(Debug, Clone)]
pub struct CaptureSpawnEngine {
    registry: Arc<FeatureRegistry>,
    store: Arc<OwnershipStore>,
    tracker: Arc<CaptureTracker>,
}

impl CaptureSpawnEngine {
    pub fn new(
        registry: Arc<FeatureRegistry>,
        store: Arc<OwnershipStore>,
        tracker: Arc<CaptureTracker>,
    ) -> Self {
        Self {
            registry,
            store,
            tracker,
        }
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Capture or spawn, depending on whether a target is present
    ///
    /// Never fails outward; problems are logged and reported as
    /// [`InteractionOutcome::Failed`].
    pub fn handle(
        &self,
        world: &dyn World,
        request: &InteractionRequest,
        config: &FeatureConfig,
    ) -> InteractionOutcome {
        if !config.spawner_enabled {
            return InteractionOutcome::Ignored(IgnoreReason::SpawnerDisabled);
        }
        if request.item.is_empty() {
            return InteractionOutcome::Ignored(IgnoreReason::EmptySlot);
        }
        if !request.action.triggers_spawner() {
            info!(action = ?request.action, item = %request.item.item_id, "spawner ignoring action");
            return InteractionOutcome::Ignored(IgnoreReason::UnsupportedAction);
        }
        let Some(player) = world.player(request.player) else {
            warn!(player = %request.player, item = %request.item.item_id, "player not found for interaction");
            return InteractionOutcome::Failed(Error::PlayerNotFound(request.player));
        };

        let result = match request.target {
            Some(target) => self.capture(world, &player, request, target, config),
            None => self.spawn(world, &player, request, config),
        };
        result.unwrap_or_else(|e| {
            warn!(player = %player.id, item = %request.item.item_id, error = %e, "spawner interaction failed");
            InteractionOutcome::Failed(e)
        })
    }

    fn capture(
        &self,
        world: &dyn World,
        player: &PlayerView,
        request: &InteractionRequest,
        target: CaptureTarget,
        config: &FeatureConfig,
    ) -> Result<InteractionOutcome> {
        let item_id = &request.item.item_id;
        // A target that isn't a live creature aborts before anything is written.
        let creature = match target {
            CaptureTarget::Entity(handle) => world
                .creature(handle)
                .ok_or(Error::EntityNotFound(handle))?,
            CaptureTarget::Network(id) => world
                .entity_by_network_id(id)
                .and_then(|handle| world.creature(handle))
                .ok_or(Error::NetworkEntityNotFound(id))?,
        };

        let snapshot = CaptureSnapshot::take(world, &creature);
        info!(
            item = %item_id,
            role = config.role_id().unwrap_or("<none>"),
            model = creature.model_asset_id.as_deref().unwrap_or("<none>"),
            attachments_present = snapshot.attachments_json.is_some(),
            "capture snapshot"
        );
        let resolved_icon = resolve_filled_icon(
            config,
            &self.registry,
            snapshot.attachments.as_ref(),
            item_id.as_str(),
        );

        let existing_owner = self.store.owner_of(creature.id);
        if let Some(owner) = existing_owner {
            if config.owner_restricted && owner != player.id {
                info!(player = %player.id, item = %item_id, creature = %creature.id, %owner, "capture denied, not owner");
                return Ok(InteractionOutcome::Denied {
                    creature: creature.id,
                    owner,
                });
            }
        }
        let owner = if config.capture_clears_owner {
            None
        } else {
            Some(existing_owner.unwrap_or(player.id))
        };

        let slot = request.slot.unwrap_or(player.active_hotbar_slot);
        let mut updated = request
            .item
            .clone()
            .with_metadata(keys::CAPTURED, true)
            .with_metadata(keys::TARGET_UUID, creature.id.as_uuid());
        if let CaptureTarget::Network(id) = target {
            updated = updated.with_metadata(keys::TARGET_ENTITY_ID, id.0);
        }
        if let Some(json) = &snapshot.attachments_json {
            updated = updated.with_metadata(keys::ATTACHMENTS, json.as_str());
        }
        let updated = updated.with_owner(owner);

        let written = match world.set_hotbar_item(player.id, slot, updated) {
            Ok(()) => {
                world.mark_inventory_changed(player.id);
                true
            }
            Err(e) => {
                warn!(player = %player.id, slot, error = %e, "failed to update held item");
                false
            }
        };

        // The host may still swap the slot for a stateful variant, so the
        // resolver gets a chance to stamp whatever lands there.
        let expected = config.filled_item_id().unwrap_or(item_id);
        let mut intent = CaptureIntent::new(expected.as_str());
        intent.slot_hint = Some(slot);
        intent.target_network_id = match target {
            CaptureTarget::Network(id) => Some(id),
            CaptureTarget::Entity(_) => None,
        };
        intent.target_creature = Some(creature.id);
        intent.attachments_json = snapshot.attachments_json;
        intent.role_index = snapshot.role_index;
        intent.name_key = snapshot.name_key;
        intent.icon_path = snapshot.icon_path;
        intent.resolved_icon = resolved_icon;
        intent.owner = owner;
        self.tracker.record(player.id, intent);

        self.store.clear_owner(creature.id);
        if config.capture_clears_owner {
            if let Err(e) = world.set_marked_target(creature.handle, BONDED_TARGET_SLOT, None) {
                warn!(entity = %creature.handle, error = %e, "failed to clear bonded target");
            }
        }

        info!(
            player = %player.id,
            item = %item_id,
            slot,
            entity = ?target,
            capture_clears_owner = config.capture_clears_owner,
            "capture recorded"
        );
        Ok(InteractionOutcome::Captured {
            creature: creature.id,
            slot,
            owner,
            written,
        })
    }

    fn spawn(
        &self,
        world: &dyn World,
        player: &PlayerView,
        request: &InteractionRequest,
        config: &FeatureConfig,
    ) -> Result<InteractionOutcome> {
        let item = &request.item;
        if !is_filled(item, config) {
            info!(item = %item.item_id, "spawn ignored, item not filled");
            return Ok(InteractionOutcome::Ignored(IgnoreReason::NotFilled));
        }

        let role_id = config
            .role_id()
            .ok_or_else(|| Error::MissingRole(item.item_id.clone()))?;
        let role = world
            .role_index(role_id)
            .ok_or_else(|| Error::RoleNotFound(role_id.to_string()))?;

        let pose = spawn_pose(&player.pose);
        let spawned = world.spawn_creature(role, &pose)?;
        self.apply_stored_attachments(world, item, spawned.handle);

        let owner = item
            .owner()
            .or_else(|| config.spawn_assigns_owner.then_some(player.id));
        if let Some(owner) = owner {
            self.store.set_owner(spawned.id, Some(owner));
        }
        if config.spawn_assigns_owner {
            // Bond to the owner if they're around, otherwise to whoever released it.
            let bonded = owner
                .and_then(|owner| world.player(owner))
                .map(|view| view.handle)
                .unwrap_or(player.handle);
            if let Err(e) = world.set_marked_target(spawned.handle, BONDED_TARGET_SLOT, Some(bonded)) {
                warn!(entity = %spawned.handle, error = %e, "failed to set bonded target");
            }
        }

        info!(
            player = %player.id,
            item = %item.item_id,
            role = role_id,
            creature = %spawned.id,
            spawn_assigns_owner = config.spawn_assigns_owner,
            "spawn completed"
        );
        Ok(InteractionOutcome::Spawned {
            creature: spawned.id,
            handle: spawned.handle,
            owner,
        })
    }

    fn apply_stored_attachments(&self, world: &dyn World, item: &ItemStack, creature: EntityHandle) {
        let Some(json) = item.attachments_json().filter(|json| !json.trim().is_empty()) else {
            return;
        };
        let attachments = match decode_attachments(json) {
            Ok(attachments) => attachments,
            Err(e) => {
                warn!(item = %item.item_id, error = %e, "failed to parse stored attachments");
                return;
            }
        };
        if let Err(e) = world.apply_attachments(creature, &attachments) {
            warn!(entity = %creature, error = %e, "failed to apply attachments");
        }
    }
}

/// Whether an item holds a creature that can be released
pub fn is_filled(item: &ItemStack, config: &FeatureConfig) -> bool {
    item.item_id.is_stateful()
        || item.captured_flag() == Some(true)
        || config.spawner_allow_uncaptured
}

/// Pose a released creature spawns at, in front of `player`
pub fn spawn_pose(player: &Pose) -> Pose {
    let yaw = f64::from(player.facing_yaw());
    let forward = Vector3::new(-yaw.sin(), 0.0, -yaw.cos());
    let position = Vector3::new(
        player.position.x + forward.x * SPAWN_FORWARD_DISTANCE,
        player.position.y + SPAWN_OFFSET_Y,
        player.position.z + forward.z * SPAWN_FORWARD_DISTANCE,
    );
    Pose::new(position, player.rotation)
}
