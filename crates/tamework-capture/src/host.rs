//! Host seam - the slice of the game host tamework talks to
//!
//! Hosts implement [`World`] and [`Universe`] for their engine. Every method
//! on [`World`] must only be called from that world's own execution queue;
//! code running elsewhere hands work over with [`World::execute`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tamework_core::{
    AttachmentMap, CreatureId, EntityHandle, ItemStack, NetworkId, PlayerId, RoleIndex, SlotIndex,
};

/// Work queued onto a world's execution queue
pub type WorldTask = Box<dyn FnOnce(&dyn World) + Send + 'static>;

/// Kind of interaction a player performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    Primary,
    Secondary,
    Use,
    Pick,
    Other,
}

impl InteractionType {
    /// Capture and spawn only react to these
    pub fn triggers_spawner(&self) -> bool {
        matches!(self, InteractionType::Primary | InteractionType::Use)
    }
}

/// Position in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Body rotation in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Where an entity stands and which way it faces
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    pub rotation: Rotation,
    /// Head yaw in radians, when the entity tracks it separately
    pub head_yaw: Option<f32>,
}

impl Pose {
    pub fn new(position: Vector3, rotation: Rotation) -> Self {
        Self {
            position,
            rotation,
            head_yaw: None,
        }
    }

    /// Head yaw when known, body yaw otherwise
    pub fn facing_yaw(&self) -> f32 {
        self.head_yaw.unwrap_or(self.rotation.yaw)
    }
}

/// A player as seen from inside their world
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: String,
    pub handle: EntityHandle,
    pub pose: Pose,
    pub active_hotbar_slot: SlotIndex,
}

/// Presentation state of a live creature
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureView {
    pub handle: EntityHandle,
    pub id: CreatureId,
    pub role_index: Option<RoleIndex>,
    pub model_asset_id: Option<String>,
    /// Appearance attachments; `None` when the creature has no model
    pub attachments: Option<AttachmentMap>,
    /// Icon of the creature's model asset
    pub icon_path: Option<String>,
}

/// Which inventory container a change happened in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Hotbar,
    Storage,
    Armor,
    Other(String),
}

/// Before and after state of one container slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotChange {
    pub slot: SlotIndex,
    pub before: Option<ItemStack>,
    pub after: Option<ItemStack>,
}

/// What kind of inventory transaction produced a change
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    /// Slot-level item stack changes, in host order
    ItemStack(Vec<SlotChange>),
    /// Any other transaction kind
    Other,
}

/// Inventory change notification for one player
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryChange {
    pub player: PlayerId,
    pub container: Container,
    pub transaction: Transaction,
}

/// One simulation region with its own single-threaded queue
pub trait World: Send + Sync {
    /// Queue work to run on this world's thread
    fn execute(&self, task: WorldTask);

    /// Look up a player in this world
    fn player(&self, id: PlayerId) -> Option<PlayerView>;

    /// Resolve a network id to a live entity
    fn entity_by_network_id(&self, id: NetworkId) -> Option<EntityHandle>;

    /// Presentation state of a live creature
    fn creature(&self, handle: EntityHandle) -> Option<CreatureView>;

    /// Number of hotbar slots the player has
    fn hotbar_capacity(&self, player: PlayerId) -> Option<SlotIndex>;

    /// Item in one hotbar slot; `None` for an empty slot
    fn hotbar_item(&self, player: PlayerId, slot: SlotIndex) -> Option<ItemStack>;

    /// Replace the item in one hotbar slot
    fn set_hotbar_item(&self, player: PlayerId, slot: SlotIndex, stack: ItemStack) -> Result<()>;

    /// Flag the player's inventory for resync
    fn mark_inventory_changed(&self, player: PlayerId);

    /// Index of a role id in the host role table
    fn role_index(&self, role_id: &str) -> Option<RoleIndex>;

    /// Display-name key of a role
    fn role_name_key(&self, role: RoleIndex) -> Option<String>;

    /// Spawn a creature of `role` at `pose`
    fn spawn_creature(&self, role: RoleIndex, pose: &Pose) -> Result<CreatureView>;

    /// Replace a creature's appearance attachments and rebuild its model
    fn apply_attachments(&self, creature: EntityHandle, attachments: &AttachmentMap) -> Result<()>;

    /// Set or clear a named marked-target slot on a creature's behavior
    fn set_marked_target(
        &self,
        creature: EntityHandle,
        slot: &str,
        target: Option<EntityHandle>,
    ) -> Result<()>;
}

/// All worlds known to the host
pub trait Universe: Send + Sync {
    /// The world a player currently lives in
    fn world_of(&self, player: PlayerId) -> Option<Arc<dyn World>>;
}
