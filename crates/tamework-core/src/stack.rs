//! Item stacks and the metadata keys tamework reads and writes
//!
//! The host owns item stacks; tamework only touches the keys listed in
//! [`keys`]. Stacks behave like immutable values: the `with_*` methods return
//! an updated copy that the caller writes back into a container slot.

use crate::identity::{CreatureId, NetworkId, PlayerId, RoleIndex};
use crate::item::ItemId;
use crate::value::{Value, ValueMap};
use serde::{Deserialize, Serialize};

/// Metadata keys owned by tamework
pub mod keys {
    /// `bool`: the item holds a captured creature
    pub const CAPTURED: &str = "Tamework.Captured";
    /// `string`: persistent id of the captured creature
    pub const TARGET_UUID: &str = "Tamework.TargetUuid";
    /// `int`: network id of the captured creature at capture time
    pub const TARGET_ENTITY_ID: &str = "Tamework.TargetEntityId";
    /// `string`: JSON object of the creature's attachments
    pub const ATTACHMENTS: &str = "Tamework.Attachments";
    /// `string`: persistent id of the owner to restore on release
    pub const OWNER_UUID: &str = "Tamework.OwnerUuid";
    /// `map`: captured creature descriptor shown by the host UI
    pub const CAPTURED_CREATURE: &str = "CapturedNPC";
}

/// Descriptor of the creature held by a filled item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedCreature {
    pub role_index: RoleIndex,
    pub name_key: Option<String>,
    pub icon_path: Option<String>,
    pub full_item_icon: Option<String>,
}

impl CapturedCreature {
    pub fn new(role_index: RoleIndex) -> Self {
        Self {
            role_index,
            name_key: None,
            icon_path: None,
            full_item_icon: None,
        }
    }

    /// Encode as a metadata map
    pub fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("RoleIndex".into(), self.role_index.0.into());
        if let Some(name_key) = &self.name_key {
            map.insert("NpcNameKey".into(), name_key.as_str().into());
        }
        if let Some(icon_path) = &self.icon_path {
            map.insert("IconPath".into(), icon_path.as_str().into());
        }
        if let Some(full_item_icon) = &self.full_item_icon {
            map.insert("FullItemIcon".into(), full_item_icon.as_str().into());
        }
        Value::Map(map)
    }

    /// Decode from a metadata map; `None` when the role index is missing
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_map()?;
        let role_index = map
            .get("RoleIndex")
            .and_then(Value::as_int)
            .and_then(|raw| u32::try_from(raw).ok())?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            role_index: RoleIndex(role_index),
            name_key: text("NpcNameKey"),
            icon_path: text("IconPath"),
            full_item_icon: text("FullItemIcon"),
        })
    }
}

/// A stack of items occupying one container slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub quantity: u32,
    metadata: ValueMap,
}

impl ItemStack {
    /// Create a stack with no metadata
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            metadata: ValueMap::new(),
        }
    }

    /// Create a single item
    pub fn single(item_id: impl Into<ItemId>) -> Self {
        Self::new(item_id, 1)
    }

    /// An empty stack holds nothing usable
    pub fn is_empty(&self) -> bool {
        self.quantity == 0 || self.item_id.is_blank()
    }

    /// All metadata in insertion order
    pub fn metadata(&self) -> &ValueMap {
        &self.metadata
    }

    /// Get one metadata value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Check if a metadata key is present
    pub fn has(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// Return a copy with `key` set to `value`
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Return a copy without `key`
    pub fn without_metadata(mut self, key: &str) -> Self {
        self.metadata.shift_remove(key);
        self
    }

    /// The `captured` flag, if the key is present and boolean
    pub fn captured_flag(&self) -> Option<bool> {
        self.get(keys::CAPTURED).and_then(Value::as_bool)
    }

    /// Owner recorded on the item
    pub fn owner(&self) -> Option<PlayerId> {
        self.get(keys::OWNER_UUID)
            .and_then(Value::as_uuid)
            .map(PlayerId)
    }

    /// Persistent id of the creature the item captured
    pub fn target_creature(&self) -> Option<CreatureId> {
        self.get(keys::TARGET_UUID)
            .and_then(Value::as_uuid)
            .map(CreatureId)
    }

    /// Network id of the creature the item captured
    pub fn target_network_id(&self) -> Option<NetworkId> {
        self.get(keys::TARGET_ENTITY_ID)
            .and_then(Value::as_int)
            .and_then(|raw| i32::try_from(raw).ok())
            .map(NetworkId)
    }

    /// Raw attachment JSON stored on the item
    pub fn attachments_json(&self) -> Option<&str> {
        self.get(keys::ATTACHMENTS).and_then(Value::as_str)
    }

    /// Captured creature descriptor
    pub fn captured_creature(&self) -> Option<CapturedCreature> {
        self.get(keys::CAPTURED_CREATURE)
            .and_then(CapturedCreature::from_value)
    }

    /// Return a copy with the owner key set, or removed when `owner` is `None`
    pub fn with_owner(self, owner: Option<PlayerId>) -> Self {
        match owner {
            Some(owner) => self.with_metadata(keys::OWNER_UUID, owner.as_uuid()),
            None => self.without_metadata(keys::OWNER_UUID),
        }
    }

    /// Return a copy carrying the captured creature descriptor
    pub fn with_captured_creature(self, creature: &CapturedCreature) -> Self {
        self.with_metadata(keys::CAPTURED_CREATURE, creature.to_value())
    }
}
