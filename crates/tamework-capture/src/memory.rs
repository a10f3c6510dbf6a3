//! In-memory host
//!
//! A single-process [`World`] and [`Universe`] for tests, demos and tools.
//! Queued tasks don't run on their own; call [`MemoryWorld::run_pending`]
//! to drain the queue the way a host tick would.
//!
//! Every hotbar write is also recorded as an [`InventoryChange`], which
//! callers can drain and feed to the inventory resolver.

use crate::error::{Error, Result};
use crate::host::{
    Container, CreatureView, InventoryChange, PlayerView, Pose, SlotChange, Transaction, Universe,
    World, WorldTask,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tamework_core::{
    AttachmentMap, CreatureId, EntityHandle, ItemStack, NetworkId, PlayerId, RoleIndex, SlotIndex,
};

#[derive(Debug)]
struct MemoryPlayer {
    view: PlayerView,
    hotbar: Vec<Option<ItemStack>>,
    hotbar_locked: bool,
    inventory_revision: u64,
}

#[derive(Debug)]
struct MemoryCreature {
    view: CreatureView,
    network_id: NetworkId,
    pose: Pose,
}

#[derive(Debug)]
struct MemoryRole {
    id: String,
    name_key: Option<String>,
}

#[derive(Debug, Default)]
struct WorldState {
    players: HashMap<PlayerId, MemoryPlayer>,
    creatures: HashMap<EntityHandle, MemoryCreature>,
    network_ids: HashMap<NetworkId, EntityHandle>,
    roles: Vec<MemoryRole>,
    marked_targets: HashMap<(EntityHandle, String), EntityHandle>,
    changes: Vec<InventoryChange>,
    next_handle: u64,
    next_network_id: i32,
}

impl WorldState {
    fn allocate(&mut self) -> (EntityHandle, NetworkId) {
        self.next_handle += 1;
        self.next_network_id += 1;
        (EntityHandle(self.next_handle), NetworkId(self.next_network_id))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut MemoryPlayer> {
        self.players.get_mut(&id).ok_or(Error::PlayerNotFound(id))
    }
}

/// A world kept entirely in memory
#[derive(Default)]
pub struct MemoryWorld {
    state: Mutex<WorldState>,
    queue: Mutex<VecDeque<WorldTask>>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player with an empty hotbar of `capacity` slots
    pub fn add_player(
        &self,
        id: PlayerId,
        display_name: &str,
        pose: Pose,
        capacity: SlotIndex,
    ) -> EntityHandle {
        let mut state = self.state.lock();
        let (handle, _) = state.allocate();
        let view = PlayerView {
            id,
            display_name: display_name.to_string(),
            handle,
            pose,
            active_hotbar_slot: 0,
        };
        state.players.insert(
            id,
            MemoryPlayer {
                view,
                hotbar: vec![None; usize::from(capacity)],
                hotbar_locked: false,
                inventory_revision: 0,
            },
        );
        handle
    }

    /// Move a player
    pub fn set_pose(&self, player: PlayerId, pose: Pose) {
        if let Some(player) = self.state.lock().players.get_mut(&player) {
            player.view.pose = pose;
        }
    }

    /// Select a hotbar slot
    pub fn set_active_slot(&self, player: PlayerId, slot: SlotIndex) {
        if let Some(player) = self.state.lock().players.get_mut(&player) {
            player.view.active_hotbar_slot = slot;
        }
    }

    /// Make later hotbar writes for `player` fail, or succeed again
    pub fn lock_hotbar(&self, player: PlayerId, locked: bool) {
        if let Some(player) = self.state.lock().players.get_mut(&player) {
            player.hotbar_locked = locked;
        }
    }

    /// Put an item into a hotbar slot without recording a change
    pub fn give_item(&self, player: PlayerId, slot: SlotIndex, stack: ItemStack) {
        let mut state = self.state.lock();
        if let Some(slot) = state
            .players
            .get_mut(&player)
            .and_then(|player| player.hotbar.get_mut(usize::from(slot)))
        {
            *slot = Some(stack);
        }
    }

    /// Swap the item in a slot for a variant with a new id and no metadata,
    /// the way hosts replace items with stateful variants
    pub fn replace_with_variant(&self, player: PlayerId, slot: SlotIndex, item_id: &str) -> Result<()> {
        let current = self.hotbar_item(player, slot);
        let quantity = current.as_ref().map_or(1, |stack| stack.quantity);
        self.set_hotbar_item(player, slot, ItemStack::new(item_id, quantity))
    }

    /// Register a role, returning its index
    pub fn add_role(&self, role_id: &str, name_key: Option<&str>) -> RoleIndex {
        let mut state = self.state.lock();
        state.roles.push(MemoryRole {
            id: role_id.to_string(),
            name_key: name_key.map(str::to_string),
        });
        RoleIndex(u32::try_from(state.roles.len() - 1).unwrap_or(u32::MAX))
    }

    /// Place a creature of `role` at the origin
    pub fn add_creature(
        &self,
        role: RoleIndex,
        attachments: Option<AttachmentMap>,
        icon_path: Option<&str>,
    ) -> (EntityHandle, NetworkId, CreatureId) {
        let mut state = self.state.lock();
        let (handle, network_id) = state.allocate();
        let id = CreatureId::random();
        let model_asset_id = state
            .roles
            .get(role.0 as usize)
            .map(|role| role.id.clone());
        state.network_ids.insert(network_id, handle);
        state.creatures.insert(
            handle,
            MemoryCreature {
                view: CreatureView {
                    handle,
                    id,
                    role_index: Some(role),
                    model_asset_id,
                    attachments,
                    icon_path: icon_path.map(str::to_string),
                },
                network_id,
                pose: Pose::default(),
            },
        );
        (handle, network_id, id)
    }

    /// Remove a creature from the world
    pub fn despawn(&self, handle: EntityHandle) {
        let mut state = self.state.lock();
        if let Some(creature) = state.creatures.remove(&handle) {
            state.network_ids.remove(&creature.network_id);
        }
        state.marked_targets.retain(|(owner, _), _| *owner != handle);
    }

    /// Where a creature stands
    pub fn creature_pose(&self, handle: EntityHandle) -> Option<Pose> {
        self.state.lock().creatures.get(&handle).map(|c| c.pose)
    }

    /// Network id of a live creature
    pub fn network_id_of(&self, handle: EntityHandle) -> Option<NetworkId> {
        self.state.lock().creatures.get(&handle).map(|c| c.network_id)
    }

    /// Number of live creatures
    pub fn creature_count(&self) -> usize {
        self.state.lock().creatures.len()
    }

    /// Current marked target in a creature's behavior slot
    pub fn marked_target(&self, creature: EntityHandle, slot: &str) -> Option<EntityHandle> {
        self.state
            .lock()
            .marked_targets
            .get(&(creature, slot.to_string()))
            .copied()
    }

    /// How many times a player's inventory was flagged for resync
    pub fn inventory_revision(&self, player: PlayerId) -> u64 {
        self.state
            .lock()
            .players
            .get(&player)
            .map_or(0, |player| player.inventory_revision)
    }

    /// Take every inventory change recorded since the last call
    pub fn drain_inventory_changes(&self) -> Vec<InventoryChange> {
        std::mem::take(&mut self.state.lock().changes)
    }

    /// Number of tasks waiting in the queue
    pub fn pending_tasks(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run queued tasks until the queue is empty, including tasks queued
    /// while draining
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.queue.lock().pop_front();
            let Some(task) = task else {
                break;
            };
            task(self);
            ran += 1;
        }
        ran
    }
}

impl World for MemoryWorld {
    fn execute(&self, task: WorldTask) {
        self.queue.lock().push_back(task);
    }

    fn player(&self, id: PlayerId) -> Option<PlayerView> {
        self.state.lock().players.get(&id).map(|p| p.view.clone())
    }

    fn entity_by_network_id(&self, id: NetworkId) -> Option<EntityHandle> {
        if !id.is_valid() {
            return None;
        }
        self.state.lock().network_ids.get(&id).copied()
    }

    fn creature(&self, handle: EntityHandle) -> Option<CreatureView> {
        self.state.lock().creatures.get(&handle).map(|c| c.view.clone())
    }

    fn hotbar_capacity(&self, player: PlayerId) -> Option<SlotIndex> {
        self.state
            .lock()
            .players
            .get(&player)
            .map(|p| SlotIndex::try_from(p.hotbar.len()).unwrap_or(SlotIndex::MAX))
    }

    fn hotbar_item(&self, player: PlayerId, slot: SlotIndex) -> Option<ItemStack> {
        self.state
            .lock()
            .players
            .get(&player)
            .and_then(|p| p.hotbar.get(usize::from(slot)).cloned().flatten())
    }

    fn set_hotbar_item(&self, player: PlayerId, slot: SlotIndex, stack: ItemStack) -> Result<()> {
        let mut state = self.state.lock();
        let memory = state.player_mut(player)?;
        if memory.hotbar_locked {
            return Err(Error::HotbarLocked(player));
        }
        let capacity = SlotIndex::try_from(memory.hotbar.len()).unwrap_or(SlotIndex::MAX);
        let cell = memory
            .hotbar
            .get_mut(usize::from(slot))
            .ok_or(Error::SlotOutOfRange { slot, capacity })?;
        let before = cell.replace(stack.clone());
        state.changes.push(InventoryChange {
            player,
            container: Container::Hotbar,
            transaction: Transaction::ItemStack(vec![SlotChange {
                slot,
                before,
                after: Some(stack),
            }]),
        });
        Ok(())
    }

    fn mark_inventory_changed(&self, player: PlayerId) {
        if let Some(player) = self.state.lock().players.get_mut(&player) {
            player.inventory_revision += 1;
        }
    }

    fn role_index(&self, role_id: &str) -> Option<RoleIndex> {
        self.state
            .lock()
            .roles
            .iter()
            .position(|role| role.id == role_id)
            .and_then(|index| u32::try_from(index).ok())
            .map(RoleIndex)
    }

    fn role_name_key(&self, role: RoleIndex) -> Option<String> {
        self.state
            .lock()
            .roles
            .get(role.0 as usize)
            .and_then(|role| role.name_key.clone())
    }

    fn spawn_creature(&self, role: RoleIndex, pose: &Pose) -> Result<CreatureView> {
        let mut state = self.state.lock();
        let role_id = state
            .roles
            .get(role.0 as usize)
            .map(|role| role.id.clone())
            .ok_or_else(|| Error::RoleNotFound(role.to_string()))?;
        let (handle, network_id) = state.allocate();
        let view = CreatureView {
            handle,
            id: CreatureId::random(),
            role_index: Some(role),
            model_asset_id: Some(role_id),
            attachments: Some(AttachmentMap::new()),
            icon_path: None,
        };
        state.network_ids.insert(network_id, handle);
        state.creatures.insert(
            handle,
            MemoryCreature {
                view: view.clone(),
                network_id,
                pose: *pose,
            },
        );
        Ok(view)
    }

    fn apply_attachments(&self, creature: EntityHandle, attachments: &AttachmentMap) -> Result<()> {
        let mut state = self.state.lock();
        let creature = state
            .creatures
            .get_mut(&creature)
            .ok_or(Error::EntityNotFound(creature))?;
        if creature.view.model_asset_id.is_none() {
            return Err(Error::MissingModelAsset(creature.view.handle));
        }
        creature.view.attachments = Some(attachments.clone());
        Ok(())
    }

    fn set_marked_target(
        &self,
        creature: EntityHandle,
        slot: &str,
        target: Option<EntityHandle>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if !state.creatures.contains_key(&creature) {
            return Err(Error::EntityNotFound(creature));
        }
        let key = (creature, slot.to_string());
        match target {
            Some(target) => {
                state.marked_targets.insert(key, target);
            }
            None => {
                state.marked_targets.remove(&key);
            }
        }
        Ok(())
    }
}

/// Worlds keyed by the players living in them
#[derive(Default)]
pub struct MemoryUniverse {
    placements: RwLock<HashMap<PlayerId, Arc<dyn World>>>,
}

impl MemoryUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `player` lives in `world`
    pub fn place(&self, player: PlayerId, world: Arc<dyn World>) {
        self.placements.write().insert(player, world);
    }

    /// Forget where `player` lives
    pub fn remove(&self, player: PlayerId) {
        self.placements.write().remove(&player);
    }
}

impl Universe for MemoryUniverse {
    fn world_of(&self, player: PlayerId) -> Option<Arc<dyn World>> {
        self.placements.read().get(&player).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotbar_writes_record_changes() {
        let world = MemoryWorld::new();
        let player = PlayerId::random();
        world.add_player(player, "p", Pose::default(), 4);
        world.give_item(player, 1, ItemStack::single("Net"));

        world
            .set_hotbar_item(player, 1, ItemStack::single("Net_State_Full"))
            .unwrap();
        let changes = world.drain_inventory_changes();
        assert_eq!(changes.len(), 1);
        let Transaction::ItemStack(slots) = &changes[0].transaction else {
            panic!("expected item stack transaction");
        };
        assert_eq!(slots[0].slot, 1);
        assert_eq!(slots[0].before, Some(ItemStack::single("Net")));
        assert!(world.drain_inventory_changes().is_empty());
    }

    #[test]
    fn test_out_of_range_slot() {
        let world = MemoryWorld::new();
        let player = PlayerId::random();
        world.add_player(player, "p", Pose::default(), 2);
        assert!(matches!(
            world.set_hotbar_item(player, 5, ItemStack::single("Net")),
            Err(Error::SlotOutOfRange { slot: 5, capacity: 2 })
        ));
        assert!(matches!(
            world.set_hotbar_item(PlayerId::random(), 0, ItemStack::single("Net")),
            Err(Error::PlayerNotFound(_))
        ));
    }

    #[test]
    fn test_locked_hotbar_rejects_writes() {
        let world = MemoryWorld::new();
        let player = PlayerId::random();
        world.add_player(player, "p", Pose::default(), 2);
        world.lock_hotbar(player, true);
        assert!(matches!(
            world.set_hotbar_item(player, 0, ItemStack::single("Net")),
            Err(Error::HotbarLocked(_))
        ));
        assert!(world.hotbar_item(player, 0).is_none());
        assert!(world.drain_inventory_changes().is_empty());

        world.lock_hotbar(player, false);
        assert!(world.set_hotbar_item(player, 0, ItemStack::single("Net")).is_ok());
    }

    #[test]
    fn test_queue_runs_nested_tasks() {
        let world = MemoryWorld::new();
        let player = PlayerId::random();
        world.add_player(player, "p", Pose::default(), 1);

        world.execute(Box::new(move |world: &dyn World| {
            world.execute(Box::new(move |world: &dyn World| {
                world.mark_inventory_changed(player);
            }));
        }));
        assert_eq!(world.pending_tasks(), 1);
        assert_eq!(world.run_pending(), 2);
        assert_eq!(world.inventory_revision(player), 1);
    }

    #[test]
    fn test_network_lookup_and_despawn() {
        let world = MemoryWorld::new();
        let role = world.add_role("Fox", Some("npc.fox"));
        let (handle, network_id, _) = world.add_creature(role, None, None);

        assert_eq!(world.entity_by_network_id(network_id), Some(handle));
        assert_eq!(world.entity_by_network_id(NetworkId(0)), None);
        assert_eq!(world.role_name_key(role).as_deref(), Some("npc.fox"));
        assert_eq!(world.role_index("Fox"), Some(role));

        world.despawn(handle);
        assert_eq!(world.entity_by_network_id(network_id), None);
        assert!(world.creature(handle).is_none());
    }

    #[test]
    fn test_universe_placement() {
        let universe = MemoryUniverse::new();
        let player = PlayerId::random();
        assert!(universe.world_of(player).is_none());
        universe.place(player, Arc::new(MemoryWorld::new()));
        assert!(universe.world_of(player).is_some());
        universe.remove(player);
        assert!(universe.world_of(player).is_none());
    }
}
