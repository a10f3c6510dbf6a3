//! Inventory resolver
//!
//! Watches hotbar changes for players with a pending capture. When the
//! captured item (or a stateful variant of it) shows up in a changed slot,
//! a stamp task is queued on the player's world. The task re-reads the slot
//! and writes the full capture metadata there.

use crate::host::{Container, InventoryChange, SlotChange, Transaction, World};
use crate::tracker::{CaptureTracker, PendingCapture};
use std::sync::Arc;
use tamework_core::{keys, CapturedCreature, FeatureRegistry, ItemStack, PlayerId, SlotIndex};
use tracing::{debug, info, warn};

/// What an inventory change led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The player has no pending capture
    NoPending,
    /// The pending capture timed out and was dropped
    Expired,
    /// The change wasn't in the hotbar
    NotHotbar,
    /// The change wasn't a slot-level item transaction
    NotItemTransaction,
    /// Nothing matched and there was no slot hint to fall back on
    NoCandidate,
    /// A stamp task was queued for `slot`
    Scheduled { slot: SlotIndex },
}

/// What a stamp task did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampOutcome {
    Stamped { slot: SlotIndex },
    /// The hinted slot no longer holds the expected item
    SlotMismatch { slot: SlotIndex },
    /// No hotbar slot holds the expected item
    NoMatch,
    /// The host refused the write to `slot`
    WriteFailed { slot: SlotIndex },
    /// The player left the world before the task ran
    PlayerMissing,
}

/// Finishes pending captures once the inventory settles
#[derive(Debug, Clone)]
pub struct InventoryResolver {
    registry: Arc<FeatureRegistry>,
    tracker: Arc<CaptureTracker>,
}

impl InventoryResolver {
    pub fn new(registry: Arc<FeatureRegistry>, tracker: Arc<CaptureTracker>) -> Self {
        Self { registry, tracker }
    }

    /// React to an inventory change on `world`
    pub fn on_inventory_change(&self, world: &dyn World, change: &InventoryChange) -> ResolveOutcome {
        let player = change.player;
        let Some(pending) = self.tracker.get(player) else {
            return ResolveOutcome::NoPending;
        };
        if self.tracker.is_expired(&pending) {
            debug!(%player, item = %pending.intent.expected_item, "pending capture expired");
            self.tracker.clear(player);
            return ResolveOutcome::Expired;
        }
        if change.container != Container::Hotbar {
            return ResolveOutcome::NotHotbar;
        }
        let Transaction::ItemStack(slots) = &change.transaction else {
            return ResolveOutcome::NotItemTransaction;
        };

        let hint = pending.intent.slot_hint;
        let Some(slot) = self.pick_slot(slots, &pending).or(hint) else {
            debug!(%player, item = %pending.intent.expected_item, "no candidate slot for pending capture");
            return ResolveOutcome::NoCandidate;
        };

        let resolver = self.clone();
        world.execute(Box::new(move |world: &dyn World| {
            resolver.stamp(world, player, &pending, slot);
        }));
        ResolveOutcome::Scheduled { slot }
    }

    /// Choose the changed slot to stamp
    ///
    /// The hinted slot wins outright, then the first stateful variant, then
    /// the first matching item.
    fn pick_slot(&self, slots: &[SlotChange], pending: &PendingCapture) -> Option<SlotIndex> {
        let hint = pending.intent.slot_hint;
        let mut chosen: Option<(SlotIndex, bool)> = None;
        for change in slots {
            let Some(after) = change.after.as_ref().filter(|after| !after.is_empty()) else {
                continue;
            };
            if !pending.intent.matches_item(&after.item_id)
                || self.registry.get(after.item_id.as_str()).is_none()
            {
                continue;
            }
            if hint == Some(change.slot) {
                return Some(change.slot);
            }
            let stateful = after.item_id.is_stateful();
            match chosen {
                None => chosen = Some((change.slot, stateful)),
                Some((_, false)) if stateful => chosen = Some((change.slot, true)),
                _ => {}
            }
        }
        chosen.map(|(slot, _)| slot)
    }

    /// Write the pending capture onto the live item in `preferred_slot`
    ///
    /// With a slot hint, a mismatch aborts. Without one, the whole hotbar
    /// is scanned for the first matching item.
    pub fn stamp(
        &self,
        world: &dyn World,
        player: PlayerId,
        pending: &PendingCapture,
        preferred_slot: SlotIndex,
    ) -> StampOutcome {
        let Some(capacity) = world.player(player).and(world.hotbar_capacity(player)) else {
            return StampOutcome::PlayerMissing;
        };
        let matches = |stack: &Option<ItemStack>| {
            stack
                .as_ref()
                .is_some_and(|stack| !stack.is_empty() && pending.intent.matches_item(&stack.item_id))
        };

        let mut slot = preferred_slot;
        let mut live = world.hotbar_item(player, slot);
        if !matches(&live) {
            if pending.intent.slot_hint.is_some() {
                info!(
                    %player,
                    slot,
                    item = %pending.intent.expected_item,
                    "capture stamp skipped, slot mismatch"
                );
                return StampOutcome::SlotMismatch { slot };
            }
            let found = (0..capacity)
                .map(|index| (index, world.hotbar_item(player, index)))
                .find(|(_, stack)| matches(stack));
            match found {
                Some((index, stack)) => {
                    slot = index;
                    live = stack;
                }
                None => return StampOutcome::NoMatch,
            }
        }
        let Some(live) = live else {
            return StampOutcome::NoMatch;
        };

        let updated = stamp_item(live, pending);
        let item_id = updated.item_id.clone();
        if let Err(e) = world.set_hotbar_item(player, slot, updated) {
            warn!(%player, slot, error = %e, "capture stamp failed");
            return StampOutcome::WriteFailed { slot };
        }
        world.mark_inventory_changed(player);
        if !self.tracker.consume_if_current(pending) {
            debug!(%player, "newer capture recorded while stamping, keeping it pending");
        }

        info!(%player, slot, item = %item_id, "capture metadata applied");
        StampOutcome::Stamped { slot }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// Full capture metadata for a filled item
fn stamp_item(stack: ItemStack, pending: &PendingCapture) -> ItemStack {
    let intent = &pending.intent;
    let mut updated = stack.with_metadata(keys::CAPTURED, true);
    if let Some(id) = intent.target_network_id {
        updated = updated.with_metadata(keys::TARGET_ENTITY_ID, id.0);
    }
    if let Some(id) = intent.target_creature {
        updated = updated.with_metadata(keys::TARGET_UUID, id.as_uuid());
    }
    if let Some(json) = &intent.attachments_json {
        updated = updated.with_metadata(keys::ATTACHMENTS, json.as_str());
    }
    updated = updated.with_owner(intent.owner);

    if let Some(role_index) = intent.role_index {
        let mut creature = CapturedCreature::new(role_index);
        creature.name_key = non_blank(&intent.name_key).map(str::to_string);
        match non_blank(&intent.resolved_icon) {
            Some(icon) => {
                creature.full_item_icon = Some(icon.to_string());
                creature.icon_path = Some(icon.to_string());
            }
            None => creature.icon_path = non_blank(&intent.icon_path).map(str::to_string),
        }
        updated = updated.with_captured_creature(&creature);
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Pose;
    use crate::memory::MemoryWorld;
    use crate::tracker::{CaptureIntent, PENDING_CAPTURE_TTL_MS};
    use tamework_core::{
        CreatureId, FeatureConfig, ManualClock, NetworkId, RoleIndex, Value,
    };

    const NET: &str = "Capture_Net";
    const NET_FULL: &str = "Capture_Net_State_Full";

    struct Fixture {
        world: MemoryWorld,
        clock: Arc<ManualClock>,
        tracker: Arc<CaptureTracker>,
        resolver: InventoryResolver,
        player: PlayerId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = FeatureRegistry::new();
            registry.register(NET, FeatureConfig::builder().spawner_enabled(true).build());
            let clock = Arc::new(ManualClock::new(1_000));
            let tracker = Arc::new(CaptureTracker::new(clock.clone()));
            let resolver = InventoryResolver::new(Arc::new(registry), tracker.clone());
            let world = MemoryWorld::new();
            let player = PlayerId::random();
            world.add_player(player, "Alec", Pose::default(), 9);
            Self {
                world,
                clock,
                tracker,
                resolver,
                player,
            }
        }

        fn record(&self, slot_hint: Option<SlotIndex>) -> CaptureIntent {
            let mut intent = CaptureIntent::new(NET);
            intent.slot_hint = slot_hint;
            intent.target_creature = Some(CreatureId::random());
            intent.target_network_id = Some(NetworkId(12));
            intent.attachments_json = Some(r#"{"Color":"Red"}"#.into());
            intent.role_index = Some(RoleIndex(4));
            intent.name_key = Some("npc.fox".into());
            intent.icon_path = Some("icons/fox.png".into());
            intent.resolved_icon = Some("icons/net_red.png".into());
            intent.owner = Some(self.player);
            self.tracker.record(self.player, intent.clone());
            intent
        }

        fn change(&self, slots: Vec<(SlotIndex, Option<&str>)>) -> InventoryChange {
            InventoryChange {
                player: self.player,
                container: Container::Hotbar,
                transaction: Transaction::ItemStack(
                    slots
                        .into_iter()
                        .map(|(slot, after)| SlotChange {
                            slot,
                            before: None,
                            after: after.map(ItemStack::single),
                        })
                        .collect(),
                ),
            }
        }
    }

    #[test]
    fn test_no_pending_capture() {
        let fx = Fixture::new();
        let outcome = fx
            .resolver
            .on_inventory_change(&fx.world, &fx.change(vec![(0, Some(NET_FULL))]));
        assert_eq!(outcome, ResolveOutcome::NoPending);
        assert_eq!(fx.world.pending_tasks(), 0);
    }

    #[test]
    fn test_expired_capture_is_dropped() {
        let fx = Fixture::new();
        fx.record(Some(0));
        fx.clock.advance(PENDING_CAPTURE_TTL_MS + 1);

        let outcome = fx
            .resolver
            .on_inventory_change(&fx.world, &fx.change(vec![(0, Some(NET_FULL))]));
        assert_eq!(outcome, ResolveOutcome::Expired);
        assert!(fx.tracker.get(fx.player).is_none());
        assert_eq!(fx.world.pending_tasks(), 0);
    }

    #[test]
    fn test_non_hotbar_and_non_item_changes() {
        let fx = Fixture::new();
        fx.record(Some(0));

        let mut change = fx.change(vec![(0, Some(NET_FULL))]);
        change.container = Container::Storage;
        assert_eq!(fx.resolver.on_inventory_change(&fx.world, &change), ResolveOutcome::NotHotbar);

        change.container = Container::Hotbar;
        change.transaction = Transaction::Other;
        assert_eq!(
            fx.resolver.on_inventory_change(&fx.world, &change),
            ResolveOutcome::NotItemTransaction
        );
        assert!(fx.tracker.get(fx.player).is_some());
    }

    #[test]
    fn test_hinted_slot_wins() {
        let fx = Fixture::new();
        fx.record(Some(2));
        let change = fx.change(vec![(0, Some(NET_FULL)), (2, Some(NET)), (5, Some(NET_FULL))]);
        assert_eq!(
            fx.resolver.on_inventory_change(&fx.world, &change),
            ResolveOutcome::Scheduled { slot: 2 }
        );
    }

    #[test]
    fn test_stateful_variant_preferred_over_plain() {
        let fx = Fixture::new();
        fx.record(Some(7));
        let change = fx.change(vec![(0, Some(NET)), (3, Some(NET_FULL)), (4, Some(NET_FULL))]);
        assert_eq!(
            fx.resolver.on_inventory_change(&fx.world, &change),
            ResolveOutcome::Scheduled { slot: 3 }
        );
    }

    #[test]
    fn test_unregistered_and_foreign_items_skipped() {
        let fx = Fixture::new();
        fx.record(None);
        let change = fx.change(vec![(0, Some("Tool_Axe")), (1, None), (2, Some("*Capture_Net"))]);
        assert_eq!(
            fx.resolver.on_inventory_change(&fx.world, &change),
            ResolveOutcome::Scheduled { slot: 2 }
        );

        let fx = Fixture::new();
        fx.record(None);
        let change = fx.change(vec![(0, Some("Tool_Axe"))]);
        assert_eq!(fx.resolver.on_inventory_change(&fx.world, &change), ResolveOutcome::NoCandidate);
    }

    #[test]
    fn test_falls_back_to_hint_without_candidate() {
        let fx = Fixture::new();
        fx.record(Some(6));
        let change = fx.change(vec![(0, Some("Tool_Axe"))]);
        assert_eq!(
            fx.resolver.on_inventory_change(&fx.world, &change),
            ResolveOutcome::Scheduled { slot: 6 }
        );
    }

    #[test]
    fn test_stamp_writes_full_metadata() {
        let fx = Fixture::new();
        let intent = fx.record(Some(1));
        fx.world.give_item(fx.player, 1, ItemStack::single(NET_FULL));

        let change = fx.change(vec![(1, Some(NET_FULL))]);
        fx.resolver.on_inventory_change(&fx.world, &change);
        assert_eq!(fx.world.run_pending(), 1);

        let item = fx.world.hotbar_item(fx.player, 1).unwrap();
        assert_eq!(item.item_id.as_str(), NET_FULL);
        assert_eq!(item.captured_flag(), Some(true));
        assert_eq!(item.target_creature(), intent.target_creature);
        assert_eq!(item.target_network_id(), Some(NetworkId(12)));
        assert_eq!(item.attachments_json(), Some(r#"{"Color":"Red"}"#));
        assert_eq!(item.owner(), Some(fx.player));

        let creature = item.captured_creature().unwrap();
        assert_eq!(creature.role_index, RoleIndex(4));
        assert_eq!(creature.name_key.as_deref(), Some("npc.fox"));
        assert_eq!(creature.icon_path.as_deref(), Some("icons/net_red.png"));
        assert_eq!(creature.full_item_icon.as_deref(), Some("icons/net_red.png"));

        assert!(fx.tracker.get(fx.player).is_none());
        assert_eq!(fx.world.inventory_revision(fx.player), 1);
    }

    #[test]
    fn test_stamp_uses_model_icon_without_resolved_icon() {
        let fx = Fixture::new();
        let mut pending = fx.tracker.record(fx.player, CaptureIntent::new(NET));
        pending.intent.role_index = Some(RoleIndex(1));
        pending.intent.icon_path = Some("icons/fox.png".into());
        pending.intent.resolved_icon = Some("  ".into());
        fx.world.give_item(fx.player, 0, ItemStack::single(NET));

        let outcome = fx.resolver.stamp(&fx.world, fx.player, &pending, 0);
        assert_eq!(outcome, StampOutcome::Stamped { slot: 0 });
        let creature = fx.world.hotbar_item(fx.player, 0).unwrap().captured_creature().unwrap();
        assert_eq!(creature.icon_path.as_deref(), Some("icons/fox.png"));
        assert_eq!(creature.full_item_icon, None);
    }

    #[test]
    fn test_stamp_clears_owner_without_descriptor() {
        let fx = Fixture::new();
        let pending = fx.tracker.record(fx.player, CaptureIntent::new(NET));
        let stale = ItemStack::single(NET).with_owner(Some(PlayerId::random()));
        fx.world.give_item(fx.player, 0, stale);

        fx.resolver.stamp(&fx.world, fx.player, &pending, 0);
        let item = fx.world.hotbar_item(fx.player, 0).unwrap();
        assert_eq!(item.owner(), None);
        assert!(!item.has(keys::CAPTURED_CREATURE));
        assert_eq!(item.get(keys::CAPTURED), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_stamp_aborts_on_hinted_mismatch() {
        let fx = Fixture::new();
        fx.record(Some(1));
        fx.world.give_item(fx.player, 1, ItemStack::single("Tool_Axe"));
        fx.world.give_item(fx.player, 4, ItemStack::single(NET_FULL));

        let pending = fx.tracker.get(fx.player).unwrap();
        let outcome = fx.resolver.stamp(&fx.world, fx.player, &pending, 1);
        assert_eq!(outcome, StampOutcome::SlotMismatch { slot: 1 });
        assert!(!fx.world.hotbar_item(fx.player, 4).unwrap().has(keys::CAPTURED));
        assert!(fx.tracker.get(fx.player).is_some());
    }

    #[test]
    fn test_stamp_scans_hotbar_without_hint() {
        let fx = Fixture::new();
        fx.record(None);
        fx.world.give_item(fx.player, 1, ItemStack::single("Tool_Axe"));
        fx.world.give_item(fx.player, 4, ItemStack::single(NET_FULL));

        let pending = fx.tracker.get(fx.player).unwrap();
        let outcome = fx.resolver.stamp(&fx.world, fx.player, &pending, 1);
        assert_eq!(outcome, StampOutcome::Stamped { slot: 4 });
        assert_eq!(fx.world.hotbar_item(fx.player, 4).unwrap().captured_flag(), Some(true));
        assert!(fx.tracker.get(fx.player).is_none());
    }

    #[test]
    fn test_stamp_without_match_or_player() {
        let fx = Fixture::new();
        fx.record(None);
        let pending = fx.tracker.get(fx.player).unwrap();
        assert_eq!(fx.resolver.stamp(&fx.world, fx.player, &pending, 0), StampOutcome::NoMatch);
        assert_eq!(
            fx.resolver.stamp(&fx.world, PlayerId::random(), &pending, 0),
            StampOutcome::PlayerMissing
        );
        assert!(fx.tracker.get(fx.player).is_some());
    }

    #[test]
    fn test_stamp_reports_refused_write() {
        let fx = Fixture::new();
        fx.record(Some(0));
        fx.world.give_item(fx.player, 0, ItemStack::single(NET_FULL));
        fx.world.lock_hotbar(fx.player, true);

        let pending = fx.tracker.get(fx.player).unwrap();
        let outcome = fx.resolver.stamp(&fx.world, fx.player, &pending, 0);
        assert_eq!(outcome, StampOutcome::WriteFailed { slot: 0 });
        assert!(!fx.world.hotbar_item(fx.player, 0).unwrap().has(keys::CAPTURED));
        assert!(fx.tracker.get(fx.player).is_some());
        assert_eq!(fx.world.inventory_revision(fx.player), 0);
    }

    #[test]
    fn test_stamp_keeps_capture_recorded_after_it_was_queued() {
        let fx = Fixture::new();
        fx.record(Some(0));
        fx.world.give_item(fx.player, 0, ItemStack::single(NET_FULL));
        let queued = fx.tracker.get(fx.player).unwrap();

        fx.clock.advance(100);
        let mut newer = CaptureIntent::new(NET);
        newer.role_index = Some(RoleIndex(8));
        fx.tracker.record(fx.player, newer);

        let outcome = fx.resolver.stamp(&fx.world, fx.player, &queued, 0);
        assert_eq!(outcome, StampOutcome::Stamped { slot: 0 });
        let still_pending = fx.tracker.get(fx.player).unwrap();
        assert_eq!(still_pending.intent.role_index, Some(RoleIndex(8)));
        assert_eq!(still_pending.created_at, 1_100);
    }

    #[test]
    fn test_stamp_is_single_shot() {
        let fx = Fixture::new();
        fx.record(Some(0));
        fx.world.give_item(fx.player, 0, ItemStack::single(NET_FULL));

        let change = fx.change(vec![(0, Some(NET_FULL))]);
        fx.resolver.on_inventory_change(&fx.world, &change);
        fx.world.run_pending();

        // The stamp's own write comes back as a change with nothing pending.
        for change in fx.world.drain_inventory_changes() {
            assert_eq!(
                fx.resolver.on_inventory_change(&fx.world, &change),
                ResolveOutcome::NoPending
            );
        }
        assert_eq!(fx.world.pending_tasks(), 0);
    }
}
