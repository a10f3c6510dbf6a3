//! Owner interaction guard

use crate::adapters::InteractionEvent;
use crate::host::{InteractionType, World};
use std::sync::Arc;
use tamework_core::PlayerId;
use tamework_store::OwnershipStore;
use tracing::info;

/// Whether the host should let an interaction through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Cancel it; the target belongs to `owner`
    Deny { owner: PlayerId },
}

/// Stops players from using creatures owned by someone else
#[derive(Debug, Clone)]
pub struct OwnerGuard {
    store: Arc<OwnershipStore>,
}

impl OwnerGuard {
    pub fn new(store: Arc<OwnershipStore>) -> Self {
        Self { store }
    }

    /// Only `Use` interactions aimed at an owned creature are checked
    pub fn check(&self, world: &dyn World, event: &InteractionEvent) -> GuardDecision {
        if event.action != InteractionType::Use {
            return GuardDecision::Allow;
        }
        let Some(creature) = event.target.and_then(|target| world.creature(target)) else {
            return GuardDecision::Allow;
        };
        match self.store.owner_of(creature.id) {
            Some(owner) if owner != event.player => {
                info!(player = %event.player, creature = %creature.id, %owner, "interaction denied, not owner");
                GuardDecision::Deny { owner }
            }
            _ => GuardDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWorld;

    #[test]
    fn test_guard_denies_foreign_use() {
        let store = Arc::new(OwnershipStore::in_memory());
        let guard = OwnerGuard::new(store.clone());
        let world = MemoryWorld::new();
        let role = world.add_role("Fox", None);
        let (handle, _, creature) = world.add_creature(role, None, None);

        let owner = PlayerId::random();
        let stranger = PlayerId::random();
        store.set_owner(creature, Some(owner));

        let mut event = InteractionEvent {
            player: stranger,
            action: InteractionType::Use,
            held_item: None,
            target: Some(handle),
        };
        assert_eq!(guard.check(&world, &event), GuardDecision::Deny { owner });

        event.action = InteractionType::Primary;
        assert_eq!(guard.check(&world, &event), GuardDecision::Allow);

        event.action = InteractionType::Use;
        event.player = owner;
        assert_eq!(guard.check(&world, &event), GuardDecision::Allow);
    }

    #[test]
    fn test_guard_allows_unowned_and_missing_targets() {
        let guard = OwnerGuard::new(Arc::new(OwnershipStore::in_memory()));
        let world = MemoryWorld::new();
        let role = world.add_role("Fox", None);
        let (handle, _, _) = world.add_creature(role, None, None);

        let mut event = InteractionEvent {
            player: PlayerId::random(),
            action: InteractionType::Use,
            held_item: None,
            target: Some(handle),
        };
        assert_eq!(guard.check(&world, &event), GuardDecision::Allow);

        event.target = None;
        assert_eq!(guard.check(&world, &event), GuardDecision::Allow);
    }
}
