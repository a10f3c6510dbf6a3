//! Entry-point adapters
//!
//! Hosts report interactions two ways: a high-level event carrying the held
//! item and target entity, and raw interaction-chain packets that only name
//! an item, a hotbar slot and a network id. Each adapter turns its input
//! into an [`InteractionRequest`] for the shared engine.

use crate::engine::{
    CaptureSpawnEngine, CaptureTarget, IgnoreReason, InteractionOutcome, InteractionRequest,
};
use crate::error::Error;
use crate::host::{InteractionType, Universe, World};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tamework_core::{EntityHandle, FeatureConfig, ItemStack, NetworkId, PlayerId, SlotIndex};
use tracing::{debug, info};

/// High-level interaction notification
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub player: PlayerId,
    pub action: InteractionType,
    pub held_item: Option<ItemStack>,
    pub target: Option<EntityHandle>,
}

/// Handles interaction events, already running on the player's world
#[derive(Debug, Clone)]
pub struct EventAdapter {
    engine: CaptureSpawnEngine,
}

impl EventAdapter {
    pub fn new(engine: CaptureSpawnEngine) -> Self {
        Self { engine }
    }

    pub fn on_player_interact(&self, world: &dyn World, event: &InteractionEvent) -> InteractionOutcome {
        let Some(item) = event.held_item.as_ref().filter(|item| !item.is_empty()) else {
            return InteractionOutcome::Ignored(IgnoreReason::EmptySlot);
        };
        let Some(config) = self.engine.registry().get(item.item_id.as_str()) else {
            return InteractionOutcome::Ignored(IgnoreReason::NoConfig);
        };
        log_matched(item, event.action, config);

        let request = InteractionRequest {
            player: event.player,
            action: event.action,
            item: item.clone(),
            slot: None,
            target: event.target.map(CaptureTarget::Entity),
        };
        self.engine.handle(world, &request, config)
    }
}

fn log_matched(item: &ItemStack, action: InteractionType, config: &FeatureConfig) {
    info!(
        item = %item.item_id,
        ?action,
        spawner = config.spawner_enabled,
        whistle = config.whistle_enabled,
        capture_clears_owner = config.capture_clears_owner,
        spawn_assigns_owner = config.spawn_assigns_owner,
        whistle_radius = config.whistle_radius,
        "item interaction matched config"
    );
}

/// One interaction chain from a client packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionChain {
    pub item_id: String,
    pub interaction: InteractionType,
    /// Hotbar slot as reported by the client; may be negative
    pub active_hotbar_slot: i32,
    /// Network id of the targeted entity; zero or negative means none
    pub target_network_id: i32,
    pub initial: bool,
}

/// Handles raw interaction packets off the network thread
#[derive(Clone)]
pub struct PacketAdapter {
    engine: CaptureSpawnEngine,
    universe: Arc<dyn Universe>,
}

impl PacketAdapter {
    pub fn new(engine: CaptureSpawnEngine, universe: Arc<dyn Universe>) -> Self {
        Self { engine, universe }
    }

    /// Queue a handler on the player's world for every configured chain
    ///
    /// Returns how many chains were queued.
    pub fn on_interaction_packets(&self, player: PlayerId, chains: &[InteractionChain]) -> usize {
        let mut queued = 0;
        for chain in chains {
            if chain.item_id.trim().is_empty() {
                continue;
            }
            let Some(config) = self.engine.registry().get(&chain.item_id) else {
                continue;
            };
            info!(
                %player,
                item = %chain.item_id,
                interaction = ?chain.interaction,
                slot = chain.active_hotbar_slot,
                network_id = chain.target_network_id,
                initial = chain.initial,
                "packet interaction"
            );

            let Some(world) = self.universe.world_of(player) else {
                info!(%player, item = %chain.item_id, "packet interaction, world lookup failed");
                continue;
            };
            let engine = self.engine.clone();
            let chain = chain.clone();
            let config = config.clone();
            world.execute(Box::new(move |world: &dyn World| {
                handle_packet(&engine, world, player, &chain, &config);
            }));
            queued += 1;
        }
        queued
    }
}

/// Handle one chain on the player's world
///
/// The item actually sitting in the reported slot decides the config when
/// it differs from what the client claimed.
pub fn handle_packet(
    engine: &CaptureSpawnEngine,
    world: &dyn World,
    player: PlayerId,
    chain: &InteractionChain,
    config: &FeatureConfig,
) -> InteractionOutcome {
    if !chain.interaction.triggers_spawner() {
        debug!(%player, item = %chain.item_id, interaction = ?chain.interaction, "packet interaction ignored");
        return InteractionOutcome::Ignored(IgnoreReason::UnsupportedAction);
    }
    let Ok(slot) = SlotIndex::try_from(chain.active_hotbar_slot) else {
        info!(%player, item = %chain.item_id, slot = chain.active_hotbar_slot, "packet interaction, invalid slot");
        return InteractionOutcome::Ignored(IgnoreReason::InvalidSlot);
    };
    if world.player(player).is_none() {
        info!(%player, item = %chain.item_id, "packet interaction, player missing");
        return InteractionOutcome::Failed(Error::PlayerNotFound(player));
    }
    let Some(item) = world.hotbar_item(player, slot).filter(|item| !item.is_empty()) else {
        info!(%player, item = %chain.item_id, slot, "packet interaction, empty slot");
        return InteractionOutcome::Ignored(IgnoreReason::EmptySlot);
    };

    let mut config = config;
    if item.item_id.as_str() != chain.item_id {
        if let Some(actual) = engine.registry().get(item.item_id.as_str()) {
            debug!(%player, claimed = %chain.item_id, actual = %item.item_id, "packet item differs from slot");
            config = actual;
        }
    }

    let target = NetworkId(chain.target_network_id);
    let request = InteractionRequest {
        player,
        action: chain.interaction,
        item,
        slot: Some(slot),
        target: target.is_valid().then_some(CaptureTarget::Network(target)),
    };
    engine.handle(world, &request, config)
}
