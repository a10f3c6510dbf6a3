//! Capture Demo
//!
//! Runs tamework against the in-memory host: a player catches a tinted
//! creature, the host swaps the item for its filled variant, and the player
//! releases the creature again.
//!
//! Set `RUST_LOG=debug` for the full trace.

use std::sync::Arc;
use tamework_capture::memory::{MemoryUniverse, MemoryWorld};
use tamework_capture::{
    InteractionChain, InteractionEvent, InteractionOutcome, InteractionType, Pose, Rotation,
    Tamework, TameworkPaths, Vector3, World,
};
use tamework_core::{AttachmentMap, ItemStack, PlayerId, EXAMPLE_ROLE, EXAMPLE_SPAWNER_ITEM};
use tracing_subscriber::EnvFilter;

const FILLED_ITEM: &str = "Tamework_Spawner_Example_Full";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Tamework Capture Demo ===\n");

    let world = Arc::new(MemoryWorld::new());
    let universe = Arc::new(MemoryUniverse::new());
    let paths = TameworkPaths::new(".", std::env::temp_dir().join("tamework-demo"));
    let plugin = Tamework::setup(&paths, universe.clone());

    let player = PlayerId::random();
    world.add_player(
        player,
        "Alec",
        Pose::new(Vector3::new(12.0, 64.0, -3.0), Rotation::default()),
        9,
    );
    universe.place(player, world.clone());
    world.give_item(player, 0, ItemStack::single(EXAMPLE_SPAWNER_ITEM));

    let role = world.add_role(EXAMPLE_ROLE, Some("npc.tamework_example"));
    let mut tint = AttachmentMap::new();
    tint.insert("Tint".to_string(), "Tamework_Example_Tint_Blue".to_string());
    let (handle, _, creature) = world.add_creature(role, Some(tint), Some("Icons/Npc/Example.png"));
    println!("Creature {creature} waiting at {handle}");

    // Catch it.
    let result = plugin.on_player_interact(
        world.as_ref(),
        &InteractionEvent {
            player,
            action: InteractionType::Primary,
            held_item: Some(ItemStack::single(EXAMPLE_SPAWNER_ITEM)),
            target: Some(handle),
        },
    );
    println!("Capture: {:?}", result.outcome);
    world.despawn(handle);

    // The host swaps in the filled variant; the resolver stamps it.
    world.drain_inventory_changes();
    if let Err(e) = world.replace_with_variant(player, 0, FILLED_ITEM) {
        eprintln!("Variant swap failed: {e}");
        return;
    }
    for change in world.drain_inventory_changes() {
        println!("Inventory change: {:?}", plugin.on_inventory_change(world.as_ref(), &change));
    }
    world.run_pending();

    if let Some(filled) = world.hotbar_item(player, 0) {
        println!("\nFilled item: {}", filled.item_id);
        for (key, value) in filled.metadata() {
            println!("  {key} = {value}");
        }
        println!();
    }

    // Release it through the packet path.
    let queued = plugin.on_interaction_packets(
        player,
        &[InteractionChain {
            item_id: FILLED_ITEM.to_string(),
            interaction: InteractionType::Use,
            active_hotbar_slot: 0,
            target_network_id: 0,
            initial: true,
        }],
    );
    println!("Queued {queued} packet interaction(s)");
    world.run_pending();

    let released = world.creature_count();
    println!("Creatures in world after release: {released}");

    // Releasing an empty spawner does nothing.
    let result = plugin.on_player_interact(
        world.as_ref(),
        &InteractionEvent {
            player,
            action: InteractionType::Use,
            held_item: Some(ItemStack::single(EXAMPLE_SPAWNER_ITEM)),
            target: None,
        },
    );
    if let InteractionOutcome::Ignored(reason) = &result.outcome {
        println!("Empty spawner ignored: {reason:?}");
    }
    println!("Ignored: {}", result.outcome.is_ignored());

    println!("\n=== Demo Complete ===");
}
