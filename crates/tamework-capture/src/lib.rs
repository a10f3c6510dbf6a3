//! Tamework Capture - catch creatures in items and release them again
//!
//! Capture snapshots a creature into the held item; release spawns it back
//! in front of the player. Hosts may swap the held item for a stateful
//! variant right after a capture, so the work is split in two phases:
//!
//! ```text
//! interaction ──► adapters ──► CaptureSpawnEngine ──► immediate item write
//!                                      │
//!                                      └──► CaptureTracker (pending, 5s TTL)
//!                                                  │
//! inventory change ──► InventoryResolver ◄─────────┘
//!                              │
//!                              └──► world queue: stamp the live item
//! ```
//!
//! ## Key Components
//!
//! - [`Tamework`]: wires everything and exposes the host-facing handlers
//! - [`World`] / [`Universe`]: the host seam; [`memory`] has an in-memory host
//! - [`CaptureSpawnEngine`]: the capture and spawn transitions
//! - [`InventoryResolver`]: finishes pending captures once the item settles
//! - [`OwnerGuard`]: keeps players off creatures owned by someone else

mod adapters;
mod engine;
mod error;
mod guard;
mod host;
mod icon;
pub mod memory;
mod plugin;
mod resolver;
mod tracker;

pub use adapters::{handle_packet, EventAdapter, InteractionChain, InteractionEvent, PacketAdapter};
pub use engine::{
    is_filled, spawn_pose, CaptureSpawnEngine, CaptureTarget, IgnoreReason, InteractionOutcome,
    InteractionRequest, BONDED_TARGET_SLOT, SPAWN_FORWARD_DISTANCE, SPAWN_OFFSET_Y,
};
pub use error::{Error, Result};
pub use guard::{GuardDecision, OwnerGuard};
pub use host::{
    Container, CreatureView, InteractionType, InventoryChange, PlayerView, Pose, Rotation,
    SlotChange, Transaction, Universe, Vector3, World, WorldTask,
};
pub use icon::{icon_config, matching_override, resolve_filled_icon, select_icon};
pub use plugin::{InteractResult, Tamework, TameworkPaths};
pub use resolver::{InventoryResolver, ResolveOutcome, StampOutcome};
pub use tracker::{CaptureIntent, CaptureTracker, PendingCapture, PENDING_CAPTURE_TTL_MS};
