//! Plugin wiring - one registry, store and tracker behind three handlers
//!
//! [`Tamework`] owns the shared state and hands the host three entry points:
//! interaction events, interaction packets and inventory changes.

use crate::adapters::{EventAdapter, InteractionChain, InteractionEvent, PacketAdapter};
use crate::engine::{CaptureSpawnEngine, InteractionOutcome};
use crate::guard::{GuardDecision, OwnerGuard};
use crate::host::{InventoryChange, Universe, World};
use crate::resolver::{InventoryResolver, ResolveOutcome};
use crate::tracker::CaptureTracker;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tamework_config::{ConfigDiscovery, Loader};
use tamework_core::{FeatureRegistry, PlayerId};
use tamework_store::OwnershipStore;
use tracing::info;

/// Where the plugin reads config and keeps its data
///
/// # Example
///
/// ```
/// use tamework_capture::TameworkPaths;
///
/// let paths = TameworkPaths::new("/srv/game", "/srv/game/plugins/tamework");
/// assert!(paths.data_dir.ends_with("tamework"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TameworkPaths {
    /// Server root; mods and the override file are found below it
    pub server_root: PathBuf,
    /// Plugin data directory holding the ownership file
    pub data_dir: PathBuf,
}

impl TameworkPaths {
    pub fn new(server_root: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_root: server_root.into(),
            data_dir: data_dir.into(),
        }
    }
}

/// Both reactions to an interaction event
#[derive(Debug)]
pub struct InteractResult {
    /// Whether the host should cancel the interaction
    pub guard: GuardDecision,
    pub outcome: InteractionOutcome,
}

/// The assembled plugin
#[derive(Clone)]
pub struct Tamework {
    registry: Arc<FeatureRegistry>,
    store: Arc<OwnershipStore>,
    tracker: Arc<CaptureTracker>,
    events: EventAdapter,
    packets: PacketAdapter,
    resolver: InventoryResolver,
    guard: OwnerGuard,
}

impl Tamework {
    /// Load configuration, open the ownership store and wire the handlers
    pub fn setup(paths: &TameworkPaths, universe: Arc<dyn Universe>) -> Self {
        let mut loader = Loader::with_registry(FeatureRegistry::with_defaults());
        let loaded = ConfigDiscovery::new(&paths.server_root).load_all(&mut loader);
        let registry = loader.finish();
        info!(loaded, total = registry.len(), "item feature configs loaded");

        let store = OwnershipStore::open(&paths.data_dir);
        Self::from_parts(registry, store, Arc::new(CaptureTracker::with_system_clock()), universe)
    }

    /// Wire the handlers around existing parts
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tamework_capture::memory::MemoryUniverse;
    /// use tamework_capture::{CaptureTracker, Tamework};
    /// use tamework_core::FeatureRegistry;
    /// use tamework_store::OwnershipStore;
    ///
    /// let plugin = Tamework::from_parts(
    ///     FeatureRegistry::with_defaults(),
    ///     OwnershipStore::in_memory(),
    ///     Arc::new(CaptureTracker::with_system_clock()),
    ///     Arc::new(MemoryUniverse::new()),
    /// );
    /// assert!(plugin.registry().get("Tamework_Spawner_Example").is_some());
    /// ```
    pub fn from_parts(
        registry: FeatureRegistry,
        store: OwnershipStore,
        tracker: Arc<CaptureTracker>,
        universe: Arc<dyn Universe>,
    ) -> Self {
        let registry = Arc::new(registry);
        let store = Arc::new(store);
        let engine = CaptureSpawnEngine::new(registry.clone(), store.clone(), tracker.clone());
        Self {
            events: EventAdapter::new(engine.clone()),
            packets: PacketAdapter::new(engine, universe),
            resolver: InventoryResolver::new(registry.clone(), tracker.clone()),
            guard: OwnerGuard::new(store.clone()),
            registry,
            store,
            tracker,
        }
    }

    /// Handle an interaction event on the player's world
    pub fn on_player_interact(&self, world: &dyn World, event: &InteractionEvent) -> InteractResult {
        InteractResult {
            guard: self.guard.check(world, event),
            outcome: self.events.on_player_interact(world, event),
        }
    }

    /// Handle a batch of interaction chains from the network thread
    pub fn on_interaction_packets(&self, player: PlayerId, chains: &[InteractionChain]) -> usize {
        self.packets.on_interaction_packets(player, chains)
    }

    /// Handle an inventory change on the player's world
    pub fn on_inventory_change(&self, world: &dyn World, change: &InventoryChange) -> ResolveOutcome {
        self.resolver.on_inventory_change(world, change)
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn store(&self) -> &OwnershipStore {
        &self.store
    }

    pub fn tracker(&self) -> &CaptureTracker {
        &self.tracker
    }
}
