//! Error types for tamework-capture
//!
//! These never cross an entry point; handlers log them and report a
//! failed outcome instead.

use tamework_core::{EntityHandle, ItemId, NetworkId, PlayerId, SlotIndex};
use thiserror::Error;

/// Result type for tamework-capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or spawning
#[derive(Debug, Error)]
pub enum Error {
    /// Player is not present in the world
    #[error("player {0} not found in world")]
    PlayerNotFound(PlayerId),

    /// Entity is gone or is not a creature
    #[error("{0} not found")]
    EntityNotFound(EntityHandle),

    /// No live creature answers to the network id
    #[error("no creature with {0}")]
    NetworkEntityNotFound(NetworkId),

    /// Slot index past the end of the hotbar
    #[error("hotbar slot {slot} out of range (capacity {capacity})")]
    SlotOutOfRange { slot: SlotIndex, capacity: SlotIndex },

    /// Host refused inventory writes for the player
    #[error("hotbar of player {0} is locked")]
    HotbarLocked(PlayerId),

    /// Item config has no spawner role
    #[error("no spawner role configured for item {0}")]
    MissingRole(ItemId),

    /// Role id is not registered with the host
    #[error("role lookup failed for {0}")]
    RoleNotFound(String),

    /// Creature's model asset is unknown to the host
    #[error("missing model asset for {0}")]
    MissingModelAsset(EntityHandle),
}

// Handlers move errors across world queues, so they must stay Send + Sync.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
