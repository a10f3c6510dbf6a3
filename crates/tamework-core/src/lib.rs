//! Tamework Core - shared types for creature capture and release
//!
//! This crate provides the vocabulary every other tamework crate speaks:
//! - Persistent and transient identities (`PlayerId`, `CreatureId`, `NetworkId`)
//! - Item ids with stateful-variant normalization
//! - Item stacks and the metadata keys tamework owns
//! - Per-item feature configuration and its registry
//! - A clock abstraction for time-boxed state

mod attachments;
mod error;
mod feature;
mod identity;
mod item;
pub mod stack;
pub mod time;
mod value;

pub use attachments::{decode_attachments, encode_attachments, matches_required, AttachmentMap};
pub use error::{Error, Result};
pub use feature::{
    FeatureConfig, FeatureConfigBuilder, FeatureRegistry, IconOverride, DEFAULT_WHISTLE_RADIUS,
    EXAMPLE_ROLE, EXAMPLE_SPAWNER_ITEM,
};
pub use identity::{CreatureId, EntityHandle, NetworkId, PlayerId, RoleIndex, SlotIndex};
pub use item::{normalize_item_id, ItemId, STATE_MARKER, VARIANT_MARKER};
pub use stack::{keys, CapturedCreature, ItemStack};
pub use time::{Clock, ManualClock, Millis, SystemClock};
pub use value::{Value, ValueMap};
