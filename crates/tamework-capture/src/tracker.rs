//! Pending-capture correlation
//!
//! A capture writes to the held item right away, but the host may swap that
//! item for a state-bearing variant a moment later and drop the metadata.
//! The tracker remembers what was captured per player for a short window so
//! the inventory resolver can finish stamping whichever item ends up in the
//! slot.
//!
//! Records are never swept in the background. Expiry is checked lazily by
//! whoever observes a record next.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tamework_core::{
    normalize_item_id, Clock, CreatureId, ItemId, Millis, NetworkId, PlayerId, RoleIndex,
    SlotIndex, SystemClock,
};

/// How long a pending capture stays matchable
pub const PENDING_CAPTURE_TTL_MS: Millis = 5_000;

/// Everything a capture learned that the resolver needs to stamp an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureIntent {
    /// Hotbar slot the capture most likely lands in
    pub slot_hint: Option<SlotIndex>,
    /// Normalized base id of the item that should receive the metadata
    pub expected_item: ItemId,
    pub target_network_id: Option<NetworkId>,
    pub target_creature: Option<CreatureId>,
    /// Attachment map as stored on items (JSON object)
    pub attachments_json: Option<String>,
    pub role_index: Option<RoleIndex>,
    pub name_key: Option<String>,
    /// Icon of the creature's model
    pub icon_path: Option<String>,
    /// Filled-item icon chosen from the attachment overrides
    pub resolved_icon: Option<String>,
    /// Owner to write onto the item; `None` means clear it
    pub owner: Option<PlayerId>,
}

impl CaptureIntent {
    /// Start an intent for `expected_item`, normalizing it to its base id
    pub fn new(expected_item: impl AsRef<str>) -> Self {
        Self {
            slot_hint: None,
            expected_item: ItemId::new(normalize_item_id(expected_item.as_ref())),
            target_network_id: None,
            target_creature: None,
            attachments_json: None,
            role_index: None,
            name_key: None,
            icon_path: None,
            resolved_icon: None,
            owner: None,
        }
    }

    /// Fill every field left unset here from `previous`
    fn merged_over(self, previous: &CaptureIntent) -> Self {
        Self {
            slot_hint: self.slot_hint.or(previous.slot_hint),
            expected_item: self.expected_item,
            target_network_id: self.target_network_id.or(previous.target_network_id),
            target_creature: self.target_creature.or(previous.target_creature),
            attachments_json: self
                .attachments_json
                .or_else(|| previous.attachments_json.clone()),
            role_index: self.role_index.or(previous.role_index),
            name_key: self.name_key.or_else(|| previous.name_key.clone()),
            icon_path: self.icon_path.or_else(|| previous.icon_path.clone()),
            resolved_icon: self.resolved_icon.or_else(|| previous.resolved_icon.clone()),
            owner: self.owner.or(previous.owner),
        }
    }

    /// Check if an item id normalizes to the expected base id
    pub fn matches_item(&self, item_id: &ItemId) -> bool {
        normalize_item_id(item_id.as_str()) == self.expected_item.as_str()
    }
}

/// A capture waiting for the inventory to catch up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCapture {
    pub player: PlayerId,
    pub intent: CaptureIntent,
    pub created_at: Millis,
}

/// Per-player pending captures, safe to share across threads
pub struct CaptureTracker {
    pending: DashMap<PlayerId, PendingCapture>,
    clock: Arc<dyn Clock>,
}

impl CaptureTracker {
    /// Create a tracker on the given clock
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pending: DashMap::new(),
            clock,
        }
    }

    /// Create a tracker on wall-clock time
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Record a capture for `player`
    ///
    /// An existing record is merged field by field: set fields in `intent`
    /// win, unset ones keep the previous value. The timestamp restarts.
    pub fn record(&self, player: PlayerId, intent: CaptureIntent) -> PendingCapture {
        let created_at = self.clock.now_ms();
        match self.pending.entry(player) {
            Entry::Occupied(mut entry) => {
                let merged = intent.merged_over(&entry.get().intent);
                let record = PendingCapture {
                    player,
                    intent: merged,
                    created_at,
                };
                entry.insert(record.clone());
                record
            }
            Entry::Vacant(entry) => {
                let record = PendingCapture {
                    player,
                    intent,
                    created_at,
                };
                entry.insert(record.clone());
                record
            }
        }
    }

    /// Current record for `player`, without removing it
    pub fn get(&self, player: PlayerId) -> Option<PendingCapture> {
        self.pending.get(&player).map(|entry| entry.value().clone())
    }

    /// Remove and return the record for `player`
    pub fn consume(&self, player: PlayerId) -> Option<PendingCapture> {
        self.pending.remove(&player).map(|(_, record)| record)
    }

    /// Remove `record` only if it is still the current one for its player
    ///
    /// A capture merged in after `record` was read stays pending.
    pub fn consume_if_current(&self, record: &PendingCapture) -> bool {
        self.pending
            .remove_if(&record.player, |_, current| current == record)
            .is_some()
    }

    /// Drop any record for `player`
    pub fn clear(&self, player: PlayerId) {
        self.pending.remove(&player);
    }

    /// Check if a record has outlived [`PENDING_CAPTURE_TTL_MS`]
    pub fn is_expired(&self, record: &PendingCapture) -> bool {
        self.clock.now_ms() - record.created_at > PENDING_CAPTURE_TTL_MS
    }

    /// Number of players with a pending capture
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Debug for CaptureTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureTracker")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
