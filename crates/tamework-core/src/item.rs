//! Item identifiers and stateful-variant normalization
//!
//! The host may replace an item with a "stateful" variant whose id carries a
//! leading `*` marker and/or a `_State_<suffix>` tail. Config and tracking
//! lookups always work on the base id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading character the host puts on generated variant ids
pub const VARIANT_MARKER: char = '*';

/// Separator between a base id and its transient state suffix
pub const STATE_MARKER: &str = "_State_";

/// Identifier of an item type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check for an empty or whitespace-only id
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether this id names a state-bearing variant
    pub fn is_stateful(&self) -> bool {
        self.0.contains(STATE_MARKER)
    }

    /// The base id this item normalizes to
    pub fn normalized(&self) -> ItemId {
        ItemId(normalize_item_id(&self.0).to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Strip the variant marker and any `_State_` suffix from an item id
///
/// Ids without either are returned unchanged. A `_State_` at position 0 is
/// not treated as a suffix since it would leave an empty base id.
pub fn normalize_item_id(item_id: &str) -> &str {
    let trimmed = item_id.strip_prefix(VARIANT_MARKER).unwrap_or(item_id);
    match trimmed.find(STATE_MARKER) {
        Some(index) if index > 0 => &trimmed[..index],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_state_suffix() {
        assert_eq!(normalize_item_id("Capture_Crate_State_Full"), "Capture_Crate");
        assert_eq!(
            normalize_item_id("*Capture_Crate_State_Definitions_Full"),
            "Capture_Crate"
        );
    }

    #[test]
    fn test_normalize_strips_marker_only() {
        assert_eq!(normalize_item_id("*Capture_Crate"), "Capture_Crate");
    }

    #[test]
    fn test_normalize_is_identity_for_plain_ids() {
        for id in ["Capture_Crate", "Tool_Net", "", "a"] {
            assert_eq!(normalize_item_id(id), id);
        }
    }

    #[test]
    fn test_normalize_keeps_leading_state_marker() {
        assert_eq!(normalize_item_id("_State_Full"), "_State_Full");
    }

    #[test]
    fn test_item_id_helpers() {
        let id = ItemId::new("*Net_State_Full");
        assert!(id.is_stateful());
        assert_eq!(id.normalized(), ItemId::new("Net"));
        assert!(!ItemId::new("Net").is_stateful());
        assert!(ItemId::new("   ").is_blank());
    }
}
