//! Identity types for players, creatures and live entity handles
//!
//! Two kinds of identity flow through the system:
//! - persistent identities (`PlayerId`, `CreatureId`) that survive restarts
//!   and are what the ownership store keys on
//! - transient handles (`NetworkId`, `EntityHandle`) that are only valid
//!   inside one session of one world

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Persistent identity of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Wrap an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identity
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the raw UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Persistent identity of a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub Uuid);

impl CreatureId {
    /// Wrap an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identity
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the raw UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CreatureId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Transient numeric id the network layer uses to name an entity
///
/// Only positive values refer to a real entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub i32);

impl NetworkId {
    /// Check whether this id can name an entity
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net:{}", self.0)
    }
}

/// Host-issued reference to a live entity inside one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

impl EntityHandle {
    /// Get the raw handle value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Index of a creature role in the host's role table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleIndex(pub u32);

impl fmt::Display for RoleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "role:{}", self.0)
    }
}

/// Index of a slot inside an item container
pub type SlotIndex = u16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_parse_roundtrip() {
        let id = PlayerId::random();
        let parsed: PlayerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_creature_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<CreatureId>().is_err());
    }

    #[test]
    fn test_network_id_validity() {
        assert!(NetworkId(7).is_valid());
        assert!(!NetworkId(0).is_valid());
        assert!(!NetworkId(-1).is_valid());
        assert_eq!(format!("{}", NetworkId(7)), "net:7");
    }
}
