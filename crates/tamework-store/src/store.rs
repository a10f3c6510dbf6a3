//! Ownership store backed by a JSON file.

use crate::error::{Error, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tamework_core::{CreatureId, PlayerId};
use tracing::{debug, info, warn};

/// File name of the ownership document inside the data directory.
pub const OWNERS_FILE_NAME: &str = "tamework-owners.json";

/// Durable creature → owner mapping.
///
/// Reads go straight to the concurrent map. Every mutation rewrites the
/// whole file; writers are serialized so the file always holds a complete
/// snapshot. Persistence failures are logged and the in-memory map stays
/// authoritative for the session.
#[derive(Debug)]
pub struct OwnershipStore {
    owners: DashMap<CreatureId, PlayerId>,
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl OwnershipStore {
    /// Open the store in `data_dir`, loading any existing ownership file.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join(OWNERS_FILE_NAME);
        let owners: DashMap<CreatureId, PlayerId> = match load_file(&path) {
            Ok(loaded) => {
                info!(path = %path.display(), entries = loaded.len(), "loaded ownership data");
                loaded.into_iter().collect()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load ownership data");
                DashMap::new()
            }
        };
        Self {
            owners,
            path: Some(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            owners: DashMap::new(),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Owner of a creature, if one is recorded.
    pub fn owner_of(&self, creature: CreatureId) -> Option<PlayerId> {
        self.owners.get(&creature).map(|entry| *entry.value())
    }

    /// Check whether `player` is the recorded owner of `creature`.
    pub fn is_owner(&self, creature: CreatureId, player: PlayerId) -> bool {
        self.owner_of(creature) == Some(player)
    }

    /// Record `owner` for `creature`; `None` clears the entry.
    pub fn set_owner(&self, creature: CreatureId, owner: Option<PlayerId>) {
        let Some(owner) = owner else {
            self.clear_owner(creature);
            return;
        };
        self.owners.insert(creature, owner);
        debug!(%creature, %owner, "owner set");
        self.persist();
    }

    /// Remove any owner recorded for `creature`.
    ///
    /// The file is rewritten only when an entry was actually removed.
    pub fn clear_owner(&self, creature: CreatureId) {
        if self.owners.remove(&creature).is_some() {
            debug!(%creature, "owner cleared");
            self.persist();
        }
    }

    /// Copy of every recorded pair.
    pub fn snapshot(&self) -> HashMap<CreatureId, PlayerId> {
        self.owners
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Number of owned creatures.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if no creature is owned.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let _guard = self.write_lock.lock();
        if let Err(e) = self.save(path) {
            warn!(path = %path.display(), error = %e, "failed to save ownership data");
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        // Sorted so the file diffs cleanly between saves.
        let document: BTreeMap<String, String> = self
            .owners
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().to_string()))
            .collect();
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Read the ownership file, skipping entries that don't parse.
fn load_file(path: &Path) -> Result<HashMap<CreatureId, PlayerId>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    if text.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let document: serde_json::Value = serde_json::from_str(&text)?;
    let serde_json::Value::Object(entries) = document else {
        return Err(Error::InvalidDocument(json_type_name(&document)));
    };

    let mut owners = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let Some(owner) = value.as_str() else {
            debug!(creature = %key, "skipping ownership entry with non-string owner");
            continue;
        };
        match (key.parse::<CreatureId>(), owner.parse::<PlayerId>()) {
            (Ok(creature), Ok(owner)) => {
                owners.insert(creature, owner);
            }
            _ => debug!(creature = %key, owner, "skipping malformed ownership entry"),
        }
    }
    Ok(owners)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
