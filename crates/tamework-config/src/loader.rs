//! Feature document loader
//!
//! Documents are read leniently: a key that is missing or has the wrong type
//! keeps the value already registered for the item.

use crate::error::{Error, Result};
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::Path;
use tamework_core::{AttachmentMap, FeatureConfig, FeatureRegistry, IconOverride};
use tracing::{debug, warn};

/// Label used in logs for the embedded defaults document
pub const BUNDLED_CONFIG_LABEL: &str = "<bundled>/tamework-item-features.json";

const BUNDLED_CONFIG: &str = include_str!("../assets/tamework-item-features.json");

/// Syntax of a feature document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Ron,
}

impl DocumentFormat {
    /// Pick a format from a file extension; anything but `.ron` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => DocumentFormat::Ron,
            _ => DocumentFormat::Json,
        }
    }
}

/// Loader that layers feature documents onto a registry
pub struct Loader {
    registry: FeatureRegistry,
}

impl Loader {
    /// Create a loader starting from an empty registry
    pub fn new() -> Self {
        Self::with_registry(FeatureRegistry::new())
    }

    /// Create a loader that layers onto an existing registry
    pub fn with_registry(registry: FeatureRegistry) -> Self {
        Self { registry }
    }

    /// Load the defaults document embedded in this crate
    pub fn load_bundled(&mut self) -> Result<usize> {
        self.load_str(BUNDLED_CONFIG, DocumentFormat::Json, BUNDLED_CONFIG_LABEL)
    }

    /// Load a document from disk, choosing the format by extension
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let label = path.display().to_string();
        self.load_str(&content, DocumentFormat::from_path(path), &label)
    }

    /// Load a document from a string
    ///
    /// Returns the number of item entries applied.
    pub fn load_str(
        &mut self,
        content: &str,
        format: DocumentFormat,
        source_label: &str,
    ) -> Result<usize> {
        let root: Json = match format {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Ron => ron::from_str(content)?,
        };
        let Json::Object(root) = root else {
            return Err(Error::InvalidDocument {
                source_label: source_label.to_string(),
                reason: "root must be an object".to_string(),
            });
        };
        Ok(self.load_root(&root, source_label))
    }

    fn load_root(&mut self, root: &Map<String, Json>, source_label: &str) -> usize {
        let Some(items) = root.get("Items").and_then(Json::as_object) else {
            warn!(source = source_label, "feature config has no 'Items' object");
            return 0;
        };

        let mut loaded = 0;
        for (item_id, entry) in items {
            let Some(entry) = entry.as_object() else {
                warn!(source = source_label, item = %item_id, "item config must be an object");
                continue;
            };
            let config = match self.registry.get(item_id) {
                Some(base) => apply_entry(base.clone(), entry),
                None => apply_entry(FeatureConfig::default(), entry),
            };
            self.registry.register(item_id.as_str(), config);
            loaded += 1;
        }
        debug!(source = source_label, loaded, "applied feature document");
        loaded
    }

    /// Current registry state
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Finish loading and return the registry
    pub fn finish(self) -> FeatureRegistry {
        self.registry
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_entry(mut config: FeatureConfig, entry: &Map<String, Json>) -> FeatureConfig {
    read_bool(entry, "Spawner", &mut config.spawner_enabled);
    read_bool(entry, "Whistle", &mut config.whistle_enabled);
    read_bool(entry, "CaptureClearsOwner", &mut config.capture_clears_owner);
    read_bool(entry, "SpawnAssignsOwner", &mut config.spawn_assigns_owner);
    read_bool(entry, "OwnerRestricted", &mut config.owner_restricted);
    read_bool(entry, "SpawnerAllowUncaptured", &mut config.spawner_allow_uncaptured);

    if let Some(radius) = entry
        .get("WhistleRadius")
        .and_then(Json::as_i64)
        .and_then(|raw| i32::try_from(raw).ok())
    {
        config.whistle_radius = radius;
    }
    if let Some(role) = read_string(entry, "SpawnerRoleId") {
        config.spawner_role_id = Some(role);
    }
    if let Some(filled) = read_string(entry, "SpawnerFilledItemId") {
        config.spawner_filled_item_id = Some(filled.into());
    }
    if let Some(icon) = read_string(entry, "SpawnerIconDefault") {
        config.spawner_icon_default = Some(icon);
    }
    if let Some(overrides) = entry.get("SpawnerIconOverrides").and_then(Json::as_array) {
        let parsed = parse_icon_overrides(overrides);
        if !parsed.is_empty() {
            config.spawner_icon_overrides = parsed;
        }
    }
    config
}

fn read_bool(entry: &Map<String, Json>, key: &str, target: &mut bool) {
    if let Some(value) = entry.get(key).and_then(Json::as_bool) {
        *target = value;
    }
}

fn read_string(entry: &Map<String, Json>, key: &str) -> Option<String> {
    entry.get(key).and_then(Json::as_str).map(str::to_string)
}

fn parse_icon_overrides(entries: &[Json]) -> Vec<IconOverride> {
    entries
        .iter()
        .filter_map(Json::as_object)
        .filter_map(|entry| {
            let icon = entry
                .get("Icon")
                .and_then(Json::as_str)
                .filter(|icon| !icon.trim().is_empty())?;
            let attachments: AttachmentMap = entry
                .get("Attachments")
                .and_then(Json::as_object)
                .map(|map| {
                    map.iter()
                        .filter_map(|(slot, id)| id.as_str().map(|id| (slot.clone(), id.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            Some(IconOverride::new(attachments, icon))
        })
        .collect()
}
