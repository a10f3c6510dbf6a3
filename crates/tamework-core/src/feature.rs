//! Per-item feature configuration and the registry that serves it
//!
//! Configs are immutable once built. The registry is filled during startup
//! and then shared read-only between threads.

use crate::attachments::AttachmentMap;
use crate::item::{normalize_item_id, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Item id of the bundled example spawner
pub const EXAMPLE_SPAWNER_ITEM: &str = "Tamework_Spawner_Example";

/// Role spawned by the bundled example spawner
pub const EXAMPLE_ROLE: &str = "Tamework_Example";

/// Whistle radius used when a config doesn't set one
pub const DEFAULT_WHISTLE_RADIUS: i32 = 64;

/// Icon to show for a filled item when the creature's attachments match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconOverride {
    /// Attachment pairs that must all be present on the creature
    pub required_attachments: AttachmentMap,
    /// Icon path to use on a match
    pub icon: String,
}

impl IconOverride {
    pub fn new(required_attachments: AttachmentMap, icon: impl Into<String>) -> Self {
        Self {
            required_attachments,
            icon: icon.into(),
        }
    }
}

/// Feature switches and spawner settings for one item id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub spawner_enabled: bool,
    pub whistle_enabled: bool,
    pub capture_clears_owner: bool,
    pub spawn_assigns_owner: bool,
    pub owner_restricted: bool,
    pub spawner_allow_uncaptured: bool,
    pub whistle_radius: i32,
    pub spawner_role_id: Option<String>,
    pub spawner_filled_item_id: Option<ItemId>,
    pub spawner_icon_default: Option<String>,
    pub spawner_icon_overrides: Vec<IconOverride>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            spawner_enabled: false,
            whistle_enabled: false,
            capture_clears_owner: false,
            spawn_assigns_owner: false,
            owner_restricted: false,
            spawner_allow_uncaptured: false,
            whistle_radius: DEFAULT_WHISTLE_RADIUS,
            spawner_role_id: None,
            spawner_filled_item_id: None,
            spawner_icon_default: None,
            spawner_icon_overrides: Vec::new(),
        }
    }
}

impl FeatureConfig {
    /// Start building a config from defaults
    pub fn builder() -> FeatureConfigBuilder {
        FeatureConfigBuilder {
            config: FeatureConfig::default(),
        }
    }

    /// Start building a config on top of an existing one
    pub fn to_builder(&self) -> FeatureConfigBuilder {
        FeatureConfigBuilder {
            config: self.clone(),
        }
    }

    /// Configured role id, ignoring blank strings
    pub fn role_id(&self) -> Option<&str> {
        self.spawner_role_id
            .as_deref()
            .filter(|role| !role.trim().is_empty())
    }

    /// Configured filled item id, ignoring blank ids
    pub fn filled_item_id(&self) -> Option<&ItemId> {
        self.spawner_filled_item_id
            .as_ref()
            .filter(|id| !id.is_blank())
    }
}

/// Builder for [`FeatureConfig`]
#[derive(Debug, Clone)]
pub struct FeatureConfigBuilder {
    config: FeatureConfig,
}

impl FeatureConfigBuilder {
    pub fn spawner_enabled(mut self, value: bool) -> Self {
        self.config.spawner_enabled = value;
        self
    }

    pub fn whistle_enabled(mut self, value: bool) -> Self {
        self.config.whistle_enabled = value;
        self
    }

    pub fn capture_clears_owner(mut self, value: bool) -> Self {
        self.config.capture_clears_owner = value;
        self
    }

    pub fn spawn_assigns_owner(mut self, value: bool) -> Self {
        self.config.spawn_assigns_owner = value;
        self
    }

    pub fn owner_restricted(mut self, value: bool) -> Self {
        self.config.owner_restricted = value;
        self
    }

    pub fn spawner_allow_uncaptured(mut self, value: bool) -> Self {
        self.config.spawner_allow_uncaptured = value;
        self
    }

    pub fn whistle_radius(mut self, value: i32) -> Self {
        self.config.whistle_radius = value;
        self
    }

    pub fn spawner_role_id(mut self, value: Option<impl Into<String>>) -> Self {
        self.config.spawner_role_id = value.map(Into::into);
        self
    }

    pub fn spawner_filled_item_id(mut self, value: Option<impl Into<ItemId>>) -> Self {
        self.config.spawner_filled_item_id = value.map(Into::into);
        self
    }

    pub fn spawner_icon_default(mut self, value: Option<impl Into<String>>) -> Self {
        self.config.spawner_icon_default = value.map(Into::into);
        self
    }

    pub fn spawner_icon_overrides(mut self, overrides: Vec<IconOverride>) -> Self {
        self.config.spawner_icon_overrides = overrides;
        self
    }

    pub fn build(self) -> FeatureConfig {
        self.config
    }
}

/// Item id → feature config lookup
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    configs: HashMap<String, FeatureConfig>,
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the bundled example spawner
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register the bundled example spawner
    pub fn register_defaults(&mut self) {
        self.register(
            EXAMPLE_SPAWNER_ITEM,
            FeatureConfig::builder()
                .spawner_enabled(true)
                .capture_clears_owner(true)
                .spawn_assigns_owner(true)
                .spawner_role_id(Some(EXAMPLE_ROLE))
                .build(),
        );
    }

    /// Register or replace the config for an exact item id
    pub fn register(&mut self, item_id: impl Into<String>, config: FeatureConfig) {
        self.configs.insert(item_id.into(), config);
    }

    /// Look up the config for an item id
    ///
    /// Exact ids win; otherwise a stateful variant resolves to its base id.
    pub fn get(&self, item_id: &str) -> Option<&FeatureConfig> {
        if let Some(config) = self.configs.get(item_id) {
            return Some(config);
        }
        let normalized = normalize_item_id(item_id);
        if normalized != item_id {
            return self.configs.get(normalized);
        }
        None
    }

    /// Number of registered item ids
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Iterate over registered item ids and configs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureConfig)> {
        self.configs.iter().map(|(id, config)| (id.as_str(), config))
    }
}
