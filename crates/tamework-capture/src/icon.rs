//! Filled-item icon selection

use tamework_core::{matches_required, AttachmentMap, FeatureConfig, FeatureRegistry, IconOverride};
use tracing::info;

/// Config whose icon settings apply to a capture with `config`
///
/// When the config names a filled item id that is itself registered, the
/// filled item's settings win.
pub fn icon_config<'a>(config: &'a FeatureConfig, registry: &'a FeatureRegistry) -> &'a FeatureConfig {
    config
        .filled_item_id()
        .and_then(|filled| registry.get(filled.as_str()))
        .unwrap_or(config)
}

/// First override, in declared order, whose required attachments all
/// appear in `attachments`
pub fn matching_override<'a>(
    overrides: &'a [IconOverride],
    attachments: &AttachmentMap,
) -> Option<&'a IconOverride> {
    overrides
        .iter()
        .find(|candidate| matches_required(&candidate.required_attachments, attachments))
}

/// Icon of the matching override, falling back to `default`
pub fn select_icon<'a>(
    overrides: &'a [IconOverride],
    default: Option<&'a str>,
    attachments: Option<&AttachmentMap>,
) -> Option<&'a str> {
    attachments
        .and_then(|attachments| matching_override(overrides, attachments))
        .map(|matched| matched.icon.as_str())
        .or(default)
}

/// Resolve the icon a filled item should show for a captured creature
pub fn resolve_filled_icon(
    config: &FeatureConfig,
    registry: &FeatureRegistry,
    attachments: Option<&AttachmentMap>,
    item: &str,
) -> Option<String> {
    let config = icon_config(config, registry);
    let default = config.spawner_icon_default.clone();
    if config.spawner_icon_overrides.is_empty() {
        return default;
    }
    let Some(attachments) = attachments else {
        return default;
    };

    match matching_override(&config.spawner_icon_overrides, attachments) {
        Some(matched) => {
            info!(item, icon = %matched.icon, "icon override matched");
            Some(matched.icon.clone())
        }
        None => {
            info!(item, "no icon override matched");
            default
        }
    }
}
