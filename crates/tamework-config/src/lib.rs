//! Tamework Config - item feature configuration sources
//!
//! Feature documents map item ids to settings objects:
//! ```json
//! { "Items": { "Capture_Crate": { "Spawner": true, "SpawnerRoleId": "Fox" } } }
//! ```
//! Each entry is layered over whatever is already registered for that id,
//! so later sources only need to name the keys they change.

mod discovery;
mod error;
mod loader;

pub use discovery::{ConfigDiscovery, MODS_DIR_CANDIDATES, MOD_CONFIG_STEM, OVERRIDE_CONFIG_PATH};
pub use error::{Error, Result};
pub use loader::{DocumentFormat, Loader, BUNDLED_CONFIG_LABEL};
